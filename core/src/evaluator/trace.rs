//! Human-readable step log of an evaluation.

use std::cell::RefCell;
use std::fmt::Write;

/// Collects trace lines, each indented two spaces per nesting level.
///
/// Nested evaluators (closure bodies, `eval`) share one log by reference,
/// so the log uses interior mutability.
#[derive(Debug, Default)]
pub(crate) struct TraceLog {
    text: RefCell<String>,
}

impl TraceLog {
    pub(crate) fn push(&self, depth: usize, line: &str) {
        tracing::debug!(depth, "{line}");
        let mut text = self.text.borrow_mut();
        let _ = writeln!(text, "{:indent$}{line}", "", indent = depth * 2);
    }

    pub(crate) fn into_string(self) -> String {
        self.text.into_inner()
    }
}
