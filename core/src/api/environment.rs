//! The collaborators an inference or evaluation pass consults.

use once_cell::sync::Lazy;

use super::{EngineOptions, ExternalEngine};
use crate::resolver::Resolver;
use crate::scope::Constants;

static DEFAULT_OPTIONS: Lazy<EngineOptions> = Lazy::new(EngineOptions::default);

/// Borrowed view of everything besides the scope that a visitor needs:
/// the operation resolver, the constants table, the optional external
/// engine and the options.
///
/// Cheap to copy; an [`Engine`](super::Engine) hands one out per call.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    resolver: &'a Resolver,
    constants: &'a Constants,
    external: Option<&'a dyn ExternalEngine>,
    options: &'a EngineOptions,
}

impl<'a> Environment<'a> {
    pub fn new(
        resolver: &'a Resolver,
        constants: &'a Constants,
        external: Option<&'a dyn ExternalEngine>,
        options: &'a EngineOptions,
    ) -> Self {
        Self {
            resolver,
            constants,
            external,
            options,
        }
    }

    pub fn resolver(&self) -> &'a Resolver {
        self.resolver
    }

    pub fn constants(&self) -> &'a Constants {
        self.constants
    }

    pub fn external(&self) -> Option<&'a dyn ExternalEngine> {
        self.external
    }

    pub fn options(&self) -> &'a EngineOptions {
        self.options
    }
}

impl Environment<'static> {
    /// The process-wide resolver and constants with default options.
    pub fn global() -> Self {
        Self {
            resolver: Resolver::global(),
            constants: Constants::global(),
            external: None,
            options: &DEFAULT_OPTIONS,
        }
    }
}

impl std::fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("external", &self.external.is_some())
            .field("options", self.options)
            .finish_non_exhaustive()
    }
}
