//! Configuration options for the tessera engine.

/// Options applied while turning source text into an [`Ast`](crate::ast::Ast).
///
/// # Example
///
/// ```
/// use tessera_core::api::CompilationOptions;
///
/// let options = CompilationOptions {
///     fold_constants: false,
/// };
/// assert!(!options.fold_constants);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    /// Mark subtrees whose leaves are all literals as constant, so their
    /// value is computed once and cached on the node.
    ///
    /// Default: true
    pub fold_constants: bool,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
        }
    }
}

/// Options applied while inferring or evaluating an expression.
///
/// # Example
///
/// ```
/// use tessera_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions { max_depth: 16 };
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Maximum nesting depth of the tree walk (parser, inference and
    /// evaluator alike). Deeper expressions fail with `DepthExceeded`.
    ///
    /// Default: 64
    pub max_depth: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Configuration options for the tessera engine.
///
/// # Example
///
/// ```
/// use tessera_core::api::{CompilationOptions, EngineOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     compilation: CompilationOptions::default(),
///     execution: ExecutionOptions { max_depth: 32 },
/// };
/// assert!(options.compilation.fold_constants);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub compilation: CompilationOptions,
    pub execution: ExecutionOptions,
}
