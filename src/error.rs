//! Structural errors raised by compilation and evaluation (spec §7).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Unreachable under the bytecode-interpreter realization of the code
    /// generator: there is no second acceptor downstream of lowering to
    /// reject the generated `Program`. Kept for a future native-codegen
    /// backend (see DESIGN.md).
    #[error("compile failure: {cause}\n--- generated program ---\n{source}")]
    CompileFailure { source: String, cause: String },

    #[error("index {index} out of range for capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },

    #[error("division by zero")]
    DivideByZero,
}
