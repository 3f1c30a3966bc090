use thiserror::Error;

/// Errors raised while parsing or evaluating an expression. Every variant
/// carries the text of the (sub-)expression that failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Syntax error in '{source_text}': {message}")]
    Syntax {
        source_text: String,
        message: String,
    },

    #[error("Unresolved reference {reference} in '{expression}'")]
    UnresolvedReference {
        reference: String,
        expression: String,
    },

    #[error("Type mismatch in '{expression}': {message}")]
    TypeMismatch { expression: String, message: String },

    #[error("Unknown function '{function}' in '{expression}'")]
    UnknownFunction {
        function: String,
        expression: String,
    },

    #[error("Function '{function}' expects {expected} argument(s), got {actual} in '{expression}'")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
        expression: String,
    },

    #[error("Function '{function}' error in '{expression}': {message}")]
    InvalidArgument {
        function: String,
        message: String,
        expression: String,
    },

    #[error("Division by zero in '{expression}'")]
    DivisionByZero { expression: String },

    #[error("Numeric overflow in '{expression}'")]
    Overflow { expression: String },

    #[error("{builtin} is not available yet in '{expression}'")]
    Unavailable {
        builtin: &'static str,
        expression: String,
    },
}
