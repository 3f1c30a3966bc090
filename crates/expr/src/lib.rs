//! The report expression language.
//!
//! Expressions are parsed once into an [`Expression`] tree whose references
//! are later bound to positional slots by the template crate. Evaluation then
//! reads values straight out of the slot arrays in an [`EvaluationContext`].
//!
//! The grammar is deliberately closed: arithmetic, comparison, boolean
//! connectives, a conditional, literals, references and a fixed table of
//! built-in functions. There are no loops, definitions or host calls.

pub mod ast;
pub mod engine;
pub mod error;
pub mod format;
pub mod functions;
mod operators;
mod parser;

pub use ast::{BinaryOperator, Binding, Builtin, Expression, RefKind, Reference, UnaryOperator};
pub use engine::{Builtins, EvaluationContext, evaluate, evaluate_as_bool};
pub use error::ExpressionError;
pub use format::FormatSpec;
pub use functions::{Arity, Function};
pub use parser::parse_expression;
