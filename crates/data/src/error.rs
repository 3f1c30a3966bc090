use banded_expr::ExpressionError;
use banded_source::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    /// A present column value could not be converted to the field's declared type.
    #[error("Cannot bind value {raw} to field '{field}' ({expected}) in row {row}")]
    DataBindingError {
        field: String,
        expected: &'static str,
        raw: String,
        row: usize,
    },

    #[error("Parameter '{name}' expects a {expected} value, got {raw}")]
    ParameterType {
        name: String,
        expected: &'static str,
        raw: String,
    },

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Expression error in row {row}: {source}")]
    Expression {
        row: usize,
        #[source]
        source: ExpressionError,
    },

    #[error("Expression error: {0}")]
    Definition(#[from] ExpressionError),

    #[error("Row source error: {0}")]
    Source(#[from] SourceError),
}

impl DataError {
    pub(crate) fn in_row(row: usize) -> impl FnOnce(ExpressionError) -> DataError {
        move |source| DataError::Expression { row, source }
    }
}
