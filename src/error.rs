use banded_data::DataError;
use banded_expr::ExpressionError;
use banded_layout::LayoutError;
use banded_render_core::RenderError;
use banded_source::SourceError;
use banded_template::DefinitionError;
use thiserror::Error;

/// The single error type of the report pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Template definition failed: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Expression failed: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Data processing failed: {0}")]
    Data(#[from] DataError),

    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    Parameter(String),

    #[error("Pipeline is misconfigured: {0}")]
    Config(String),
}

impl From<SourceError> for PipelineError {
    fn from(e: SourceError) -> Self {
        PipelineError::Data(DataError::Source(e))
    }
}

impl PipelineError {
    /// The data binding error behind this failure, wherever it surfaced.
    pub fn as_data_error(&self) -> Option<&DataError> {
        match self {
            PipelineError::Data(e) => Some(e),
            PipelineError::Layout(LayoutError::Data(e)) => Some(e),
            _ => None,
        }
    }
}
