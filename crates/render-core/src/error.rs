use crate::format::OutputFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No drawing collaborator registered for format '{0}'")]
    NoCollaborator(OutputFormat),
    #[error("Drawing collaborator failed: {0}")]
    Collaborator(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Other rendering error: {0}")]
    Other(String),
}

impl From<&str> for RenderError {
    fn from(s: &str) -> Self {
        RenderError::Other(s.to_string())
    }
}
