use crate::resolve::Finding;
use thiserror::Error;

/// The template is structurally invalid or references undeclared names.
/// Always raised before any row is read.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("XML parsing error (roxmltree): {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Malformed template at {location}: {message}")]
    Malformed { location: String, message: String },

    #[error("Unknown band kind '{name}' at {location}")]
    UnknownBandKind { name: String, location: String },

    #[error("Template is invalid: {}", summarize(.0))]
    Invalid(Vec<Finding>),
}

impl DefinitionError {
    pub(crate) fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        DefinitionError::Malformed {
            location: location.into(),
            message: message.into(),
        }
    }

    /// The error-level findings carried by an `Invalid` error.
    pub fn findings(&self) -> &[Finding] {
        match self {
            DefinitionError::Invalid(findings) => findings,
            _ => &[],
        }
    }
}

fn summarize(findings: &[Finding]) -> String {
    let errors: Vec<String> = findings
        .iter()
        .filter(|f| f.is_error())
        .map(|f| format!("{} ({})", f.message, f.location))
        .collect();
    match errors.len() {
        0 => "no errors".to_string(),
        1 => errors[0].clone(),
        n => format!("{} (and {} more)", errors[0], n - 1),
    }
}
