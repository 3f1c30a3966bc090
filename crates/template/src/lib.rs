//! The report template model.
//!
//! A [`Template`] is produced either by reading a JRXML document
//! ([`parse`]) or programmatically through [`TemplateBuilder`]. Both paths end
//! in the same resolution pass, which parses every expression, binds every
//! name to a positional slot and rejects the template if anything does not
//! resolve. A successfully constructed template is therefore ready to evaluate.

pub mod builder;
pub mod error;
pub mod info;
pub mod jrxml;
pub mod lint;
pub mod model;
pub mod resolve;

pub use builder::TemplateBuilder;
pub use error::DefinitionError;
pub use info::TemplateInfo;
pub use model::*;
pub use resolve::{Finding, Severity};

/// Reads a JRXML document and resolves it into a ready-to-render template.
pub fn parse(source: &str) -> Result<Template, DefinitionError> {
    let mut template = jrxml::read(source)?;
    let findings = resolve::resolve(&mut template);
    if findings.iter().any(Finding::is_error) {
        return Err(DefinitionError::Invalid(findings));
    }
    log::debug!(
        "Parsed template '{}': {} fields, {} variables, {} groups",
        template.name,
        template.fields.len(),
        template.variables.len(),
        template.groups.len()
    );
    Ok(template)
}

/// Runs every definition check over a template without failing.
///
/// Expressions are re-read from their source text against the declared
/// names, so the result does not depend on earlier resolution state.
pub fn validate(template: &Template) -> Vec<Finding> {
    let mut scratch = template.clone();
    resolve::resolve(&mut scratch)
}

/// Like [`validate`], but starting from raw JRXML text. Structural problems
/// that prevent reading the document become a single finding.
pub fn validate_source(source: &str) -> Vec<Finding> {
    match jrxml::read(source) {
        Ok(template) => validate(&template),
        Err(err) => vec![Finding::from_definition_error(&err)],
    }
}
