use super::config::RenderConfig;
use super::orchestrator::ReportPipeline;
use crate::error::PipelineError;
use banded_data::resolve_parameters;
use banded_render_core::{DrawingCollaborator, OutputFormat, RenderDispatcher};
use banded_render_lopdf::LopdfCollaborator;
use banded_template::Template;
use serde_json::{Map, Value as Json};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A builder for creating a [`ReportPipeline`].
///
/// The PDF collaborator is registered by default; HTML needs none.
pub struct ReportPipelineBuilder {
    template: Option<Template>,
    parameters: Map<String, Json>,
    dispatcher: RenderDispatcher,
    config: RenderConfig,
}

impl Default for ReportPipelineBuilder {
    fn default() -> Self {
        Self {
            template: None,
            parameters: Map::new(),
            dispatcher: default_dispatcher(),
            config: RenderConfig::default(),
        }
    }
}

/// A dispatcher with the formats this crate ships collaborators for.
pub fn default_dispatcher() -> RenderDispatcher {
    RenderDispatcher::new().with_collaborator(OutputFormat::Pdf, Arc::new(LopdfCollaborator))
}

impl ReportPipelineBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Loads and parses a JRXML template from a file.
    pub fn with_template_file<P: AsRef<Path>>(self, path: P) -> Result<Self, PipelineError> {
        let path_ref = path.as_ref();
        let source = fs::read_to_string(path_ref).map_err(|e| {
            PipelineError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read template from '{}': {}", path_ref.display(), e),
            ))
        })?;
        self.with_template_source(&source)
    }

    /// Parses a JRXML template from a string.
    pub fn with_template_source(mut self, source: &str) -> Result<Self, PipelineError> {
        self.template = Some(banded_template::parse(source)?);
        Ok(self)
    }

    /// Uses an already parsed or built template.
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    /// Replaces all caller parameters.
    pub fn with_parameters(mut self, parameters: Map<String, Json>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Registers the drawing collaborator for a binary format, replacing any
    /// previous one.
    pub fn with_collaborator(
        mut self,
        format: OutputFormat,
        collaborator: Arc<dyn DrawingCollaborator>,
    ) -> Self {
        self.dispatcher.register(format, collaborator);
        self
    }

    /// Consumes the builder. Parameters are resolved here, so a bad parameter
    /// fails before any row is read.
    pub fn build(self) -> Result<ReportPipeline, PipelineError> {
        let template = self.template.ok_or_else(|| {
            PipelineError::Config(
                "No template has been configured. Use `with_template_file` or `with_template`."
                    .to_string(),
            )
        })?;
        let parameters =
            resolve_parameters(&template, &self.parameters, self.config.strict_parameters)?;
        log::debug!(
            "Built pipeline for '{}' ({} parameter(s), format {})",
            template.name,
            parameters.len(),
            self.config.format
        );
        Ok(ReportPipeline::new(template, parameters, self.dispatcher, self.config))
    }
}
