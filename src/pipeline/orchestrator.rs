use super::config::RenderConfig;
use crate::error::PipelineError;
use banded_data::{PreviewRow, preview_rows, process};
use banded_layout::{LayoutModel, layout};
use banded_render_core::{OutputFormat, RenderDispatcher};
use banded_source::RowSource;
use banded_template::Template;
use banded_types::Value;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// A parsed template with resolved parameters, ready to render any number of
/// row sets. Every render owns its processing and layout state, so one
/// pipeline may be shared across threads.
#[derive(Debug)]
pub struct ReportPipeline {
    template: Template,
    parameters: Vec<Value>,
    dispatcher: RenderDispatcher,
    config: RenderConfig,
}

impl ReportPipeline {
    pub(crate) fn new(
        template: Template,
        parameters: Vec<Value>,
        dispatcher: RenderDispatcher,
        config: RenderConfig,
    ) -> Self {
        Self {
            template,
            parameters,
            dispatcher,
            config,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Parameter values in declaration order.
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Processes and paginates every row of `source`.
    pub fn layout<S: RowSource>(&self, source: S) -> Result<LayoutModel, PipelineError> {
        layout_rows(&self.template, source, self.parameters.clone())
    }

    /// Renders `source` in the configured output format.
    pub fn render<S: RowSource>(&self, source: S) -> Result<Vec<u8>, PipelineError> {
        self.render_as(source, self.config.format)
    }

    /// Renders `source` in `format`. Nothing is returned unless every row
    /// processed and every page laid out.
    pub fn render_as<S: RowSource>(
        &self,
        source: S,
        format: OutputFormat,
    ) -> Result<Vec<u8>, PipelineError> {
        if !self.dispatcher.supports(format) {
            return Err(banded_render_core::RenderError::NoCollaborator(format).into());
        }
        let start = Instant::now();
        let model = self.layout(source)?;
        let bytes = self.render_model(&model, format)?;
        log::debug!(
            "Report '{}' rendered in {:.2?}",
            self.template.name,
            start.elapsed()
        );
        Ok(bytes)
    }

    /// Formats an existing layout model. A failure here leaves the model
    /// usable, so another format can be tried without reprocessing rows.
    pub fn render_model(
        &self,
        model: &LayoutModel,
        format: OutputFormat,
    ) -> Result<Vec<u8>, PipelineError> {
        Ok(self.dispatcher.render(model, format)?)
    }

    pub fn render_to_file<S: RowSource, P: AsRef<Path>>(
        &self,
        source: S,
        path: P,
    ) -> Result<(), PipelineError> {
        let bytes = self.render(source)?;
        fs::write(path.as_ref(), &bytes)?;
        log::info!("Wrote {} bytes to {}", bytes.len(), path.as_ref().display());
        Ok(())
    }

    /// Binds the first rows of `source` without laying anything out.
    pub fn preview<S: RowSource>(&self, source: S) -> Result<Vec<PreviewRow>, PipelineError> {
        Ok(preview_rows(&self.template, source, self.config.preview_limit)?)
    }

    /// Renders several independent row sets in the configured format. Results
    /// come back in input order; one failing set does not affect the others.
    #[cfg(feature = "parallel")]
    pub fn generate_batch<S: RowSource>(&self, sources: Vec<S>) -> Vec<Result<Vec<u8>, PipelineError>> {
        use rayon::prelude::*;
        log::info!("Rendering batch of {} report(s) in parallel", sources.len());
        sources.into_par_iter().map(|source| self.render(source)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    pub fn generate_batch<S: RowSource>(&self, sources: Vec<S>) -> Vec<Result<Vec<u8>, PipelineError>> {
        log::info!("Rendering batch of {} report(s)", sources.len());
        sources.into_iter().map(|source| self.render(source)).collect()
    }
}

pub(crate) fn layout_rows<S: RowSource>(
    template: &Template,
    source: S,
    parameters: Vec<Value>,
) -> Result<LayoutModel, PipelineError> {
    log::info!("Processing report '{}'", template.name);
    let rows = process(template, source, parameters)?;
    let model = layout(template, rows)?;
    log::info!("Report '{}' laid out on {} page(s)", template.name, model.page_count());
    Ok(model)
}
