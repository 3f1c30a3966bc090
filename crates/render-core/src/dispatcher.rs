use crate::error::RenderError;
use crate::format::OutputFormat;
use crate::html;
use crate::traits::DrawingCollaborator;
use banded_layout::LayoutModel;
use std::collections::HashMap;
use std::sync::Arc;

/// Turns a layout model into bytes of one output format.
///
/// HTML is written directly. Every other format needs a registered
/// [`DrawingCollaborator`]. Rendering never changes the model, so the same
/// model can be rendered to several formats in turn.
#[derive(Clone, Default)]
pub struct RenderDispatcher {
    collaborators: HashMap<OutputFormat, Arc<dyn DrawingCollaborator>>,
}

impl RenderDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the collaborator for `format`, replacing any previous one.
    pub fn register(&mut self, format: OutputFormat, collaborator: Arc<dyn DrawingCollaborator>) {
        self.collaborators.insert(format, collaborator);
    }

    pub fn with_collaborator(
        mut self,
        format: OutputFormat,
        collaborator: Arc<dyn DrawingCollaborator>,
    ) -> Self {
        self.register(format, collaborator);
        self
    }

    pub fn supports(&self, format: OutputFormat) -> bool {
        format == OutputFormat::Html || self.collaborators.contains_key(&format)
    }

    pub fn render(&self, model: &LayoutModel, format: OutputFormat) -> Result<Vec<u8>, RenderError> {
        let bytes = match format {
            OutputFormat::Html => html::render_html(model).into_bytes(),
            other => {
                let collaborator = self
                    .collaborators
                    .get(&other)
                    .ok_or(RenderError::NoCollaborator(other))?;
                let mut document = collaborator.begin_document(model.page_size)?;
                for page in &model.pages {
                    document.begin_page(page.number)?;
                    for element in &page.elements {
                        document.draw(element)?;
                    }
                    document.end_page()?;
                }
                document.finalize()?
            }
        };
        log::info!(
            "Rendered '{}' as {}: {} page(s), {} bytes",
            model.name,
            format,
            model.page_count(),
            bytes.len()
        );
        Ok(bytes)
    }
}

impl std::fmt::Debug for RenderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<&str> = self.collaborators.keys().map(|f| f.name()).collect();
        formats.sort_unstable();
        f.debug_struct("RenderDispatcher")
            .field("collaborators", &formats)
            .finish()
    }
}
