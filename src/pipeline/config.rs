use banded_render_core::OutputFormat;

/// Number of rows shown by [`preview_rows`](crate::preview_rows) when no limit is given.
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Settings that apply to every render of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Format produced by [`ReportPipeline::render`](super::ReportPipeline::render).
    pub format: OutputFormat,
    /// Reject caller parameters the template does not declare instead of
    /// logging and ignoring them.
    pub strict_parameters: bool,
    pub preview_limit: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pdf,
            strict_parameters: false,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl RenderConfig {
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_strict_parameters(mut self, strict: bool) -> Self {
        self.strict_parameters = strict;
        self
    }

    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }
}
