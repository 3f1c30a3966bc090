use crate::error::RenderError;
use banded_layout::LayoutElement;
use banded_types::Size;

/// Encodes positioned elements into one binary output format.
///
/// Collaborators are stateless factories, so one registration can serve
/// concurrent renders. Each render gets its own accumulator.
pub trait DrawingCollaborator: Send + Sync {
    /// Starts a document whose pages all share `page_size` (points).
    fn begin_document(&self, page_size: Size) -> Result<Box<dyn DocumentAccumulator>, RenderError>;
}

/// The in-progress document of a single render.
pub trait DocumentAccumulator {
    fn begin_page(&mut self, number: usize) -> Result<(), RenderError>;

    /// Draws one element; positions are in points from the top-left corner.
    fn draw(&mut self, element: &LayoutElement) -> Result<(), RenderError>;

    fn end_page(&mut self) -> Result<(), RenderError>;

    /// Produces the finished document. This consumes the accumulator.
    fn finalize(self: Box<Self>) -> Result<Vec<u8>, RenderError>;
}
