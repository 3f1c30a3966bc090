//! Core rendering abstractions for banded reports.
//!
//! This crate provides the pieces every output format shares:
//! - `RenderDispatcher`, which walks a layout model once per output
//! - `DrawingCollaborator` / `DocumentAccumulator` for binary formats
//! - The built-in HTML writer
//! - Shared utility functions for font naming and coordinate conversion

mod dispatcher;
mod error;
mod format;
pub mod html;
mod traits;
pub mod utils;

pub use dispatcher::RenderDispatcher;
pub use error::RenderError;
pub use format::OutputFormat;
pub use traits::{DocumentAccumulator, DrawingCollaborator};
