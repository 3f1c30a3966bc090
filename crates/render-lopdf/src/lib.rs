//! PDF output for banded reports using lopdf.
//!
//! Text is set in the standard 14 fonts, so nothing is embedded and the
//! output stays small. Content streams are Flate-compressed.

mod document;

pub use document::{LopdfCollaborator, LopdfDocument};
