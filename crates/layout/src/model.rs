//! The format-agnostic layout model handed to renderers.

use banded_template::{BandKind, ElementStyle};
use banded_types::{Rect, Size};
use serde::Serialize;

/// What an element shows once every expression has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutContent {
    Text { text: String },
    /// The evaluated image expression; renderers decide how to load it.
    Image { source: String },
    Line,
    Rectangle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutElement {
    /// Absolute position on the page in points, origin top-left.
    pub rect: Rect,
    pub content: LayoutContent,
    pub style: ElementStyle,
    /// The band that produced this element.
    pub band: BandKind,
}

impl LayoutElement {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            LayoutContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPage {
    /// 1-based page ordinal.
    pub number: usize,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            elements: Vec::new(),
        }
    }

    /// Texts of the elements produced by `band`, in placement order.
    pub fn texts_of(&self, band: BandKind) -> Vec<&str> {
        self.elements
            .iter()
            .filter(|e| e.band == band)
            .filter_map(LayoutElement::text)
            .collect()
    }
}

/// A fully paginated report. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutModel {
    pub name: String,
    pub page_size: Size,
    pub pages: Vec<LayoutPage>,
}

impl LayoutModel {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
