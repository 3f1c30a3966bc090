#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_assertions;

use banded::{OutputFormat, PipelineError, ReportPipelineBuilder, VecRowSource};
use lopdf::Document as LopdfDocument;
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Strings shown on a page (1-based), in drawing order.
    pub fn page_texts(&self, page: u32) -> Vec<String> {
        pdf_assertions::shown_strings(&self.doc, page)
    }

    pub fn all_texts(&self) -> Vec<String> {
        (1..=self.page_count() as u32)
            .flat_map(|page| self.page_texts(page))
            .collect()
    }

    /// Save PDF to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

pub fn rows(data: Value) -> VecRowSource {
    VecRowSource::from_json_value(data).expect("fixture rows are a JSON array of objects")
}

/// Renders a JRXML template against JSON rows.
pub fn render_jrxml(
    template: &str,
    data: Value,
    format: OutputFormat,
) -> Result<Vec<u8>, PipelineError> {
    let pipeline = ReportPipelineBuilder::new()
        .with_template_source(template)?
        .with_format(format)
        .build()?;
    pipeline.render(rows(data))
}

pub fn generate_pdf(template: &str, data: Value) -> Result<GeneratedPdf, PipelineError> {
    let bytes = render_jrxml(template, data, OutputFormat::Pdf)?;
    GeneratedPdf::from_bytes(bytes).map_err(|e| PipelineError::Config(e.to_string()))
}

pub fn generate_html(template: &str, data: Value) -> Result<String, PipelineError> {
    let bytes = render_jrxml(template, data, OutputFormat::Html)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
