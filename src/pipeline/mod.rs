//! Report generation pipeline.
//!
//! - [`ReportPipelineBuilder`]: fluent builder that parses the template and
//!   resolves parameters once
//! - [`ReportPipeline`]: renders row sets, alone or in parallel batches
//! - [`RenderConfig`]: output format, parameter strictness and preview size
//!
//! # Example
//!
//! ```ignore
//! use banded::{OutputFormat, ReportPipelineBuilder, VecRowSource};
//!
//! let pipeline = ReportPipelineBuilder::new()
//!     .with_template_file("invoice.jrxml")?
//!     .with_parameter("customer", "ACME")
//!     .with_format(OutputFormat::Html)
//!     .build()?;
//!
//! let html = pipeline.render(VecRowSource::from_json_str(rows)?)?;
//! ```

mod builder;
pub mod config;
mod orchestrator;

pub use builder::{ReportPipelineBuilder, default_dispatcher};
pub use config::{DEFAULT_PREVIEW_LIMIT, RenderConfig};
pub use orchestrator::ReportPipeline;
pub(crate) use orchestrator::layout_rows;
