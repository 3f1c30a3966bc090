//! Banded report generation.
//!
//! A report template declares fields, parameters, variables, groups and a set
//! of horizontal bands. Rows from a [`RowSource`] are bound to the fields,
//! grouped and aggregated, the bands are paginated into a [`LayoutModel`], and
//! the model is written out as HTML, PDF or any format with a registered
//! [`DrawingCollaborator`].
//!
//! ```
//! use banded::{OutputFormat, VecRowSource, parse_template, render};
//!
//! let template = parse_template(r#"
//!     <jasperReport name="hello">
//!       <field name="name" class="java.lang.String"/>
//!       <detail><band height="20">
//!         <textField>
//!           <reportElement x="0" y="0" width="200" height="20"/>
//!           <textFieldExpression><![CDATA["Hello " + $F{name}]]></textFieldExpression>
//!         </textField>
//!       </band></detail>
//!     </jasperReport>"#).unwrap();
//!
//! let rows = VecRowSource::from_json_str(r#"[{"name": "world"}]"#).unwrap();
//! let html = render(&template, rows, &Default::default(), OutputFormat::Html).unwrap();
//! assert!(String::from_utf8(html).unwrap().contains("Hello world"));
//! ```

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{
    DEFAULT_PREVIEW_LIMIT, RenderConfig, ReportPipeline, ReportPipelineBuilder, default_dispatcher,
};

pub use banded_data::{DataError, PreviewRow};
pub use banded_expr::ExpressionError;
pub use banded_layout::{LayoutContent, LayoutElement, LayoutError, LayoutModel, LayoutPage};
pub use banded_render_core::{
    DocumentAccumulator, DrawingCollaborator, OutputFormat, RenderDispatcher, RenderError,
};
pub use banded_render_lopdf::LopdfCollaborator;
pub use banded_source::{IteratorRowSource, JsonLinesRowSource, Row, RowSource, VecRowSource};
pub use banded_template::{
    DefinitionError, Finding, Severity, Template, TemplateBuilder, TemplateInfo,
};
pub use banded_types::{Size, Value, ValueType};

use serde_json::{Map, Value as Json};

/// Parses a JRXML template and resolves every name it references.
pub fn parse_template(source: &str) -> Result<Template, PipelineError> {
    Ok(banded_template::parse(source)?)
}

/// Structural findings for a template. Empty for any template that renders.
pub fn validate_template(template: &Template) -> Vec<Finding> {
    banded_template::validate(template)
}

/// Advisory warnings, such as a template without a detail band.
pub fn lint_template(template: &Template) -> Vec<Finding> {
    banded_template::lint::lint(template)
}

pub fn template_info(template: &Template) -> TemplateInfo {
    TemplateInfo::from(template)
}

/// Renders every row of `source` to `format` with the default collaborators.
///
/// Either the whole document is returned or an error is; a failing row never
/// yields a partial report.
pub fn render<S: RowSource>(
    template: &Template,
    source: S,
    parameters: &Map<String, Json>,
    format: OutputFormat,
) -> Result<Vec<u8>, PipelineError> {
    let dispatcher = default_dispatcher();
    if !dispatcher.supports(format) {
        return Err(RenderError::NoCollaborator(format).into());
    }
    let values = banded_data::resolve_parameters(template, parameters, false)?;
    let model = pipeline::layout_rows(template, source, values)?;
    Ok(dispatcher.render(&model, format)?)
}

/// Field values of the first `limit` rows, in source order, without sorting,
/// grouping or layout.
pub fn preview_rows<S: RowSource>(
    template: &Template,
    source: S,
    limit: usize,
) -> Result<Vec<PreviewRow>, PipelineError> {
    Ok(banded_data::preview_rows(template, source, limit)?)
}
