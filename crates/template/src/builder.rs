//! Programmatic template construction.

use crate::error::DefinitionError;
use crate::model::*;
use crate::resolve::{self, Finding};
use banded_types::{Rect, ValueType};

/// Builds a [`Template`] fluently. Anything not set explicitly is derived:
/// a centred title, a bold column-header row and a detail band with one text
/// field per declared field, spread evenly across the column width.
///
/// ```
/// use banded_template::TemplateBuilder;
/// use banded_types::ValueType;
///
/// let template = TemplateBuilder::new("Customers")
///     .field("name", ValueType::String)
///     .field("balance", ValueType::Number)
///     .title("Customer balances")
///     .column_header("Name", 300.0)
///     .column_header("Balance", 255.0)
///     .build()
///     .unwrap();
/// assert_eq!(template.bands.detail.unwrap().elements.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    template: Template,
    title: Option<String>,
    column_headers: Vec<(String, f32)>,
    misplaced_bands: Vec<BandKind>,
}

impl TemplateBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            template: Template::new(name),
            title: None,
            column_headers: Vec::new(),
            misplaced_bands: Vec::new(),
        }
    }

    pub fn page_size(mut self, width: f32, height: f32) -> Self {
        self.template.page.width = width;
        self.template.page.height = height;
        self.sync_column_width();
        self
    }

    pub fn margins(mut self, left: f32, right: f32, top: f32, bottom: f32) -> Self {
        self.template.page.margins = Margins {
            left,
            right,
            top,
            bottom,
        };
        self.sync_column_width();
        self
    }

    fn sync_column_width(&mut self) {
        let page = &mut self.template.page;
        page.column_width = page.width - page.margins.left - page.margins.right;
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.template.query = Some(query.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.template.fields.push(Field::new(name, value_type));
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.template.parameters.push(parameter);
        self
    }

    pub fn variable(mut self, variable: Variable) -> Self {
        self.template.variables.push(variable);
        self
    }

    /// Groups nest in the order they are added, outermost first.
    pub fn group(mut self, group: Group) -> Self {
        self.template.groups.push(group);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.template.sort_fields.push(SortField {
            name: field.into(),
            descending,
        });
        self
    }

    pub fn title(mut self, text: impl Into<String>) -> Self {
        self.title = Some(text.into());
        self
    }

    pub fn column_header(mut self, text: impl Into<String>, width: f32) -> Self {
        self.column_headers.push((text.into(), width));
        self
    }

    /// Sets a section band, replacing any derived one of the same kind.
    pub fn band(mut self, band: Band) -> Self {
        match self.template.bands.slot_mut(band.kind) {
            Some(slot) => *slot = Some(band),
            None => self.misplaced_bands.push(band.kind),
        }
        self
    }

    pub fn build(mut self) -> Result<Template, DefinitionError> {
        if let Some(kind) = self.misplaced_bands.first() {
            return Err(DefinitionError::UnknownBandKind {
                name: kind.name().to_string(),
                location: "report".to_string(),
            });
        }
        self.derive_bands();

        let mut template = self.template;
        let findings = resolve::resolve(&mut template);
        if findings.iter().any(Finding::is_error) {
            return Err(DefinitionError::Invalid(findings));
        }
        Ok(template)
    }

    fn derive_bands(&mut self) {
        let width = self.template.page.column_width;
        let bands = &mut self.template.bands;

        if let (Some(text), None) = (&self.title, &bands.title) {
            let mut heading = Element::static_text(Rect::new(0.0, 20.0, width, 30.0), text.clone());
            heading.style.align = HorizontalAlign::Center;
            heading.style.font_size = 18.0;
            heading.style.bold = true;
            bands.title = Some(Band::new(BandKind::Title, 60.0).with_element(heading));
        }

        if !self.column_headers.is_empty() && bands.column_header.is_none() {
            let mut band = Band::new(BandKind::ColumnHeader, 25.0);
            let mut x = 0.0;
            for (text, w) in &self.column_headers {
                let mut header = Element::static_text(Rect::new(x, 5.0, *w, 15.0), text.clone());
                header.style.bold = true;
                band.elements.push(header);
                x += w;
            }
            bands.column_header = Some(band);
        }

        let fields = &self.template.fields;
        if !fields.is_empty() && bands.detail.is_none() {
            let w = (width / fields.len() as f32).floor();
            let mut band = Band::new(BandKind::Detail, 20.0);
            for (i, field) in fields.iter().enumerate() {
                band.elements.push(Element::text_field(
                    Rect::new(i as f32 * w, 0.0, w, 20.0),
                    TextField::new(format!("$F{{{}}}", field.name)),
                ));
            }
            bands.detail = Some(band);
        }
    }
}
