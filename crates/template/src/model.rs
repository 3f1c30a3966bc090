use banded_expr::{Expression, ExpressionError, FormatSpec};
use banded_types::{Color, GroupId, Rect, ValueType};
use serde::Serialize;

/// Expression text together with its resolved form.
///
/// The compiled tree is filled in by the resolution pass; until then the
/// expression cannot be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    source: String,
    compiled: Option<Expression>,
}

impl Expr {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into().trim().to_string(),
            compiled: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn compiled(&self) -> Result<&Expression, ExpressionError> {
        self.compiled
            .as_ref()
            .ok_or_else(|| ExpressionError::Syntax {
                source_text: self.source.clone(),
                message: "expression has not been resolved".to_string(),
            })
    }

    pub(crate) fn set_compiled(&mut self, expression: Option<Expression>) {
        self.compiled = expression;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 20.0,
            right: 20.0,
            top: 20.0,
            bottom: 20.0,
        }
    }
}

/// Page geometry in points. Defaults to A4 portrait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub column_width: f32,
    pub margins: Margins,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            column_width: 555.0,
            margins: Margins::default(),
        }
    }
}

impl PageSetup {
    /// Vertical space between the top and bottom margins.
    pub fn printable_height(&self) -> f32 {
        self.height - self.margins.top - self.margins.bottom
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Column of the row source this field binds to.
    pub column: String,
    pub value_type: ValueType,
    pub class_name: String,
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            class_name: java_class(value_type).to_string(),
            name,
            value_type,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value_type: ValueType,
    pub class_name: String,
    pub default: Option<Expr>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            class_name: java_class(value_type).to_string(),
            default: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Calculation {
    /// Keeps the most recently evaluated value.
    None,
    Sum,
    Count,
    Average,
    Min,
    Max,
    First,
}

impl Calculation {
    /// Accepts both the JRXML spellings (`Sum`, `Lowest`, `Nothing`, ...) and
    /// the lowercase short names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Nothing" | "none" | "nothing" => Some(Calculation::None),
            "Sum" | "sum" => Some(Calculation::Sum),
            "Count" | "count" => Some(Calculation::Count),
            "Average" | "average" => Some(Calculation::Average),
            "Lowest" | "min" | "lowest" => Some(Calculation::Min),
            "Highest" | "max" | "highest" => Some(Calculation::Max),
            "First" | "first" => Some(Calculation::First),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Calculation::None => "none",
            Calculation::Sum => "sum",
            Calculation::Count => "count",
            Calculation::Average => "average",
            Calculation::Min => "min",
            Calculation::Max => "max",
            Calculation::First => "first",
        }
    }
}

/// When a variable's aggregate restarts from its initial value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    Report,
    Page,
    Column,
    Group(String),
    /// Never reset, not even at report start beyond initialisation.
    Never,
}

impl ResetScope {
    pub fn describe(&self) -> String {
        match self {
            ResetScope::Report => "report".to_string(),
            ResetScope::Page => "page".to_string(),
            ResetScope::Column => "column".to_string(),
            ResetScope::Group(name) => format!("group:{}", name),
            ResetScope::Never => "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value_type: ValueType,
    pub class_name: String,
    pub calculation: Calculation,
    pub reset: ResetScope,
    /// Set by resolution when `reset` names a declared group.
    pub reset_group: Option<GroupId>,
    pub expression: Option<Expr>,
    pub initial_value: Option<Expr>,
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        calculation: Calculation,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            class_name: java_class(value_type).to_string(),
            calculation,
            reset: ResetScope::Report,
            reset_group: None,
            expression: Some(Expr::new(expression)),
            initial_value: None,
        }
    }

    pub fn with_reset(mut self, reset: ResetScope) -> Self {
        self.reset = reset;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub expression: Expr,
    pub header: Option<Band>,
    pub footer: Option<Band>,
    pub start_new_page: bool,
    pub reprint_header_on_each_page: bool,
}

impl Group {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: Expr::new(expression),
            header: None,
            footer: None,
            start_new_page: false,
            reprint_header_on_each_page: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub name: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BandKind {
    Title,
    PageHeader,
    ColumnHeader,
    GroupHeader,
    Detail,
    GroupFooter,
    ColumnFooter,
    PageFooter,
    LastPageFooter,
    Summary,
    NoData,
}

impl BandKind {
    pub fn name(self) -> &'static str {
        match self {
            BandKind::Title => "title",
            BandKind::PageHeader => "pageHeader",
            BandKind::ColumnHeader => "columnHeader",
            BandKind::GroupHeader => "groupHeader",
            BandKind::Detail => "detail",
            BandKind::GroupFooter => "groupFooter",
            BandKind::ColumnFooter => "columnFooter",
            BandKind::PageFooter => "pageFooter",
            BandKind::LastPageFooter => "lastPageFooter",
            BandKind::Summary => "summary",
            BandKind::NoData => "noData",
        }
    }

    /// Whether the band is declared directly under the report root rather than in a group.
    pub fn is_section(self) -> bool {
        !matches!(self, BandKind::GroupHeader | BandKind::GroupFooter)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            BandKind::Title,
            BandKind::PageHeader,
            BandKind::ColumnHeader,
            BandKind::GroupHeader,
            BandKind::Detail,
            BandKind::GroupFooter,
            BandKind::ColumnFooter,
            BandKind::PageFooter,
            BandKind::LastPageFooter,
            BandKind::Summary,
            BandKind::NoData,
        ]
        .into_iter()
        .find(|k| k.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub kind: BandKind,
    pub height: f32,
    pub elements: Vec<Element>,
    /// `<printWhenExpression>`: a band whose condition is not true is skipped
    /// and takes no vertical space.
    pub print_when: Option<Expr>,
}

impl Band {
    pub fn new(kind: BandKind, height: f32) -> Self {
        Self {
            kind,
            height,
            elements: Vec::new(),
            print_when: None,
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_print_when(mut self, condition: impl Into<String>) -> Self {
        self.print_when = Some(Expr::new(condition));
        self
    }

    /// The lowest element bottom edge; the height of a band declared without one.
    pub fn content_height(&self) -> f32 {
        self.elements
            .iter()
            .map(|e| e.rect.bottom())
            .fold(0.0, f32::max)
    }
}

/// The once-per-report and once-per-page sections of a template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionBands {
    pub title: Option<Band>,
    pub page_header: Option<Band>,
    pub column_header: Option<Band>,
    pub detail: Option<Band>,
    pub column_footer: Option<Band>,
    pub page_footer: Option<Band>,
    pub last_page_footer: Option<Band>,
    pub summary: Option<Band>,
    pub no_data: Option<Band>,
}

impl SectionBands {
    pub fn slot_mut(&mut self, kind: BandKind) -> Option<&mut Option<Band>> {
        match kind {
            BandKind::Title => Some(&mut self.title),
            BandKind::PageHeader => Some(&mut self.page_header),
            BandKind::ColumnHeader => Some(&mut self.column_header),
            BandKind::Detail => Some(&mut self.detail),
            BandKind::ColumnFooter => Some(&mut self.column_footer),
            BandKind::PageFooter => Some(&mut self.page_footer),
            BandKind::LastPageFooter => Some(&mut self.last_page_footer),
            BandKind::Summary => Some(&mut self.summary),
            BandKind::NoData => Some(&mut self.no_data),
            BandKind::GroupHeader | BandKind::GroupFooter => None,
        }
    }

    /// Present section bands in page order.
    pub fn iter(&self) -> impl Iterator<Item = &Band> {
        [
            &self.title,
            &self.page_header,
            &self.column_header,
            &self.detail,
            &self.column_footer,
            &self.page_footer,
            &self.last_page_footer,
            &self.summary,
            &self.no_data,
        ]
        .into_iter()
        .flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Band> {
        [
            &mut self.title,
            &mut self.page_header,
            &mut self.column_header,
            &mut self.detail,
            &mut self.column_footer,
            &mut self.page_footer,
            &mut self.last_page_footer,
            &mut self.summary,
            &mut self.no_data,
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Visual attributes of an element. Everything here is carried verbatim into
/// the layout model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementStyle {
    pub forecolor: Option<Color>,
    pub backcolor: Option<Color>,
    /// `mode="Opaque"`: the background is filled.
    pub opaque: bool,
    pub font_name: Option<String>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            forecolor: None,
            backcolor: None,
            opaque: false,
            font_name: None,
            font_size: 10.0,
            bold: false,
            italic: false,
            underline: false,
            align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationTime {
    #[default]
    Now,
    /// Resolved once every row has been processed.
    Report,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    pub expression: Expr,
    /// The format as written; resolution turns it into `format`.
    pub pattern: Option<String>,
    pub format: FormatSpec,
    pub evaluation_time: EvaluationTime,
    pub blank_when_null: bool,
}

impl TextField {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: Expr::new(expression),
            pattern: None,
            format: FormatSpec::Plain,
            evaluation_time: EvaluationTime::Now,
            blank_when_null: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    StaticText { text: String },
    TextField(TextField),
    Image { expression: Option<Expr> },
    Line,
    Rectangle,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::StaticText { .. } => "staticText",
            ElementKind::TextField(_) => "textField",
            ElementKind::Image { .. } => "image",
            ElementKind::Line => "line",
            ElementKind::Rectangle => "rectangle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub rect: Rect,
    pub kind: ElementKind,
    pub style: ElementStyle,
    /// Hides the element, leaving its space empty, unless the condition is true.
    pub print_when: Option<Expr>,
}

impl Element {
    pub fn new(rect: Rect, kind: ElementKind) -> Self {
        Self {
            rect,
            kind,
            style: ElementStyle::default(),
            print_when: None,
        }
    }

    pub fn with_print_when(mut self, condition: impl Into<String>) -> Self {
        self.print_when = Some(Expr::new(condition));
        self
    }

    pub fn static_text(rect: Rect, text: impl Into<String>) -> Self {
        Self::new(rect, ElementKind::StaticText { text: text.into() })
    }

    pub fn text_field(rect: Rect, field: TextField) -> Self {
        Self::new(rect, ElementKind::TextField(field))
    }
}

/// A band together with where it sits in the template, for diagnostics and layout tagging.
#[derive(Debug, Clone, Copy)]
pub struct BandRef<'a> {
    pub band: &'a Band,
    pub group: Option<&'a str>,
}

impl BandRef<'_> {
    /// `band:detail`, `group:Region/groupHeader`, ...
    pub fn location(&self) -> String {
        match self.group {
            Some(group) => format!("group:{}/{}", group, self.band.kind.name()),
            None => format!("band:{}", self.band.kind.name()),
        }
    }
}

/// A parsed, resolved report definition. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub page: PageSetup,
    /// Query text for an external row-source collaborator; never executed here.
    pub query: Option<String>,
    pub parameters: Vec<Parameter>,
    pub fields: Vec<Field>,
    pub sort_fields: Vec<SortField>,
    pub variables: Vec<Variable>,
    /// Outermost group first.
    pub groups: Vec<Group>,
    pub bands: SectionBands,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page: PageSetup::default(),
            query: None,
            parameters: Vec::new(),
            fields: Vec::new(),
            sort_fields: Vec::new(),
            variables: Vec::new(),
            groups: Vec::new(),
            bands: SectionBands::default(),
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    /// Every band in the template, section bands first, then group headers and footers.
    pub fn all_bands(&self) -> Vec<BandRef<'_>> {
        let mut bands: Vec<BandRef<'_>> = self
            .bands
            .iter()
            .map(|band| BandRef { band, group: None })
            .collect();
        for group in &self.groups {
            for band in [&group.header, &group.footer].into_iter().flatten() {
                bands.push(BandRef {
                    band,
                    group: Some(&group.name),
                });
            }
        }
        bands
    }

    pub fn all_bands_mut(&mut self) -> impl Iterator<Item = &mut Band> {
        self.bands.iter_mut().chain(
            self.groups
                .iter_mut()
                .flat_map(|g| [&mut g.header, &mut g.footer].into_iter().flatten()),
        )
    }
}

/// The canonical Java class name written for a value type.
pub fn java_class(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::String => "java.lang.String",
        ValueType::Number => "java.math.BigDecimal",
        ValueType::Date => "java.util.Date",
        ValueType::Boolean => "java.lang.Boolean",
    }
}
