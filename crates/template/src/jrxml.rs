//! Reads JRXML report definitions into the template model.
//!
//! The reader is purely structural: it builds the model and reports malformed
//! markup, but leaves expressions as source text. Name resolution happens in
//! [`crate::resolve`].

use crate::error::DefinitionError;
use crate::model::*;
use banded_types::{Color, Rect, ValueType};
use roxmltree::{Document, Node};

/// Root children that carry nothing the renderer uses.
const IGNORED_SECTIONS: &[&str] = &[
    "property",
    "import",
    "template",
    "reportFont",
    "style",
    "subDataset",
    "scriptlet",
    "filterExpression",
    "background",
    "description",
];

pub fn read(source: &str) -> Result<Template, DefinitionError> {
    let doc = Document::parse(source)?;
    let reader = Reader { doc: &doc };
    reader.read_report(doc.root_element())
}

struct Reader<'d, 'input> {
    doc: &'d Document<'input>,
}

impl<'d, 'input> Reader<'d, 'input> {
    fn location(&self, node: Node<'_, '_>) -> String {
        let pos = self.doc.text_pos_at(node.range().start);
        format!("<{}> at line {}, column {}", node.tag_name().name(), pos.row, pos.col)
    }

    fn read_report(&self, root: Node<'_, '_>) -> Result<Template, DefinitionError> {
        if root.tag_name().name() != "jasperReport" {
            return Err(DefinitionError::malformed(
                self.location(root),
                "root element must be <jasperReport>",
            ));
        }

        let mut template = Template::new(root.attribute("name").unwrap_or("Report"));
        let width = self.attr_f32(root, "pageWidth", 595.0)?;
        let margins = Margins {
            left: self.attr_f32(root, "leftMargin", 20.0)?,
            right: self.attr_f32(root, "rightMargin", 20.0)?,
            top: self.attr_f32(root, "topMargin", 20.0)?,
            bottom: self.attr_f32(root, "bottomMargin", 20.0)?,
        };
        template.page = PageSetup {
            width,
            height: self.attr_f32(root, "pageHeight", 842.0)?,
            column_width: self.attr_f32(root, "columnWidth", width - margins.left - margins.right)?,
            margins,
        };

        for child in root.children().filter(Node::is_element) {
            let name = child.tag_name().name();
            match name {
                "queryString" => {
                    let query = text_of(child);
                    template.query = (!query.is_empty()).then_some(query);
                }
                "parameter" => template.parameters.push(self.read_parameter(child)?),
                "field" => template.fields.push(self.read_field(child)?),
                "sortField" => template.sort_fields.push(self.read_sort_field(child)?),
                "variable" => template.variables.push(self.read_variable(child)?),
                "group" => template.groups.push(self.read_group(child)?),
                ignored if IGNORED_SECTIONS.contains(&ignored) => {
                    log::debug!("Ignoring <{}> section", ignored);
                }
                other => {
                    let Some(kind) = BandKind::from_name(other).filter(|k| k.is_section()) else {
                        return Err(DefinitionError::UnknownBandKind {
                            name: other.to_string(),
                            location: self.location(child),
                        });
                    };
                    let band = self.read_section(child, kind)?;
                    if let Some(slot) = template.bands.slot_mut(kind) {
                        *slot = band;
                    }
                }
            }
        }
        Ok(template)
    }

    fn read_parameter(&self, node: Node<'_, '_>) -> Result<Parameter, DefinitionError> {
        let name = self.required_attr(node, "name")?;
        let class_name = node.attribute("class").unwrap_or("java.lang.String");
        Ok(Parameter {
            name: name.to_string(),
            value_type: self.value_type(node, class_name),
            class_name: class_name.to_string(),
            default: child(node, "defaultValueExpression").map(|e| Expr::new(text_of(e))),
        })
    }

    fn read_field(&self, node: Node<'_, '_>) -> Result<Field, DefinitionError> {
        let name = self.required_attr(node, "name")?;
        let class_name = node.attribute("class").unwrap_or("java.lang.String");
        Ok(Field {
            name: name.to_string(),
            column: name.to_string(),
            value_type: self.value_type(node, class_name),
            class_name: class_name.to_string(),
            description: child(node, "fieldDescription")
                .map(text_of)
                .filter(|d| !d.is_empty()),
        })
    }

    fn read_sort_field(&self, node: Node<'_, '_>) -> Result<SortField, DefinitionError> {
        let name = self.required_attr(node, "name")?;
        let descending = match node.attribute("order").unwrap_or("Ascending") {
            "Ascending" | "ascending" => false,
            "Descending" | "descending" => true,
            other => {
                return Err(DefinitionError::malformed(
                    self.location(node),
                    format!("unknown sort order '{}'", other),
                ));
            }
        };
        Ok(SortField {
            name: name.to_string(),
            descending,
        })
    }

    fn read_variable(&self, node: Node<'_, '_>) -> Result<Variable, DefinitionError> {
        let name = self.required_attr(node, "name")?;
        let class_name = node.attribute("class").unwrap_or("java.lang.String");
        let calculation_name = node.attribute("calculation").unwrap_or("Nothing");
        let calculation = Calculation::from_name(calculation_name).ok_or_else(|| {
            DefinitionError::malformed(
                self.location(node),
                format!("unknown calculation '{}'", calculation_name),
            )
        })?;
        let reset = match node.attribute("resetType").unwrap_or("Report") {
            "Report" | "report" => ResetScope::Report,
            "Page" | "page" => ResetScope::Page,
            "Column" | "column" => ResetScope::Column,
            "Group" | "group" => {
                ResetScope::Group(node.attribute("resetGroup").unwrap_or_default().to_string())
            }
            "None" | "none" => ResetScope::Never,
            other => {
                return Err(DefinitionError::malformed(
                    self.location(node),
                    format!("unknown resetType '{}'", other),
                ));
            }
        };
        Ok(Variable {
            name: name.to_string(),
            value_type: self.value_type(node, class_name),
            class_name: class_name.to_string(),
            calculation,
            reset,
            reset_group: None,
            expression: child(node, "variableExpression").map(|e| Expr::new(text_of(e))),
            initial_value: child(node, "initialValueExpression").map(|e| Expr::new(text_of(e))),
        })
    }

    fn read_group(&self, node: Node<'_, '_>) -> Result<Group, DefinitionError> {
        let name = self.required_attr(node, "name")?;
        let expression = child(node, "groupExpression").ok_or_else(|| {
            DefinitionError::malformed(
                self.location(node),
                format!("group '{}' has no <groupExpression>", name),
            )
        })?;
        let header = match child(node, "groupHeader") {
            Some(h) => self.read_section(h, BandKind::GroupHeader)?,
            None => None,
        };
        let footer = match child(node, "groupFooter") {
            Some(f) => self.read_section(f, BandKind::GroupFooter)?,
            None => None,
        };
        Ok(Group {
            name: name.to_string(),
            expression: Expr::new(text_of(expression)),
            header,
            footer,
            start_new_page: attr_bool(node, "isStartNewPage"),
            reprint_header_on_each_page: attr_bool(node, "isReprintHeaderOnEachPage"),
        })
    }

    /// A section holds zero or more `<band>`s; several are stacked into one,
    /// and the print-when condition of a stacked band moves onto its elements.
    fn read_section(&self, node: Node<'_, '_>, kind: BandKind) -> Result<Option<Band>, DefinitionError> {
        let mut bands = children(node, "band")
            .map(|band_node| self.read_band(band_node, kind))
            .collect::<Result<Vec<_>, _>>()?;
        if bands.len() <= 1 {
            return Ok(bands.pop());
        }
        let mut merged = Band::new(kind, 0.0);
        for band in bands {
            let offset = merged.height;
            let condition = band.print_when;
            merged.elements.extend(band.elements.into_iter().map(|mut e| {
                e.rect = e.rect.translate(0.0, offset);
                if e.print_when.is_none() {
                    e.print_when = condition.clone();
                }
                e
            }));
            merged.height += band.height;
        }
        Ok(Some(merged))
    }

    fn read_band(&self, node: Node<'_, '_>, kind: BandKind) -> Result<Band, DefinitionError> {
        let mut elements = Vec::new();
        self.read_elements(node, 0.0, 0.0, None, &mut elements)?;
        let mut band = Band {
            kind,
            height: 0.0,
            elements,
            print_when: print_when(node),
        };
        band.height = match node.attribute("height") {
            Some(_) => self.attr_f32(node, "height", 0.0)?,
            None => band.content_height(),
        };
        Ok(band)
    }

    /// Collects the drawable children of a band or frame, flattening frames
    /// into absolute band coordinates. Children of a conditional frame inherit
    /// its condition unless they carry their own.
    fn read_elements(
        &self,
        node: Node<'_, '_>,
        dx: f32,
        dy: f32,
        inherited: Option<&Expr>,
        out: &mut Vec<Element>,
    ) -> Result<(), DefinitionError> {
        for el in node.children().filter(Node::is_element) {
            let tag = el.tag_name().name();
            let condition = child(el, "reportElement")
                .and_then(print_when)
                .or_else(|| inherited.cloned());
            let kind = match tag {
                "staticText" => ElementKind::StaticText {
                    text: child(el, "text").map(text_of).unwrap_or_default(),
                },
                "textField" => ElementKind::TextField(self.read_text_field(el)?),
                "image" => ElementKind::Image {
                    expression: child(el, "imageExpression").map(|e| Expr::new(text_of(e))),
                },
                "line" => ElementKind::Line,
                "rectangle" => ElementKind::Rectangle,
                "frame" => {
                    let rect = self.read_rect(el)?;
                    let frame = Element {
                        rect: rect.translate(dx, dy),
                        kind: ElementKind::Rectangle,
                        style: self.read_style(el)?,
                        print_when: condition.clone(),
                    };
                    if frame.style.opaque || child(el, "box").is_some() {
                        out.push(frame);
                    }
                    self.read_elements(el, dx + rect.x, dy + rect.y, condition.as_ref(), out)?;
                    continue;
                }
                "reportElement" | "box" | "printWhenExpression" => continue,
                other => {
                    log::warn!(
                        "Skipping unsupported element <{}> at {}",
                        other,
                        self.location(el)
                    );
                    continue;
                }
            };
            out.push(Element {
                rect: self.read_rect(el)?.translate(dx, dy),
                kind,
                style: self.read_style(el)?,
                print_when: condition,
            });
        }
        Ok(())
    }

    fn read_rect(&self, el: Node<'_, '_>) -> Result<Rect, DefinitionError> {
        let Some(re) = child(el, "reportElement") else {
            return Err(DefinitionError::malformed(
                self.location(el),
                "element has no <reportElement>",
            ));
        };
        Ok(Rect::new(
            self.attr_f32(re, "x", 0.0)?,
            self.attr_f32(re, "y", 0.0)?,
            self.attr_f32(re, "width", 0.0)?,
            self.attr_f32(re, "height", 0.0)?,
        ))
    }

    fn read_style(&self, el: Node<'_, '_>) -> Result<ElementStyle, DefinitionError> {
        let mut style = ElementStyle::default();
        if let Some(re) = child(el, "reportElement") {
            style.forecolor = self.attr_color(re, "forecolor")?;
            style.backcolor = self.attr_color(re, "backcolor")?;
            style.opaque = re.attribute("mode") == Some("Opaque");
        }
        if let Some(te) = child(el, "textElement") {
            style.align = match te.attribute("textAlignment").unwrap_or("Left") {
                "Center" => HorizontalAlign::Center,
                "Right" => HorizontalAlign::Right,
                "Justified" => HorizontalAlign::Justified,
                _ => HorizontalAlign::Left,
            };
            style.vertical_align = match te.attribute("verticalAlignment").unwrap_or("Top") {
                "Middle" => VerticalAlign::Middle,
                "Bottom" => VerticalAlign::Bottom,
                _ => VerticalAlign::Top,
            };
            if let Some(font) = child(te, "font") {
                style.font_size = self.attr_f32(font, "size", style.font_size)?;
                style.font_name = font.attribute("fontName").map(str::to_string);
                style.bold = attr_bool(font, "isBold");
                style.italic = attr_bool(font, "isItalic");
                style.underline = attr_bool(font, "isUnderline");
            }
        }
        Ok(style)
    }

    fn read_text_field(&self, el: Node<'_, '_>) -> Result<TextField, DefinitionError> {
        let expression = child(el, "textFieldExpression").ok_or_else(|| {
            DefinitionError::malformed(self.location(el), "textField has no <textFieldExpression>")
        })?;
        let evaluation_time = match el.attribute("evaluationTime").unwrap_or("Now") {
            "Now" => EvaluationTime::Now,
            "Report" => EvaluationTime::Report,
            other => {
                log::warn!(
                    "evaluationTime '{}' at {} is not supported, evaluating immediately",
                    other,
                    self.location(el)
                );
                EvaluationTime::Now
            }
        };
        let mut field = TextField::new(text_of(expression));
        field.pattern = el
            .attribute("pattern")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        field.evaluation_time = evaluation_time;
        field.blank_when_null = attr_bool(el, "isBlankWhenNull");
        Ok(field)
    }

    fn value_type(&self, node: Node<'_, '_>, class_name: &str) -> ValueType {
        ValueType::from_declared(class_name).unwrap_or_else(|| {
            log::warn!(
                "Class '{}' at {} has no value mapping, treating it as a string",
                class_name,
                self.location(node)
            );
            ValueType::String
        })
    }

    fn required_attr<'n>(&self, node: Node<'n, '_>, name: &str) -> Result<&'n str, DefinitionError> {
        node.attribute(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                DefinitionError::malformed(self.location(node), format!("missing '{}' attribute", name))
            })
    }

    fn attr_f32(&self, node: Node<'_, '_>, name: &str, default: f32) -> Result<f32, DefinitionError> {
        match node.attribute(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<f32>().map_err(|_| {
                DefinitionError::malformed(
                    self.location(node),
                    format!("attribute '{}' is not a number: '{}'", name, raw),
                )
            }),
        }
    }

    fn attr_color(&self, node: Node<'_, '_>, name: &str) -> Result<Option<Color>, DefinitionError> {
        node.attribute(name)
            .map(|raw| {
                Color::parse_hex(raw)
                    .map_err(|message| DefinitionError::malformed(self.location(node), message))
            })
            .transpose()
    }
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

/// The `<printWhenExpression>` child of a band or `<reportElement>`, if not empty.
fn print_when(node: Node<'_, '_>) -> Option<Expr> {
    child(node, "printWhenExpression")
        .map(text_of)
        .filter(|condition| !condition.is_empty())
        .map(Expr::new)
}

/// Concatenated text content, CDATA included, trimmed.
fn text_of(node: Node<'_, '_>) -> String {
    let mut s = String::new();
    for n in node.descendants().filter(Node::is_text) {
        if let Some(text) = n.text() {
            s.push_str(text);
        }
    }
    s.trim().to_string()
}

fn attr_bool(node: Node<'_, '_>, name: &str) -> bool {
    node.attribute(name) == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<jasperReport xmlns="http://jasperreports.sourceforge.net/jasperreports"
              name="Sales" pageWidth="612" pageHeight="792" leftMargin="30" rightMargin="30">
    <property name="ireport.zoom" value="1.0"/>
    <parameter name="Title" class="java.lang.String">
        <defaultValueExpression><![CDATA["Quarterly"]]></defaultValueExpression>
    </parameter>
    <queryString><![CDATA[SELECT region, amount FROM sales]]></queryString>
    <field name="region" class="java.lang.String"/>
    <field name="amount" class="java.math.BigDecimal">
        <fieldDescription><![CDATA[Sale amount]]></fieldDescription>
    </field>
    <sortField name="region" order="Descending"/>
    <variable name="RegionTotal" class="java.math.BigDecimal" calculation="Sum" resetType="Group" resetGroup="Region">
        <variableExpression><![CDATA[$F{amount}]]></variableExpression>
        <initialValueExpression><![CDATA[0]]></initialValueExpression>
    </variable>
    <group name="Region" isStartNewPage="true">
        <groupExpression><![CDATA[$F{region}]]></groupExpression>
        <groupHeader>
            <band height="20">
                <textField>
                    <reportElement x="0" y="0" width="200" height="20" forecolor="#336699"/>
                    <textElement textAlignment="Center"><font size="12" isBold="true"/></textElement>
                    <textFieldExpression><![CDATA[$F{region}]]></textFieldExpression>
                </textField>
            </band>
        </groupHeader>
    </group>
    <detail>
        <band height="15">
            <textField pattern="currency" isBlankWhenNull="true">
                <reportElement x="0" y="0" width="100" height="15"/>
                <textFieldExpression><![CDATA[$F{amount}]]></textFieldExpression>
            </textField>
        </band>
        <band>
            <line><reportElement x="0" y="2" width="552" height="1"/></line>
        </band>
    </detail>
    <pageFooter>
        <band height="20">
            <frame>
                <reportElement x="100" y="5" width="200" height="15"/>
                <textField evaluationTime="Report">
                    <reportElement x="10" y="0" width="50" height="15"/>
                    <textFieldExpression><![CDATA[$V{PAGE_NUMBER}]]></textFieldExpression>
                </textField>
            </frame>
        </band>
    </pageFooter>
</jasperReport>"##;

    #[test]
    fn test_read_page_setup_and_declarations() {
        let t = read(REPORT).unwrap();
        assert_eq!(t.name, "Sales");
        assert_eq!(t.page.width, 612.0);
        assert_eq!(t.page.column_width, 552.0);
        assert_eq!(t.page.margins.top, 20.0);
        assert_eq!(t.query.as_deref(), Some("SELECT region, amount FROM sales"));
        assert_eq!(t.parameters[0].default.as_ref().unwrap().source(), "\"Quarterly\"");
        assert_eq!(t.fields[1].value_type, ValueType::Number);
        assert_eq!(t.fields[1].description.as_deref(), Some("Sale amount"));
        assert!(t.sort_fields[0].descending);
        assert_eq!(t.variables[0].calculation, Calculation::Sum);
        assert_eq!(t.variables[0].reset, ResetScope::Group("Region".into()));
        assert!(t.groups[0].start_new_page);
    }

    #[test]
    fn test_stacked_detail_bands_and_computed_height() {
        let t = read(REPORT).unwrap();
        let detail = t.bands.detail.as_ref().unwrap();
        assert_eq!(detail.elements.len(), 2);
        // second band has no height: computed from the line (2 + 1), stacked below 15
        assert_eq!(detail.height, 18.0);
        assert_eq!(detail.elements[1].rect.y, 17.0);
        let ElementKind::TextField(tf) = &detail.elements[0].kind else {
            panic!("expected textField");
        };
        assert_eq!(tf.pattern.as_deref(), Some("currency"));
        assert!(tf.blank_when_null);
    }

    #[test]
    fn test_print_when_conditions() {
        let t = read(r##"<jasperReport name="x">
            <field name="n" class="java.lang.Integer"/>
            <title><band height="10">
                <printWhenExpression><![CDATA[$F{n} > 0]]></printWhenExpression>
                <staticText><reportElement x="0" y="0" width="10" height="10"/><text>t</text></staticText>
            </band></title>
            <detail>
                <band height="10">
                    <printWhenExpression><![CDATA[$F{n} > 1]]></printWhenExpression>
                    <frame>
                        <reportElement x="0" y="0" width="50" height="10">
                            <printWhenExpression><![CDATA[$F{n} > 2]]></printWhenExpression>
                        </reportElement>
                        <staticText><reportElement x="0" y="0" width="10" height="10"/><text>a</text></staticText>
                    </frame>
                    <staticText><reportElement x="20" y="0" width="10" height="10"/><text>c</text></staticText>
                </band>
                <band height="10">
                    <staticText><reportElement x="0" y="0" width="10" height="10"/><text>b</text></staticText>
                </band>
            </detail>
        </jasperReport>"##)
        .unwrap();

        let title = t.bands.title.as_ref().unwrap();
        assert_eq!(title.print_when.as_ref().map(Expr::source), Some("$F{n} > 0"));

        let detail = t.bands.detail.as_ref().unwrap();
        assert!(detail.print_when.is_none());
        let conditions: Vec<Option<&str>> = detail
            .elements
            .iter()
            .map(|e| e.print_when.as_ref().map(Expr::source))
            .collect();
        assert_eq!(conditions, vec![Some("$F{n} > 2"), Some("$F{n} > 1"), None]);
    }

    #[test]
    fn test_styles_and_frames() {
        let t = read(REPORT).unwrap();
        let header = t.groups[0].header.as_ref().unwrap();
        let style = &header.elements[0].style;
        assert_eq!(style.font_size, 12.0);
        assert!(style.bold);
        assert_eq!(style.align, HorizontalAlign::Center);
        assert_eq!(style.forecolor, Some(Color { r: 0x33, g: 0x66, b: 0x99 }));

        let footer = t.bands.page_footer.as_ref().unwrap();
        assert_eq!(footer.elements.len(), 1);
        assert_eq!(footer.elements[0].rect, Rect::new(110.0, 5.0, 50.0, 15.0));
        let ElementKind::TextField(tf) = &footer.elements[0].kind else {
            panic!("expected textField");
        };
        assert_eq!(tf.evaluation_time, EvaluationTime::Report);
    }

    #[test]
    fn test_unknown_band_kind_is_rejected() {
        let err = read(r#"<jasperReport name="x"><footer><band height="10"/></footer></jasperReport>"#)
            .unwrap_err();
        assert!(matches!(err, DefinitionError::UnknownBandKind { ref name, .. } if name == "footer"));

        let err = read(r#"<jasperReport name="x"><groupHeader/></jasperReport>"#).unwrap_err();
        assert!(matches!(err, DefinitionError::UnknownBandKind { .. }));
    }

    #[test]
    fn test_malformed_structure() {
        assert!(matches!(
            read("<report/>"),
            Err(DefinitionError::Malformed { .. })
        ));
        assert!(matches!(read("<jasperReport"), Err(DefinitionError::Xml(_))));
        assert!(matches!(
            read(r#"<jasperReport pageWidth="wide"/>"#),
            Err(DefinitionError::Malformed { .. })
        ));
        assert!(matches!(
            read(r#"<jasperReport><variable name="v" calculation="Median"/></jasperReport>"#),
            Err(DefinitionError::Malformed { .. })
        ));
        assert!(matches!(
            read(r#"<jasperReport><group name="g"/></jasperReport>"#),
            Err(DefinitionError::Malformed { .. })
        ));
    }

    #[test]
    fn test_defaults_when_attributes_missing() {
        let t = read("<jasperReport/>").unwrap();
        assert_eq!(t.name, "Report");
        assert_eq!(t.page, PageSetup::default());
        assert!(t.bands.detail.is_none());
    }
}
