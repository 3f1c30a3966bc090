use crate::model::Template;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedType {
    pub name: String,
    #[serde(rename = "type")]
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub class_name: String,
    pub calculation: &'static str,
    pub reset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupInfo {
    pub name: String,
    pub expression: String,
}

/// A summary of a template for editor tooling and `--info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub page_width: f32,
    pub page_height: f32,
    pub fields: Vec<NamedType>,
    pub variables: Vec<VariableInfo>,
    pub groups: Vec<GroupInfo>,
    pub parameters: Vec<NamedType>,
    pub has_query: bool,
    /// Names of the bands present, section bands in page order.
    pub bands: Vec<&'static str>,
}

impl From<&Template> for TemplateInfo {
    fn from(t: &Template) -> Self {
        let mut bands: Vec<&'static str> = t.bands.iter().map(|b| b.kind.name()).collect();
        for group in &t.groups {
            for band in [&group.header, &group.footer].into_iter().flatten() {
                if !bands.contains(&band.kind.name()) {
                    bands.push(band.kind.name());
                }
            }
        }
        TemplateInfo {
            name: t.name.clone(),
            page_width: t.page.width,
            page_height: t.page.height,
            fields: t
                .fields
                .iter()
                .map(|f| NamedType {
                    name: f.name.clone(),
                    class_name: f.class_name.clone(),
                })
                .collect(),
            variables: t
                .variables
                .iter()
                .map(|v| VariableInfo {
                    name: v.name.clone(),
                    class_name: v.class_name.clone(),
                    calculation: v.calculation.name(),
                    reset: v.reset.describe(),
                })
                .collect(),
            groups: t
                .groups
                .iter()
                .map(|g| GroupInfo {
                    name: g.name.clone(),
                    expression: g.expression.source().to_string(),
                })
                .collect(),
            parameters: t
                .parameters
                .iter()
                .map(|p| NamedType {
                    name: p.name.clone(),
                    class_name: p.class_name.clone(),
                })
                .collect(),
            has_query: t.query.is_some(),
            bands,
        }
    }
}
