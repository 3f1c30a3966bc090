//! Advisory checks that do not make a template invalid.
//!
//! These are kept apart from [`crate::validate`] so that a template which
//! renders can always validate cleanly.

use crate::model::Template;
use crate::resolve::Finding;

pub fn lint(template: &Template) -> Vec<Finding> {
    let mut warnings = Vec::new();

    if template.fields.is_empty() {
        warnings.push(Finding::warning(
            "no-fields",
            template.name.clone(),
            "report",
            "no fields are defined",
        ));
    }
    if template.bands.detail.is_none() {
        warnings.push(Finding::warning(
            "no-detail",
            template.name.clone(),
            "report",
            "no detail band is defined",
        ));
    }
    if template.query.is_none() && template.fields.is_empty() {
        warnings.push(Finding::warning(
            "no-data-source",
            template.name.clone(),
            "report",
            "no query is defined and no field can receive data",
        ));
    }

    for band_ref in template.all_bands() {
        let band = band_ref.band;
        for (index, element) in band.elements.iter().enumerate() {
            if element.rect.bottom() > band.height {
                warnings.push(Finding::warning(
                    "element-overflow",
                    element.kind.name(),
                    format!("{}/element[{}]", band_ref.location(), index),
                    format!(
                        "element bottom {} extends past the band height {}",
                        element.rect.bottom(),
                        band.height
                    ),
                ));
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use banded_types::{Rect, ValueType};

    #[test]
    fn test_empty_template_warnings() {
        let codes: Vec<_> = lint(&Template::new("empty")).iter().map(|f| f.code).collect();
        assert_eq!(codes, vec!["no-fields", "no-detail", "no-data-source"]);
    }

    #[test]
    fn test_element_overflow() {
        let mut t = Template::new("t");
        t.fields.push(Field::new("a", ValueType::String));
        t.bands.detail = Some(
            Band::new(BandKind::Detail, 10.0)
                .with_element(Element::static_text(Rect::new(0.0, 5.0, 50.0, 10.0), "x")),
        );
        let findings = lint(&t);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "element-overflow");
        assert_eq!(findings[0].location, "band:detail/element[0]");
        assert!(!findings[0].is_error());
    }
}
