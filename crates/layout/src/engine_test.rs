use super::*;
use banded_data::process;
use banded_source::VecRowSource;
use banded_template::{
    Band, BandKind, Calculation, Element, EvaluationTime, Group, ResetScope, Template,
    TemplateBuilder, TextField, Variable,
};
use banded_types::{Rect, ValueType};

fn field(expression: &str, height: f32) -> Element {
    Element::text_field(Rect::new(0.0, 0.0, 100.0, height), TextField::new(expression))
}

fn band(kind: BandKind, height: f32, element: Element) -> Band {
    Band::new(kind, height).with_element(element)
}

fn small_page(name: &str) -> TemplateBuilder {
    TemplateBuilder::new(name)
        .page_size(200.0, 200.0)
        .margins(10.0, 10.0, 10.0, 10.0)
}

fn try_run(template: &Template, json: &str) -> Result<LayoutModel, LayoutError> {
    let source = VecRowSource::from_json_str(json).unwrap();
    let processor = process(template, source, Vec::new()).unwrap();
    layout(template, processor)
}

fn run(template: &Template, json: &str) -> LayoutModel {
    try_run(template, json).unwrap()
}

fn amounts(count: usize) -> String {
    let rows: Vec<String> = (0..count).map(|_| r#"{"amount": 1}"#.to_string()).collect();
    format!("[{}]", rows.join(","))
}

fn all_texts(page: &LayoutPage) -> Vec<&str> {
    page.elements.iter().filter_map(LayoutElement::text).collect()
}

#[test]
fn test_page_count_resolves_after_all_pages() {
    let template = small_page("paged")
        .field("amount", ValueType::Number)
        .band(band(BandKind::Detail, 20.0, field("$F{amount}", 20.0)))
        .band(band(
            BandKind::PageFooter,
            20.0,
            field(r#""Page " + $V{PAGE_NUMBER} + " of " + $V{PAGE_COUNT}"#, 20.0),
        ))
        .build()
        .unwrap();

    let model = run(&template, &amounts(20));
    assert_eq!(model.page_count(), 3);
    for (i, page) in model.pages.iter().enumerate() {
        assert_eq!(page.number, i + 1);
        assert_eq!(
            page.texts_of(BandKind::PageFooter),
            vec![format!("Page {} of 3", i + 1)]
        );
    }
    let details: Vec<usize> = model
        .pages
        .iter()
        .map(|p| p.texts_of(BandKind::Detail).len())
        .collect();
    assert_eq!(details, vec![8, 8, 4]);
}

#[test]
fn test_group_footer_precedes_next_group() {
    let mut group = Group::new("G", "$F{g}");
    group.header = Some(band(BandKind::GroupHeader, 20.0, field("$F{g}", 20.0)));
    group.footer = Some(band(
        BandKind::GroupFooter,
        20.0,
        field(r#""total " + $V{groupTotal}"#, 20.0),
    ));
    let template = TemplateBuilder::new("grouped")
        .field("g", ValueType::String)
        .field("amount", ValueType::Number)
        .group(group)
        .variable(
            Variable::new("groupTotal", ValueType::Number, Calculation::Sum, "$F{amount}")
                .with_reset(ResetScope::Group("G".into())),
        )
        .variable(Variable::new("total", ValueType::Number, Calculation::Sum, "$F{amount}"))
        .band(band(BandKind::Detail, 20.0, field("$F{amount}", 20.0)))
        .band(band(BandKind::Summary, 20.0, field("$V{total}", 20.0)))
        .build()
        .unwrap();

    let model = run(
        &template,
        r#"[{"g": "A", "amount": 1}, {"g": "A", "amount": 2}, {"g": "B", "amount": 5}]"#,
    );
    assert_eq!(model.page_count(), 1);
    assert_eq!(
        all_texts(&model.pages[0]),
        vec!["A", "1", "2", "total 3", "B", "5", "total 5", "8"]
    );
}

#[test]
fn test_nested_footers_innermost_first() {
    let mut outer = Group::new("Outer", "$F{a}");
    outer.footer = Some(band(BandKind::GroupFooter, 10.0, field(r#""outer " + $F{a}"#, 10.0)));
    let mut inner = Group::new("Inner", "$F{b}");
    inner.footer = Some(band(BandKind::GroupFooter, 10.0, field(r#""inner " + $F{b}"#, 10.0)));
    let template = TemplateBuilder::new("nested")
        .field("a", ValueType::String)
        .field("b", ValueType::String)
        .group(outer)
        .group(inner)
        .build()
        .unwrap();

    let model = run(&template, r#"[{"a": "1", "b": "x"}, {"a": "2", "b": "x"}]"#);
    let footers = model.pages[0].texts_of(BandKind::GroupFooter);
    assert_eq!(footers, vec!["inner x", "outer 1", "inner x", "outer 2"]);
}

#[test]
fn test_layout_is_deterministic() {
    let template = small_page("stable")
        .field("amount", ValueType::Number)
        .band(band(BandKind::Detail, 20.0, field("$F{amount} * 3", 20.0)))
        .band(band(BandKind::PageFooter, 20.0, field("$V{PAGE_NUMBER}", 20.0)))
        .build()
        .unwrap();
    let first = run(&template, &amounts(30));
    let second = run(&template, &amounts(30));
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_page_scoped_totals() {
    let template = small_page("totals")
        .field("amount", ValueType::Number)
        .variable(
            Variable::new("pageTotal", ValueType::Number, Calculation::Sum, "$F{amount}")
                .with_reset(ResetScope::Page),
        )
        .band(band(BandKind::Detail, 20.0, field("$F{amount}", 20.0)))
        .band(band(BandKind::PageFooter, 20.0, field("$V{pageTotal}", 20.0)))
        .build()
        .unwrap();

    let model = run(&template, &amounts(20));
    let footers: Vec<Vec<&str>> = model
        .pages
        .iter()
        .map(|p| p.texts_of(BandKind::PageFooter))
        .collect();
    assert_eq!(footers, vec![vec!["8"], vec!["8"], vec!["4"]]);
}

#[test]
fn test_no_data_band() {
    let template = TemplateBuilder::new("empty")
        .field("amount", ValueType::Number)
        .title("Title")
        .column_header("Amount", 100.0)
        .band(Band::new(BandKind::NoData, 20.0).with_element(Element::static_text(
            Rect::new(0.0, 0.0, 100.0, 20.0),
            "Nothing to report",
        )))
        .build()
        .unwrap();

    let model = run(&template, "[]");
    assert_eq!(model.page_count(), 1);
    assert_eq!(all_texts(&model.pages[0]), vec!["Title", "Nothing to report"]);
}

#[test]
fn test_start_new_page_per_group() {
    let mut group = Group::new("G", "$F{g}");
    group.start_new_page = true;
    group.header = Some(band(BandKind::GroupHeader, 20.0, field("$F{g}", 20.0)));
    let template = TemplateBuilder::new("split")
        .field("g", ValueType::String)
        .group(group)
        .band(Band::new(BandKind::Detail, 10.0))
        .build()
        .unwrap();

    let model = run(&template, r#"[{"g": "A"}, {"g": "B"}, {"g": "B"}, {"g": "C"}]"#);
    let headers: Vec<Vec<&str>> = model
        .pages
        .iter()
        .map(|p| p.texts_of(BandKind::GroupHeader))
        .collect();
    assert_eq!(headers, vec![vec!["A"], vec!["B"], vec!["C"]]);
}

#[test]
fn test_reprint_group_header_after_break() {
    let mut group = Group::new("G", "$F{g}");
    group.reprint_header_on_each_page = true;
    group.header = Some(band(BandKind::GroupHeader, 20.0, field("$F{g}", 20.0)));
    let template = small_page("reprint")
        .field("g", ValueType::String)
        .group(group)
        .band(band(BandKind::Detail, 20.0, field("$F{g}", 20.0)))
        .build()
        .unwrap();

    let rows: Vec<&str> = (0..12).map(|_| r#"{"g": "A"}"#).collect();
    let model = run(&template, &format!("[{}]", rows.join(",")));
    assert_eq!(model.page_count(), 2);
    let first = &model.pages[1].elements[0];
    assert_eq!(first.band, BandKind::GroupHeader);
    assert_eq!(first.rect.y, 10.0);
    assert_eq!(model.pages[1].texts_of(BandKind::Detail).len(), 4);
}

#[test]
fn test_band_taller_than_page() {
    let template = small_page("tall")
        .field("amount", ValueType::Number)
        .band(band(BandKind::Detail, 500.0, field("$F{amount}", 20.0)))
        .build()
        .unwrap();
    assert!(matches!(
        try_run(&template, &amounts(1)),
        Err(LayoutError::BandTooTall { band: "detail", .. })
    ));
}

#[test]
fn test_report_time_evaluation_and_last_page_footer() {
    let mut grand_total = TextField::new(r#""Total: " + $V{total}"#);
    grand_total.evaluation_time = EvaluationTime::Report;
    let template = small_page("report-time")
        .field("amount", ValueType::Number)
        .variable(Variable::new("total", ValueType::Number, Calculation::Sum, "$F{amount}"))
        .band(band(
            BandKind::Title,
            20.0,
            Element::text_field(Rect::new(0.0, 0.0, 100.0, 20.0), grand_total),
        ))
        .band(band(BandKind::Detail, 20.0, field("$F{amount}", 20.0)))
        .band(Band::new(BandKind::PageFooter, 20.0).with_element(Element::static_text(
            Rect::new(0.0, 0.0, 100.0, 20.0),
            "continued",
        )))
        .band(Band::new(BandKind::LastPageFooter, 20.0).with_element(Element::static_text(
            Rect::new(0.0, 0.0, 100.0, 20.0),
            "end",
        )))
        .build()
        .unwrap();

    let model = run(&template, &amounts(20));
    assert_eq!(model.pages[0].texts_of(BandKind::Title), vec!["Total: 20"]);
    let last = model.page_count() - 1;
    for (i, page) in model.pages.iter().enumerate() {
        let expected = if i == last { "end" } else { "continued" };
        let footer: Vec<&str> = page
            .elements
            .iter()
            .filter(|e| matches!(e.band, BandKind::PageFooter | BandKind::LastPageFooter))
            .filter_map(LayoutElement::text)
            .collect();
        assert_eq!(footer, vec![expected]);
        assert_eq!(
            page.elements.last().map(|e| e.rect.y),
            Some(170.0),
            "footers sit on the bottom margin"
        );
    }
}

#[test]
fn test_null_rendering_and_positions() {
    let mut blank = TextField::new("$F{name}");
    blank.blank_when_null = true;
    let template = TemplateBuilder::new("nulls")
        .margins(10.0, 10.0, 10.0, 10.0)
        .field("name", ValueType::String)
        .band(
            Band::new(BandKind::Detail, 20.0)
                .with_element(Element::text_field(
                    Rect::new(5.0, 2.0, 100.0, 16.0),
                    TextField::new("$F{name}"),
                ))
                .with_element(Element::text_field(Rect::new(110.0, 2.0, 100.0, 16.0), blank)),
        )
        .band(Band::new(BandKind::ColumnFooter, 10.0).with_element(Element::static_text(
            Rect::new(0.0, 0.0, 100.0, 10.0),
            "cf",
        )))
        .build()
        .unwrap();

    let model = run(&template, r#"[{"name": null}, {"name": "x"}]"#);
    let page = &model.pages[0];
    assert_eq!(page.texts_of(BandKind::Detail), vec!["null", "", "x", "x"]);
    assert_eq!(page.elements[0].rect, Rect::new(15.0, 12.0, 100.0, 16.0));
    let column_footer = page
        .elements
        .iter()
        .find(|e| e.band == BandKind::ColumnFooter)
        .unwrap();
    assert_eq!(column_footer.rect.y, 50.0);
}

fn band_texts(page: &LayoutPage) -> Vec<(BandKind, &str)> {
    page.elements
        .iter()
        .filter_map(|e| e.text().map(|t| (e.band, t)))
        .collect()
}

fn reprinting_group(name: &str, key: &str, footer: &str) -> Group {
    let mut group = Group::new(name, format!("$F{{{}}}", key));
    group.reprint_header_on_each_page = true;
    group.header = Some(band(BandKind::GroupHeader, 20.0, field(&format!("$F{{{}}}", key), 20.0)));
    group.footer = Some(band(BandKind::GroupFooter, 20.0, field(footer, 20.0)));
    group
}

fn rows_of(row: &str, count: usize) -> Vec<&str> {
    (0..count).map(|_| row).collect()
}

fn page_rows_template(name: &str) -> Template {
    small_page(name)
        .field("g", ValueType::String)
        .group(reprinting_group("G", "g", r#""end " + $F{g} + " " + $V{pageRows}"#))
        .variable(
            Variable::new("pageRows", ValueType::Number, Calculation::Count, "$F{g}")
                .with_reset(ResetScope::Page),
        )
        .band(band(BandKind::Detail, 20.0, field("$F{g}", 20.0)))
        .band(band(BandKind::Summary, 20.0, field(r#""page rows " + $V{pageRows}"#, 20.0)))
        .build()
        .unwrap()
}

#[test]
fn test_closing_footer_breaks_page() {
    let template = page_rows_template("closing-break");
    let mut rows = rows_of(r#"{"g": "A"}"#, 8);
    rows.push(r#"{"g": "B"}"#);
    let model = run(&template, &format!("[{}]", rows.join(",")));

    assert_eq!(model.page_count(), 2);
    assert_eq!(model.pages[0].texts_of(BandKind::GroupFooter), Vec::<&str>::new());
    assert_eq!(
        band_texts(&model.pages[1]),
        vec![
            (BandKind::GroupHeader, "A"),
            (BandKind::GroupFooter, "end A 8"),
            (BandKind::GroupHeader, "B"),
            (BandKind::Detail, "B"),
            (BandKind::GroupFooter, "end B 1"),
            (BandKind::Summary, "page rows 1"),
        ]
    );
}

#[test]
fn test_trailing_footer_breaks_page() {
    let template = page_rows_template("trailing-break");
    let rows = rows_of(r#"{"g": "A"}"#, 8);
    let model = run(&template, &format!("[{}]", rows.join(",")));

    assert_eq!(model.page_count(), 2);
    assert_eq!(model.pages[0].texts_of(BandKind::Detail).len(), 8);
    assert_eq!(
        band_texts(&model.pages[1]),
        vec![
            (BandKind::GroupHeader, "A"),
            (BandKind::GroupFooter, "end A 8"),
            (BandKind::Summary, "page rows 0"),
        ]
    );
}

#[test]
fn test_closed_inner_group_is_not_reprinted() {
    let template = small_page("nested-break")
        .field("a", ValueType::String)
        .field("b", ValueType::String)
        .group(reprinting_group("Outer", "a", r#""outer " + $F{a}"#))
        .group(reprinting_group("Inner", "b", r#""inner " + $F{b}"#))
        .band(band(BandKind::Detail, 20.0, field("$F{b}", 20.0)))
        .build()
        .unwrap();
    let mut rows = rows_of(r#"{"a": "1", "b": "x"}"#, 6);
    rows.push(r#"{"a": "2", "b": "y"}"#);
    let model = run(&template, &format!("[{}]", rows.join(",")));

    assert_eq!(model.page_count(), 2);
    assert_eq!(model.pages[0].texts_of(BandKind::GroupFooter), vec!["inner x"]);
    assert_eq!(
        band_texts(&model.pages[1]),
        vec![
            (BandKind::GroupHeader, "1"),
            (BandKind::GroupFooter, "outer 1"),
            (BandKind::GroupHeader, "2"),
            (BandKind::GroupHeader, "y"),
            (BandKind::Detail, "y"),
            (BandKind::GroupFooter, "inner y"),
            (BandKind::GroupFooter, "outer 2"),
        ]
    );
}

#[test]
fn test_print_when_skips_bands_and_elements() {
    let detail = band(BandKind::Detail, 20.0, field("$F{amount}", 20.0))
        .with_element(
            Element::static_text(Rect::new(100.0, 0.0, 50.0, 20.0), "big")
                .with_print_when("$F{amount} > 2"),
        )
        .with_print_when("$F{amount} > 1");
    let template = small_page("conditional")
        .field("amount", ValueType::Number)
        .band(detail)
        .band(
            Band::new(BandKind::PageFooter, 20.0)
                .with_element(Element::static_text(Rect::new(0.0, 0.0, 100.0, 20.0), "more"))
                .with_print_when("$V{PAGE_NUMBER} > 1"),
        )
        .build()
        .unwrap();

    let model = run(&template, r#"[{"amount": 1}, {"amount": 2}, {"amount": 3}, {"amount": null}]"#);
    assert_eq!(model.page_count(), 1);
    let page = &model.pages[0];
    assert_eq!(page.texts_of(BandKind::Detail), vec!["2", "3", "big"]);
    let ys: Vec<f32> = page.elements.iter().map(|e| e.rect.y).collect();
    assert_eq!(ys, vec![10.0, 30.0, 30.0], "skipped bands take no space");
    assert!(page.texts_of(BandKind::PageFooter).is_empty());
}
