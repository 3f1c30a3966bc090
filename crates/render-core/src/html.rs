//! The built-in HTML writer.
//!
//! Every page becomes a fixed-size `div` and every element an absolutely
//! positioned child, so the output matches the paginated layout exactly.

use banded_layout::{LayoutContent, LayoutElement, LayoutModel, LayoutPage};
use banded_template::{ElementStyle, HorizontalAlign, VerticalAlign};
use std::fmt::Write;

const STYLESHEET: &str = "\
body { background: #e0e0e0; margin: 0; }
.page { position: relative; background: #ffffff; margin: 16px auto; overflow: hidden; }
.el { position: absolute; box-sizing: border-box; overflow: hidden; white-space: pre; \
font-family: Helvetica, Arial, sans-serif; display: flex; flex-direction: column; }
";

pub fn render_html(model: &LayoutModel) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape(&model.name));
    let _ = writeln!(out, "<style>\n{}</style>\n</head>\n<body>", STYLESHEET);
    for page in &model.pages {
        write_page(&mut out, page, model);
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn write_page(out: &mut String, page: &LayoutPage, model: &LayoutModel) {
    let _ = writeln!(
        out,
        "<div class=\"page\" data-page=\"{}\" style=\"width: {}pt; height: {}pt;\">",
        page.number, model.page_size.width, model.page_size.height
    );
    for element in &page.elements {
        write_element(out, element);
    }
    out.push_str("</div>\n");
}

fn write_element(out: &mut String, element: &LayoutElement) {
    let rect = element.rect;
    let mut css = format!(
        "left: {}pt; top: {}pt; width: {}pt; height: {}pt;",
        rect.x, rect.y, rect.width, rect.height
    );
    let style = &element.style;
    let color = style
        .forecolor
        .map(|c| c.to_string())
        .unwrap_or_else(|| "#000000".to_string());
    if let Some(back) = style.backcolor.filter(|_| style.opaque) {
        let _ = write!(css, " background: {};", back);
    }

    let body = match &element.content {
        LayoutContent::Text { text } => {
            text_css(&mut css, style, &color);
            escape(text)
        }
        LayoutContent::Image { source } => {
            if source.is_empty() {
                String::new()
            } else {
                format!(
                    "<img src=\"{}\" style=\"width: 100%; height: 100%; object-fit: contain;\">",
                    escape(source)
                )
            }
        }
        LayoutContent::Line => {
            let edge = if rect.width == 0.0 { "left" } else { "top" };
            let _ = write!(css, " border-{}: 1px solid {};", edge, color);
            String::new()
        }
        LayoutContent::Rectangle => {
            let _ = write!(css, " border: 1px solid {};", color);
            String::new()
        }
    };

    let _ = writeln!(
        out,
        "<div class=\"el\" data-band=\"{}\" style=\"{}\">{}</div>",
        element.band.name(),
        css,
        body
    );
}

fn text_css(css: &mut String, style: &ElementStyle, color: &str) {
    let _ = write!(css, " color: {}; font-size: {}pt;", color, style.font_size);
    if style.bold {
        css.push_str(" font-weight: bold;");
    }
    if style.italic {
        css.push_str(" font-style: italic;");
    }
    if style.underline {
        css.push_str(" text-decoration: underline;");
    }
    let align = match style.align {
        HorizontalAlign::Left => "left",
        HorizontalAlign::Center => "center",
        HorizontalAlign::Right => "right",
        HorizontalAlign::Justified => "justify",
    };
    let justify = match style.vertical_align {
        VerticalAlign::Top => "flex-start",
        VerticalAlign::Middle => "center",
        VerticalAlign::Bottom => "flex-end",
    };
    let _ = write!(css, " text-align: {}; justify-content: {};", align, justify);
    if let Some(font) = &style.font_name {
        let _ = write!(css, " font-family: '{}';", escape(font));
    }
}

/// Escapes text for use in element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
