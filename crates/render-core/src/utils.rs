/// Standard PDF base font for a template font name with style suffix.
///
/// Only the standard 14 families are available without embedding; anything
/// not recognised falls back to Helvetica.
pub fn standard_font_name(font_name: Option<&str>, bold: bool, italic: bool) -> &'static str {
    let family = font_name.unwrap_or("").to_ascii_lowercase();
    if family.contains("times") || (family.contains("serif") && !family.contains("sans")) {
        match (bold, italic) {
            (false, false) => "Times-Roman",
            (true, false) => "Times-Bold",
            (false, true) => "Times-Italic",
            (true, true) => "Times-BoldItalic",
        }
    } else if family.contains("courier") || family.contains("mono") {
        match (bold, italic) {
            (false, false) => "Courier",
            (true, false) => "Courier-Bold",
            (false, true) => "Courier-Oblique",
            (true, true) => "Courier-BoldOblique",
        }
    } else {
        match (bold, italic) {
            (false, false) => "Helvetica",
            (true, false) => "Helvetica-Bold",
            (false, true) => "Helvetica-Oblique",
            (true, true) => "Helvetica-BoldOblique",
        }
    }
}

/// Convert layout Y coordinate to PDF Y coordinate (flip origin)
pub fn flip_y(y: f32, page_height: f32) -> f32 {
    page_height - y
}

/// Rough advance width of `text` at `font_size`, for alignment without font metrics.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}
