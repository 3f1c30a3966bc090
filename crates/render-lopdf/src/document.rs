use banded_layout::{LayoutContent, LayoutElement};
use banded_render_core::utils::{estimate_text_width, flip_y, standard_font_name};
use banded_render_core::{DocumentAccumulator, DrawingCollaborator, RenderError};
use banded_template::{ElementStyle, HorizontalAlign, VerticalAlign};
use banded_types::{Color, Rect, Size};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

const LINE_HEIGHT: f32 = 1.2;

/// Registers as the PDF collaborator; every render gets a fresh [`LopdfDocument`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCollaborator;

impl DrawingCollaborator for LopdfCollaborator {
    fn begin_document(&self, page_size: Size) -> Result<Box<dyn DocumentAccumulator>, RenderError> {
        Ok(Box::new(LopdfDocument::new(page_size)))
    }
}

fn pdf_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Collaborator(format!("PDF generation error: {}", err))
}

/// An in-memory PDF built with `lopdf`. It collects the object graph page
/// by page and serializes it on [`finalize`](DocumentAccumulator::finalize).
pub struct LopdfDocument {
    document: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page_size: Size,
    /// Base font name and its resource name (`F1`, `F2`, ...), in first-use order.
    fonts: Vec<(&'static str, String)>,
    content: Option<Content>,
    state: PageRenderState,
}

#[derive(Default, Clone)]
struct PageRenderState {
    font_name: String,
    font_size: f32,
    fill_color: Option<Color>,
}

impl LopdfDocument {
    pub fn new(page_size: Size) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        let resources_id = document.new_object_id();
        Self {
            document,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            page_size,
            fonts: Vec::new(),
            content: None,
            state: PageRenderState::default(),
        }
    }

    fn font_resource(&mut self, base_font: &'static str) -> String {
        if let Some((_, resource)) = self.fonts.iter().find(|(name, _)| *name == base_font) {
            return resource.clone();
        }
        let resource = format!("F{}", self.fonts.len() + 1);
        self.fonts.push((base_font, resource.clone()));
        resource
    }

    fn ops(&mut self) -> Result<&mut Vec<Operation>, RenderError> {
        self.content
            .as_mut()
            .map(|c| &mut c.operations)
            .ok_or_else(|| RenderError::Collaborator("Page was never started with begin_page".into()))
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) -> Result<(), RenderError> {
        self.ops()?.push(Operation::new(operator, operands));
        Ok(())
    }

    fn set_fill_color(&mut self, color: Color) -> Result<(), RenderError> {
        if self.state.fill_color != Some(color) {
            let [r, g, b] = color.to_unit_rgb();
            self.push("rg", vec![r.into(), g.into(), b.into()])?;
            self.state.fill_color = Some(color);
        }
        Ok(())
    }

    fn set_stroke_color(&mut self, color: Color) -> Result<(), RenderError> {
        let [r, g, b] = color.to_unit_rgb();
        self.push("w", vec![1.0f32.into()])?;
        self.push("RG", vec![r.into(), g.into(), b.into()])
    }

    fn set_font(&mut self, style: &ElementStyle) -> Result<(), RenderError> {
        let base_font = standard_font_name(style.font_name.as_deref(), style.bold, style.italic);
        let resource = self.font_resource(base_font);
        if self.state.font_name != resource || self.state.font_size != style.font_size {
            self.push("Tf", vec![resource.as_str().into(), style.font_size.into()])?;
            self.state.font_name = resource;
            self.state.font_size = style.font_size;
        }
        Ok(())
    }

    /// The rectangle in PDF coordinates: lower-left corner, width, height.
    fn pdf_rect(&self, rect: Rect) -> Vec<Object> {
        let y = flip_y(rect.bottom(), self.page_size.height);
        vec![rect.x.into(), y.into(), rect.width.into(), rect.height.into()]
    }

    fn draw_background(&mut self, element: &LayoutElement) -> Result<(), RenderError> {
        let style = &element.style;
        if let Some(back) = style.backcolor.filter(|_| style.opaque) {
            self.set_fill_color(back)?;
            let rect = self.pdf_rect(element.rect);
            self.push("re", rect)?;
            self.push("f", vec![])?;
        }
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) -> Result<(), RenderError> {
        self.set_stroke_color(color)?;
        let operands = self.pdf_rect(rect);
        self.push("re", operands)?;
        self.push("S", vec![])
    }

    fn draw_line(&mut self, rect: Rect, color: Color) -> Result<(), RenderError> {
        let height = self.page_size.height;
        self.set_stroke_color(color)?;
        self.push("m", vec![rect.x.into(), flip_y(rect.y, height).into()])?;
        self.push("l", vec![rect.right().into(), flip_y(rect.bottom(), height).into()])?;
        self.push("S", vec![])
    }

    fn draw_text(&mut self, text: &str, element: &LayoutElement) -> Result<(), RenderError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let style = &element.style;
        let rect = element.rect;
        let color = style.forecolor.unwrap_or(Color::BLACK);
        let font_size = style.font_size;
        let lines: Vec<&str> = text.lines().collect();
        let block_height = font_size * LINE_HEIGHT * lines.len() as f32;

        let top = match style.vertical_align {
            VerticalAlign::Top => rect.y,
            VerticalAlign::Middle => rect.y + (rect.height - block_height).max(0.0) / 2.0,
            VerticalAlign::Bottom => rect.y + (rect.height - block_height).max(0.0),
        };

        for (i, line) in lines.into_iter().enumerate() {
            let width = estimate_text_width(line, font_size);
            let x = match style.align {
                HorizontalAlign::Left | HorizontalAlign::Justified => rect.x,
                HorizontalAlign::Center => rect.x + (rect.width - width) / 2.0,
                HorizontalAlign::Right => rect.right() - width,
            }
            .max(rect.x);
            let baseline_y = top + i as f32 * font_size * LINE_HEIGHT + font_size * 0.8;
            let pdf_y = flip_y(baseline_y, self.page_size.height);

            self.push("BT", vec![])?;
            self.set_font(style)?;
            self.set_fill_color(color)?;
            self.push("Td", vec![x.into(), pdf_y.into()])?;
            self.push("Tj", vec![Object::string_literal(encode_win_ansi(line))])?;
            self.push("ET", vec![])?;

            if style.underline {
                let underline_y = pdf_y - font_size * 0.12;
                self.set_stroke_color(color)?;
                self.push("m", vec![x.into(), underline_y.into()])?;
                self.push("l", vec![(x + width).into(), underline_y.into()])?;
                self.push("S", vec![])?;
            }
        }
        Ok(())
    }
}

impl DocumentAccumulator for LopdfDocument {
    fn begin_page(&mut self, _number: usize) -> Result<(), RenderError> {
        self.content = Some(Content { operations: vec![] });
        self.state = PageRenderState::default();
        Ok(())
    }

    fn draw(&mut self, element: &LayoutElement) -> Result<(), RenderError> {
        self.draw_background(element)?;
        let color = element.style.forecolor.unwrap_or(Color::BLACK);
        match &element.content {
            LayoutContent::Text { text } => self.draw_text(text, element),
            LayoutContent::Image { source } => {
                log::warn!("Images are not supported by the PDF collaborator yet: {}", source);
                self.stroke_rect(element.rect, Color::gray(160))
            }
            LayoutContent::Line => self.draw_line(element.rect, color),
            LayoutContent::Rectangle => self.stroke_rect(element.rect, color),
        }
    }

    fn end_page(&mut self) -> Result<(), RenderError> {
        let content = self
            .content
            .take()
            .ok_or_else(|| RenderError::Collaborator("Page was never started with begin_page".into()))?;
        let mut stream = Stream::new(Dictionary::new(), content.encode().map_err(pdf_error)?);
        stream.compress().map_err(pdf_error)?;
        let content_id = self.document.add_object(stream);

        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), self.page_size.width.into(), self.page_size.height.into()],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        };
        let page_id = self.document.add_object(page_dict);
        self.page_ids.push(page_id);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>, RenderError> {
        let mut pdf = *self;

        let mut font_dict = Dictionary::new();
        for (base_font, resource) in &pdf.fonts {
            let font_id = pdf.document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => *base_font,
                "Encoding" => "WinAnsiEncoding",
            });
            font_dict.set(resource.as_bytes(), font_id);
        }
        pdf.document.objects.insert(
            pdf.resources_id,
            Object::Dictionary(dictionary! { "Font" => font_dict }),
        );

        let kids: Vec<Object> = pdf.page_ids.iter().map(|id| Object::from(*id)).collect();
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pdf.page_ids.len() as i64,
        };
        pdf.document
            .objects
            .insert(pdf.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = pdf
            .document
            .add_object(dictionary! { "Type" => "Catalog", "Pages" => pdf.pages_id });
        pdf.document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        pdf.document.save_to(&mut bytes).map_err(pdf_error)?;
        Ok(bytes)
    }
}

/// Maps text onto the WinAnsi code page used by the standard fonts.
/// Characters outside it become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}
