//! The banded pagination state machine.
//!
//! Bands flow down the page from the top margin. Before a flowing band is
//! placed it is checked against the flow limit, which keeps room for the
//! column footer and the page footer. A band that does not fit closes the
//! page and is retried on the next one. Text that depends on the final page
//! count, or that is evaluated at report time, is left blank and filled in
//! once every page exists.

use crate::LayoutError;
use crate::algorithms::pagination::check_band_fit;
use crate::model::{LayoutContent, LayoutElement, LayoutModel, LayoutPage};
use banded_data::{RowContext, RowResult, RowStream};
use banded_expr::{Builtin, Builtins, evaluate, evaluate_as_bool};
use banded_template::{Band, ElementKind, EvaluationTime, Expr, Template, TextField};
use banded_types::{GroupId, Size, Value};
use std::sync::Arc;

/// Which context a band is evaluated against.
enum BandContext {
    /// The row currently being laid out, as refreshed by page starts.
    Row,
    Fixed(Arc<RowContext>),
}

struct Deferred<'t> {
    page: usize,
    element: usize,
    field: &'t TextField,
    context: Arc<RowContext>,
    page_number: usize,
}

pub struct Paginator<'t, R: RowStream> {
    template: &'t Template,
    rows: R,
    pages: Vec<LayoutPage>,
    page: LayoutPage,
    cursor_y: f32,
    /// Anything below the page and column headers, the title included.
    has_content: bool,
    /// A group, detail or summary band has been placed on this page.
    body_placed: bool,
    /// The current row's detail band is still to be placed.
    detail_pending: bool,
    /// Number of outer groups whose header has printed and which are still open.
    open_depth: usize,
    row_context: Arc<RowContext>,
    last_context: Arc<RowContext>,
    /// Context of the groups whose footers are being placed. Headers
    /// reprinted meanwhile show the closing group, not the incoming row.
    footer_context: Option<Arc<RowContext>>,
    deferred: Vec<Deferred<'t>>,
}

/// Lays out every row of `rows` against `template`.
pub fn layout<R: RowStream>(template: &Template, rows: R) -> Result<LayoutModel, LayoutError> {
    Paginator::new(template, rows).run()
}

impl<'t, R: RowStream> Paginator<'t, R> {
    pub fn new(template: &'t Template, rows: R) -> Self {
        let initial = rows.initial_context();
        Self {
            template,
            rows,
            pages: Vec::new(),
            page: LayoutPage::new(1),
            cursor_y: template.page.margins.top,
            has_content: false,
            body_placed: false,
            detail_pending: false,
            open_depth: 0,
            row_context: Arc::clone(&initial),
            last_context: initial,
            footer_context: None,
            deferred: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<LayoutModel, LayoutError> {
        let Some(first) = self.rows.next().transpose()? else {
            return self.run_empty();
        };
        self.row_context = Arc::clone(&first.context);
        self.last_context = Arc::clone(&first.context);
        self.open_page(true, true)?;
        self.handle_row(first)?;
        while let Some(row) = self.rows.next() {
            self.handle_row(row?)?;
        }
        self.finish()
    }

    fn run_empty(mut self) -> Result<LayoutModel, LayoutError> {
        log::debug!("Report '{}' has no rows", self.template.name);
        self.open_page(true, false)?;
        if let Some(no_data) = &self.template.bands.no_data {
            self.place_band(no_data, BandContext::Row, true)?;
        }
        self.finish()
    }

    fn handle_row(&mut self, row: RowResult) -> Result<(), LayoutError> {
        let template = self.template;
        self.row_context = Arc::clone(&row.context);
        self.detail_pending = true;

        if !row.closed_groups.is_empty() {
            let closing = row.closing.clone().unwrap_or_else(|| Arc::clone(&row.context));
            self.place_group_footers(&row.closed_groups, &closing)?;
        }

        for id in &row.opened_groups {
            let group = &template.groups[id.index()];
            if group.start_new_page && self.body_placed {
                self.break_page()?;
            }
            if let Some(header) = &group.header {
                self.place_band(header, BandContext::Row, true)?;
            }
            self.open_depth = id.index() + 1;
        }

        if let Some(detail) = &template.bands.detail {
            self.place_band(detail, BandContext::Row, true)?;
        }
        self.detail_pending = false;

        if row.is_last {
            let context = Arc::clone(&self.row_context);
            self.place_group_footers(&row.trailing_closed_groups, &context)?;
            if let Some(summary) = &template.bands.summary {
                self.place_band(summary, BandContext::Row, true)?;
            }
        }
        Ok(())
    }

    /// Footers print innermost first. A group stays open, and keeps its
    /// header reprintable, until its own footer is placed.
    fn place_group_footers(
        &mut self,
        groups: &[GroupId],
        context: &Arc<RowContext>,
    ) -> Result<(), LayoutError> {
        let template = self.template;
        self.footer_context = Some(Arc::clone(context));
        for id in groups.iter().rev() {
            self.open_depth = self.open_depth.min(id.index() + 1);
            if let Some(footer) = &template.groups[id.index()].footer {
                self.place_band(footer, BandContext::Fixed(Arc::clone(context)), true)?;
            }
            self.open_depth = self.open_depth.min(id.index());
        }
        self.footer_context = None;
        Ok(())
    }

    fn flow_limit(&self) -> f32 {
        let page = &self.template.page;
        let bands = &self.template.bands;
        let footer = bands
            .page_footer
            .iter()
            .chain(&bands.last_page_footer)
            .map(|b| b.height)
            .fold(0.0, f32::max);
        let column_footer = bands.column_footer.as_ref().map_or(0.0, |b| b.height);
        page.height - page.margins.bottom - footer - column_footer
    }

    fn too_tall(&self, band: &Band, available: f32) -> LayoutError {
        LayoutError::BandTooTall {
            band: band.kind.name(),
            height: band.height,
            available,
        }
    }

    fn place_band(
        &mut self,
        band: &'t Band,
        context: BandContext,
        body: bool,
    ) -> Result<(), LayoutError> {
        let printed = match &context {
            BandContext::Row => self.prints(band.print_when.as_ref(), &self.row_context)?,
            BandContext::Fixed(context) => self.prints(band.print_when.as_ref(), context)?,
        };
        if !printed {
            return Ok(());
        }
        let analysis = check_band_fit(self.cursor_y, band.height, self.flow_limit());
        if analysis.should_break {
            if !self.has_content {
                return Err(self.too_tall(band, analysis.remaining_height));
            }
            self.break_page()?;
            let retry = check_band_fit(self.cursor_y, band.height, self.flow_limit());
            if retry.should_break {
                return Err(self.too_tall(band, retry.remaining_height));
            }
        }

        let context = match context {
            BandContext::Row => Arc::clone(&self.row_context),
            BandContext::Fixed(context) => context,
        };
        self.emit_band(band, &context, self.cursor_y)?;
        self.cursor_y += band.height;
        self.has_content = true;
        self.body_placed |= body;
        self.last_context = context;
        Ok(())
    }

    /// Starts a page: title (first page only), page header, column header and
    /// any reprinted group headers.
    fn open_page(&mut self, first: bool, column_header: bool) -> Result<(), LayoutError> {
        let template = self.template;
        self.cursor_y = template.page.margins.top;
        self.has_content = false;
        self.body_placed = false;

        if let Some(title) = template.bands.title.as_ref().filter(|_| first) {
            let context = Arc::clone(&self.row_context);
            if self.prints(title.print_when.as_ref(), &context)? {
                let analysis = check_band_fit(self.cursor_y, title.height, self.flow_limit());
                if analysis.should_break {
                    return Err(self.too_tall(title, analysis.remaining_height));
                }
                self.emit_band(title, &context, self.cursor_y)?;
                self.cursor_y += title.height;
                self.has_content = true;
            }
        }

        let headers = [
            template.bands.page_header.as_ref(),
            template.bands.column_header.as_ref().filter(|_| column_header),
        ];
        for band in headers.into_iter().flatten() {
            let context = Arc::clone(&self.row_context);
            if !self.prints(band.print_when.as_ref(), &context)? {
                continue;
            }
            self.emit_band(band, &context, self.cursor_y)?;
            self.cursor_y += band.height;
            self.last_context = context;
        }

        for group in &template.groups[..self.open_depth] {
            if let Some(header) = group.header.as_ref().filter(|_| group.reprint_header_on_each_page) {
                let context = match &self.footer_context {
                    Some(closing) => BandContext::Fixed(Arc::clone(closing)),
                    None => BandContext::Row,
                };
                self.place_band(header, context, false)?;
            }
        }
        Ok(())
    }

    fn close_page(&mut self, last: bool) -> Result<(), LayoutError> {
        let template = self.template;
        let context = Arc::clone(&self.last_context);

        if let Some(column_footer) = &template.bands.column_footer {
            if self.prints(column_footer.print_when.as_ref(), &context)? {
                self.emit_band(column_footer, &context, self.cursor_y)?;
            }
        }

        let footer = if last {
            template
                .bands
                .last_page_footer
                .as_ref()
                .or(template.bands.page_footer.as_ref())
        } else {
            template.bands.page_footer.as_ref()
        };
        if let Some(footer) = footer {
            if self.prints(footer.print_when.as_ref(), &context)? {
                let y = template.page.height - template.page.margins.bottom - footer.height;
                self.emit_band(footer, &context, y)?;
            }
        }

        let next = LayoutPage::new(self.page.number + 1);
        let page = std::mem::replace(&mut self.page, next);
        self.pages.push(page);
        Ok(())
    }

    fn break_page(&mut self) -> Result<(), LayoutError> {
        self.close_page(false)?;
        let number = self.page.number;
        log::trace!("Page break: starting page {} (row {})", number, self.row_context.row_count);
        if let Some(context) = self.rows.begin_page(number, self.detail_pending)? {
            self.row_context = context;
        }
        self.open_page(false, true)
    }

    /// Whether a print-when condition holds on the current page. No condition always prints.
    fn prints(&self, condition: Option<&Expr>, context: &RowContext) -> Result<bool, LayoutError> {
        let Some(condition) = condition else {
            return Ok(true);
        };
        let builtins = Builtins {
            page_number: self.page.number,
            page_count: None,
            column_number: 1,
            row_count: 0,
        };
        let ctx = context.evaluation_context(self.rows.parameters(), builtins);
        Ok(evaluate_as_bool(condition.compiled()?, &ctx)?)
    }

    fn emit_band(
        &mut self,
        band: &'t Band,
        context: &Arc<RowContext>,
        y: f32,
    ) -> Result<(), LayoutError> {
        let margins = self.template.page.margins;
        let builtins = Builtins {
            page_number: self.page.number,
            page_count: None,
            column_number: 1,
            row_count: 0,
        };
        let ctx = context.evaluation_context(self.rows.parameters(), builtins);

        for element in &band.elements {
            if let Some(condition) = &element.print_when {
                if !evaluate_as_bool(condition.compiled()?, &ctx)? {
                    continue;
                }
            }
            let content = match &element.kind {
                ElementKind::StaticText { text } => LayoutContent::Text { text: text.clone() },
                ElementKind::TextField(field) => {
                    let expression = field.expression.compiled()?;
                    if field.evaluation_time == EvaluationTime::Report
                        || expression.references_builtin(Builtin::PageCount)
                    {
                        self.deferred.push(Deferred {
                            page: self.pages.len(),
                            element: self.page.elements.len(),
                            field,
                            context: Arc::clone(context),
                            page_number: self.page.number,
                        });
                        LayoutContent::Text {
                            text: String::new(),
                        }
                    } else {
                        let value = evaluate(expression, &ctx)?;
                        LayoutContent::Text {
                            text: render_text(field, &value),
                        }
                    }
                }
                ElementKind::Image { expression } => {
                    let source = match expression {
                        Some(expr) => match evaluate(expr.compiled()?, &ctx)? {
                            Value::Null => String::new(),
                            value => value.to_string(),
                        },
                        None => String::new(),
                    };
                    LayoutContent::Image { source }
                }
                ElementKind::Line => LayoutContent::Line,
                ElementKind::Rectangle => LayoutContent::Rectangle,
            };
            self.page.elements.push(LayoutElement {
                rect: element.rect.translate(margins.left, y),
                content,
                style: element.style.clone(),
                band: band.kind,
            });
        }
        Ok(())
    }

    fn finish(mut self) -> Result<LayoutModel, LayoutError> {
        self.close_page(true)?;
        let page_count = self.pages.len();
        let parameters = self.rows.parameters();

        for deferred in &self.deferred {
            let (context, page_number) = match deferred.field.evaluation_time {
                EvaluationTime::Report => (&self.row_context, page_count),
                EvaluationTime::Now => (&deferred.context, deferred.page_number),
            };
            let builtins = Builtins {
                page_number,
                page_count: Some(page_count),
                column_number: 1,
                row_count: 0,
            };
            let value = evaluate(
                deferred.field.expression.compiled()?,
                &context.evaluation_context(parameters, builtins),
            )?;
            if let Some(element) = self.pages[deferred.page].elements.get_mut(deferred.element) {
                element.content = LayoutContent::Text {
                    text: render_text(deferred.field, &value),
                };
            }
        }

        log::debug!(
            "Laid out report '{}': {} page(s), {} deferred element(s)",
            self.template.name,
            page_count,
            self.deferred.len()
        );
        let page = &self.template.page;
        Ok(LayoutModel {
            name: self.template.name.clone(),
            page_size: Size::new(page.width, page.height),
            pages: self.pages,
        })
    }
}

/// Formats a text field's value; null prints as `null` unless the field is blank-when-null.
pub fn render_text(field: &TextField, value: &Value) -> String {
    match value {
        Value::Null if field.blank_when_null => String::new(),
        Value::Null => value.to_string(),
        other => field.format.apply(other),
    }
}
