//! The row-by-row processing loop.
//!
//! A [`Processor`] pulls rows from a [`RowSource`], binds them to the
//! template's fields, detects group transitions and folds every variable. It
//! yields one [`RowResult`] per row and is finite and single pass.

use crate::aggregate::Accumulator;
use crate::binding::bind_row;
use crate::error::DataError;
use banded_expr::{Builtins, EvaluationContext, evaluate};
use banded_source::RowSource;
use banded_template::{Calculation, ResetScope, Template};
use banded_types::{GroupId, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// Resolved values at one point of the row cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct RowContext {
    pub fields: Vec<Value>,
    pub variables: Vec<Value>,
    /// Rows processed so far, including this one.
    pub row_count: usize,
}

impl RowContext {
    pub fn evaluation_context<'a>(
        &'a self,
        parameters: &'a [Value],
        mut builtins: Builtins,
    ) -> EvaluationContext<'a> {
        builtins.row_count = self.row_count;
        EvaluationContext::new(&self.fields, &self.variables, parameters, builtins)
    }
}

/// Everything the layout engine needs to know about one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowResult {
    /// Position in processing (sorted) order.
    pub index: usize,
    pub context: Arc<RowContext>,
    /// Groups whose header prints before this row, outermost first.
    pub opened_groups: Vec<GroupId>,
    /// Groups whose footer prints before this row, outermost first.
    pub closed_groups: Vec<GroupId>,
    /// The previous row's context, captured before any group reset. Present
    /// whenever `closed_groups` is not empty.
    pub closing: Option<Arc<RowContext>>,
    /// On the last row, every group closed by the end of data, outermost first.
    pub trailing_closed_groups: Vec<GroupId>,
    pub is_last: bool,
}

/// A stream of processed rows that the layout engine can notify about page starts.
pub trait RowStream: Iterator<Item = Result<RowResult, DataError>> {
    fn parameters(&self) -> &[Value];

    /// The context seen before any row: null fields, initial variable values.
    fn initial_context(&self) -> Arc<RowContext>;

    /// Signals the start of a page. Page- and column-scoped variables are reset;
    /// with `refold_current` the most recent row is folded back in so it
    /// counts toward the new page. Returns the refreshed context of that row.
    fn begin_page(
        &mut self,
        page_number: usize,
        refold_current: bool,
    ) -> Result<Option<Arc<RowContext>>, DataError>;
}

type BoundRow = (usize, Vec<Value>);

enum Rows<S> {
    Streaming { source: S, position: usize },
    Sorted(std::vec::IntoIter<BoundRow>),
}

impl<S: RowSource> Rows<S> {
    fn next(&mut self, template: &Template) -> Option<Result<BoundRow, DataError>> {
        match self {
            Rows::Sorted(rows) => rows.next().map(Ok),
            Rows::Streaming { source, position } => {
                let index = *position;
                let row = match source.next_row()? {
                    Ok(row) => row,
                    Err(e) => return Some(Err(e.into())),
                };
                *position += 1;
                Some(bind_row(template, &row, index).map(|fields| (index, fields)))
            }
        }
    }
}

pub struct Processor<'t, S: RowSource> {
    template: &'t Template,
    parameters: Vec<Value>,
    rows: Rows<S>,
    lookahead: Option<Result<BoundRow, DataError>>,
    yielded: usize,
    initial_values: Vec<Option<Value>>,
    accumulators: Vec<Accumulator>,
    variables: Vec<Value>,
    group_values: Vec<Value>,
    initial: Arc<RowContext>,
    current: Option<Arc<RowContext>>,
    page_number: usize,
}

/// Starts processing `source` against `template` with resolved parameter values.
pub fn process<S: RowSource>(
    template: &Template,
    source: S,
    parameters: Vec<Value>,
) -> Result<Processor<'_, S>, DataError> {
    Processor::new(template, source, parameters)
}

impl<'t, S: RowSource> Processor<'t, S> {
    pub fn new(template: &'t Template, source: S, parameters: Vec<Value>) -> Result<Self, DataError> {
        let mut initial_values = Vec::with_capacity(template.variables.len());
        for variable in &template.variables {
            let value = match &variable.initial_value {
                Some(expr) => {
                    let ctx = EvaluationContext::new(&[], &[], &parameters, Builtins::default());
                    Some(evaluate(expr.compiled()?, &ctx)?)
                }
                None => None,
            };
            initial_values.push(value);
        }
        let accumulators: Vec<Accumulator> = template
            .variables
            .iter()
            .zip(&initial_values)
            .map(|(v, init)| Accumulator::reset(v.calculation, init.clone()))
            .collect();
        let variables: Vec<Value> = accumulators.iter().map(Accumulator::value).collect();

        let mut rows = Rows::Streaming { source, position: 0 };
        if !template.sort_fields.is_empty() {
            rows = Rows::Sorted(sorted_rows(template, &mut rows)?.into_iter());
        }
        let lookahead = rows.next(template);

        let initial = Arc::new(RowContext {
            fields: vec![Value::Null; template.fields.len()],
            variables: variables.clone(),
            row_count: 0,
        });

        Ok(Self {
            template,
            parameters,
            rows,
            lookahead,
            yielded: 0,
            initial_values,
            accumulators,
            variables,
            group_values: Vec::new(),
            initial,
            current: None,
            page_number: 1,
        })
    }

    fn builtins(&self, row_count: usize) -> Builtins {
        Builtins {
            page_number: self.page_number,
            page_count: None,
            column_number: 1,
            row_count,
        }
    }

    fn process_row(
        &mut self,
        fields: Vec<Value>,
        is_last: bool,
    ) -> Result<RowResult, DataError> {
        let index = self.yielded;
        let row_count = index + 1;
        let builtins = self.builtins(row_count);
        let template = self.template;
        let groups = &template.groups;

        let mut group_values = Vec::with_capacity(groups.len());
        for group in groups {
            let ctx = EvaluationContext::new(&fields, &self.variables, &self.parameters, builtins);
            let value = evaluate(group.expression.compiled()?, &ctx).map_err(DataError::in_row(index))?;
            group_values.push(value);
        }

        let first_changed = if self.current.is_none() {
            (!groups.is_empty()).then_some(0)
        } else {
            group_values
                .iter()
                .zip(&self.group_values)
                .position(|(new, old)| new != old)
        };
        self.group_values = group_values;

        let changed: Vec<GroupId> = first_changed
            .map(|first| (first..groups.len()).map(GroupId::new).collect())
            .unwrap_or_default();
        let closed_groups = if self.current.is_some() {
            changed.clone()
        } else {
            Vec::new()
        };
        let closing = if closed_groups.is_empty() {
            None
        } else {
            self.current.clone()
        };

        if let Some(first) = first_changed.filter(|_| !closed_groups.is_empty()) {
            for (i, variable) in template.variables.iter().enumerate() {
                if variable.reset_group.is_some_and(|g| g.index() >= first) {
                    log::trace!("Resetting variable '{}' at row {}", variable.name, index);
                    self.reset_variable(i);
                }
            }
        }

        for i in 0..template.variables.len() {
            self.fold_variable(i, &fields, builtins)
                .map_err(DataError::in_row(index))?;
        }

        let context = Arc::new(RowContext {
            fields,
            variables: self.variables.clone(),
            row_count,
        });
        self.current = Some(Arc::clone(&context));
        self.yielded += 1;

        let trailing_closed_groups = if is_last {
            (0..groups.len()).map(GroupId::new).collect()
        } else {
            Vec::new()
        };

        Ok(RowResult {
            index,
            context,
            opened_groups: changed,
            closed_groups,
            closing,
            trailing_closed_groups,
            is_last,
        })
    }

    fn reset_variable(&mut self, i: usize) {
        let variable = &self.template.variables[i];
        self.accumulators[i] = Accumulator::reset(variable.calculation, self.initial_values[i].clone());
        self.variables[i] = self.accumulators[i].value();
    }

    fn fold_variable(
        &mut self,
        i: usize,
        fields: &[Value],
        builtins: Builtins,
    ) -> Result<(), banded_expr::ExpressionError> {
        let variable = &self.template.variables[i];
        match &variable.expression {
            Some(expr) => {
                let ctx = EvaluationContext::new(fields, &self.variables, &self.parameters, builtins);
                let value = evaluate(expr.compiled()?, &ctx)?;
                self.accumulators[i].fold(value, expr.source())?;
            }
            None if variable.calculation == Calculation::Count => {
                self.accumulators[i].fold(Value::Boolean(true), &variable.name)?;
            }
            None => {}
        }
        self.variables[i] = self.accumulators[i].value();
        Ok(())
    }
}

fn sorted_rows<S: RowSource>(template: &Template, rows: &mut Rows<S>) -> Result<Vec<BoundRow>, DataError> {
    let keys: Vec<(usize, bool)> = template
        .sort_fields
        .iter()
        .filter_map(|s| template.field_index(&s.name).map(|slot| (slot, s.descending)))
        .collect();

    let mut bound = Vec::new();
    while let Some(row) = rows.next(template) {
        bound.push(row?);
    }
    // `sort_by` is stable, so ties keep source order.
    bound.sort_by(|(_, a), (_, b)| {
        keys.iter()
            .map(|&(slot, descending)| {
                let ordering = a[slot].sort_cmp(&b[slot]);
                if descending { ordering.reverse() } else { ordering }
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    log::debug!("Sorted {} rows on {} key(s)", bound.len(), keys.len());
    Ok(bound)
}

impl<S: RowSource> Iterator for Processor<'_, S> {
    type Item = Result<RowResult, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, fields) = match self.lookahead.take()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        self.lookahead = self.rows.next(self.template);
        let is_last = self.lookahead.is_none();
        let result = self.process_row(fields, is_last);
        if result.is_err() {
            self.lookahead = None;
        }
        Some(result)
    }
}

impl<S: RowSource> RowStream for Processor<'_, S> {
    fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    fn initial_context(&self) -> Arc<RowContext> {
        Arc::clone(&self.initial)
    }

    fn begin_page(
        &mut self,
        page_number: usize,
        refold_current: bool,
    ) -> Result<Option<Arc<RowContext>>, DataError> {
        self.page_number = page_number;
        let scoped: Vec<usize> = self
            .template
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| matches!(v.reset, ResetScope::Page | ResetScope::Column))
            .map(|(i, _)| i)
            .collect();
        if scoped.is_empty() {
            return Ok(self.current.clone());
        }
        for &i in &scoped {
            self.reset_variable(i);
        }
        let Some(current) = self.current.clone() else {
            return Ok(None);
        };
        if refold_current {
            let index = self.yielded.saturating_sub(1);
            let builtins = self.builtins(current.row_count);
            for &i in &scoped {
                self.fold_variable(i, &current.fields, builtins)
                    .map_err(DataError::in_row(index))?;
            }
        }
        let refreshed = Arc::new(RowContext {
            fields: current.fields.clone(),
            variables: self.variables.clone(),
            row_count: current.row_count,
        });
        self.current = Some(Arc::clone(&refreshed));
        Ok(Some(refreshed))
    }
}
