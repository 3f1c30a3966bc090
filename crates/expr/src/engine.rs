//! The evaluator for report expressions.
//!
//! Evaluation is a pure function of the expression and the context: it reads
//! slot arrays and never writes anything back.

use crate::ast::{BinaryOperator, Binding, Builtin, Expression, Reference};
use crate::error::ExpressionError;
use crate::operators::{self, OpError};
use banded_types::Value;

/// Engine-maintained counters visible to expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Builtins {
    pub page_number: usize,
    /// Known only once pagination has finished.
    pub page_count: Option<usize>,
    pub column_number: usize,
    pub row_count: usize,
}

/// A read-only view over the resolved values an expression may reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    pub fields: &'a [Value],
    pub variables: &'a [Value],
    pub parameters: &'a [Value],
    pub builtins: Builtins,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        fields: &'a [Value],
        variables: &'a [Value],
        parameters: &'a [Value],
        builtins: Builtins,
    ) -> Self {
        Self {
            fields,
            variables,
            parameters,
            builtins,
        }
    }
}

pub fn evaluate(expr: &Expression, ctx: &EvaluationContext<'_>) -> Result<Value, ExpressionError> {
    match expr {
        Expression::Literal(v) => Ok(v.clone()),
        Expression::Reference(r) => resolve_reference(r, expr, ctx),
        Expression::Unary { op, expr: inner } => {
            let value = evaluate(inner, ctx)?;
            if value.is_null() {
                return Ok(Value::Null);
            }
            operators::apply_unary(*op, value).map_err(|e| op_error(e, expr))
        }
        Expression::Binary { left, op, right } => match op {
            BinaryOperator::And | BinaryOperator::Or => logical(*op, left, right, expr, ctx),
            _ => {
                let l = evaluate(left, ctx)?;
                let r = evaluate(right, ctx)?;
                if l.is_null() || r.is_null() {
                    return Ok(Value::Null);
                }
                operators::apply_binary(*op, l, r).map_err(|e| op_error(e, expr))
            }
        },
        Expression::Conditional {
            condition,
            then_branch,
            else_branch,
        } => match evaluate(condition, ctx)? {
            Value::Boolean(true) => evaluate(then_branch, ctx),
            Value::Boolean(false) => evaluate(else_branch, ctx),
            Value::Null => Ok(Value::Null),
            other => Err(ExpressionError::TypeMismatch {
                expression: expr.to_string(),
                message: format!("condition must be boolean, got {}", other.type_name()),
            }),
        },
        Expression::Call {
            name,
            function,
            args,
        } => {
            let Some(function) = function else {
                return Err(ExpressionError::UnknownFunction {
                    function: name.clone(),
                    expression: expr.to_string(),
                });
            };
            let arity = function.arity();
            if !arity.accepts(args.len()) {
                return Err(ExpressionError::Arity {
                    function: name.clone(),
                    expected: arity.to_string(),
                    actual: args.len(),
                    expression: expr.to_string(),
                });
            }
            let values = args
                .iter()
                .map(|a| evaluate(a, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            function
                .call(values)
                .map_err(|message| ExpressionError::InvalidArgument {
                    function: name.clone(),
                    message,
                    expression: expr.to_string(),
                })
        }
    }
}

/// Evaluates a condition where null counts as false, as print-when conditions do.
pub fn evaluate_as_bool(
    expr: &Expression,
    ctx: &EvaluationContext<'_>,
) -> Result<bool, ExpressionError> {
    match evaluate(expr, ctx)? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(ExpressionError::TypeMismatch {
            expression: expr.to_string(),
            message: format!("expected boolean, got {}", other.type_name()),
        }),
    }
}

fn resolve_reference(
    reference: &Reference,
    expr: &Expression,
    ctx: &EvaluationContext<'_>,
) -> Result<Value, ExpressionError> {
    let value = match reference.binding {
        Binding::Field(slot) => ctx.fields.get(slot.index()).cloned(),
        Binding::Variable(slot) => ctx.variables.get(slot.index()).cloned(),
        Binding::Parameter(slot) => ctx.parameters.get(slot.index()).cloned(),
        Binding::Builtin(builtin) => return builtin_value(builtin, expr, &ctx.builtins),
        Binding::Unresolved => None,
    };
    value.ok_or_else(|| ExpressionError::UnresolvedReference {
        reference: reference.to_string(),
        expression: expr.to_string(),
    })
}

fn builtin_value(
    builtin: Builtin,
    expr: &Expression,
    builtins: &Builtins,
) -> Result<Value, ExpressionError> {
    let n = match builtin {
        Builtin::PageNumber => builtins.page_number,
        Builtin::ColumnNumber => builtins.column_number,
        Builtin::RowCount => builtins.row_count,
        Builtin::PageCount => builtins
            .page_count
            .ok_or_else(|| ExpressionError::Unavailable {
                builtin: builtin.name(),
                expression: expr.to_string(),
            })?,
    };
    Ok(Value::from(n))
}

/// Three-valued `and`/`or`: a decided left operand short-circuits, null is unknown.
fn logical(
    op: BinaryOperator,
    left: &Expression,
    right: &Expression,
    expr: &Expression,
    ctx: &EvaluationContext<'_>,
) -> Result<Value, ExpressionError> {
    let as_tri = |v: Value| -> Result<Option<bool>, ExpressionError> {
        match v {
            Value::Boolean(b) => Ok(Some(b)),
            Value::Null => Ok(None),
            other => Err(ExpressionError::TypeMismatch {
                expression: expr.to_string(),
                message: format!("'{}' needs booleans, got {}", op.symbol(), other.type_name()),
            }),
        }
    };
    let dominant = op == BinaryOperator::Or;

    let l = as_tri(evaluate(left, ctx)?)?;
    if l == Some(dominant) {
        return Ok(Value::Boolean(dominant));
    }
    let r = as_tri(evaluate(right, ctx)?)?;
    let result = match (l, r) {
        (_, Some(b)) if b == dominant => Some(dominant),
        (Some(_), Some(_)) => Some(!dominant),
        _ => None,
    };
    Ok(result.map(Value::Boolean).unwrap_or(Value::Null))
}

fn op_error(err: OpError, expr: &Expression) -> ExpressionError {
    let expression = expr.to_string();
    match err {
        OpError::TypeMismatch(message) => ExpressionError::TypeMismatch {
            expression,
            message,
        },
        OpError::DivisionByZero => ExpressionError::DivisionByZero { expression },
        OpError::Overflow => ExpressionError::Overflow { expression },
    }
}
