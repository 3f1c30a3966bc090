//! Running aggregates for report variables.

use banded_expr::ExpressionError;
use banded_template::Calculation;
use banded_types::{Decimal, Value};
use std::cmp::Ordering;

/// The running state of one variable between resets.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Accumulator {
    Sum(Value),
    Count(Decimal),
    Average { sum: Decimal, count: Decimal, initial: Value },
    Extreme { value: Value, keep: Ordering },
    First { value: Value, seen: bool },
    Last(Value),
}

impl Accumulator {
    /// The state right after a reset. `initial` replaces the calculation's
    /// identity when the variable declares an initial value.
    pub(crate) fn reset(calculation: Calculation, initial: Option<Value>) -> Self {
        match calculation {
            Calculation::Sum => Accumulator::Sum(initial.unwrap_or(Value::Number(Decimal::ZERO))),
            Calculation::Count => Accumulator::Count(
                initial
                    .and_then(|v| v.as_decimal())
                    .unwrap_or(Decimal::ZERO),
            ),
            Calculation::Average => Accumulator::Average {
                sum: Decimal::ZERO,
                count: Decimal::ZERO,
                initial: initial.unwrap_or_default(),
            },
            Calculation::Min => Accumulator::Extreme {
                value: initial.unwrap_or_default(),
                keep: Ordering::Less,
            },
            Calculation::Max => Accumulator::Extreme {
                value: initial.unwrap_or_default(),
                keep: Ordering::Greater,
            },
            Calculation::First => Accumulator::First {
                value: initial.unwrap_or_default(),
                seen: false,
            },
            Calculation::None => Accumulator::Last(initial.unwrap_or_default()),
        }
    }

    /// Folds one evaluated value in. Nulls are skipped by every calculation
    /// except `none` and `first`.
    pub(crate) fn fold(&mut self, value: Value, expression: &str) -> Result<(), ExpressionError> {
        let overflow = || ExpressionError::Overflow {
            expression: expression.to_string(),
        };
        let mismatch = |message: String| ExpressionError::TypeMismatch {
            expression: expression.to_string(),
            message,
        };
        match self {
            Accumulator::Last(last) => *last = value,
            Accumulator::First { value: first, seen } => {
                if !*seen {
                    *first = value;
                    *seen = true;
                }
            }
            _ if value.is_null() => {}
            Accumulator::Count(count) => *count = count.checked_add(Decimal::ONE).ok_or_else(overflow)?,
            Accumulator::Sum(total) => {
                let addend = value
                    .as_decimal()
                    .ok_or_else(|| mismatch(format!("cannot sum a {} value", value.type_name())))?;
                let current = total.as_decimal().unwrap_or(Decimal::ZERO);
                *total = Value::Number(current.checked_add(addend).ok_or_else(overflow)?);
            }
            Accumulator::Average { sum, count, .. } => {
                let addend = value
                    .as_decimal()
                    .ok_or_else(|| mismatch(format!("cannot average a {} value", value.type_name())))?;
                *sum = sum.checked_add(addend).ok_or_else(overflow)?;
                *count = count.checked_add(Decimal::ONE).ok_or_else(overflow)?;
            }
            Accumulator::Extreme { value: best, keep } => {
                if best.is_null() {
                    *best = value;
                } else {
                    let ordering = value.compare(best).ok_or_else(|| {
                        mismatch(format!(
                            "cannot compare {} with {}",
                            value.type_name(),
                            best.type_name()
                        ))
                    })?;
                    if ordering == *keep {
                        *best = value;
                    }
                }
            }
        }
        Ok(())
    }

    /// The value a reader sees. Averages divide here.
    pub(crate) fn value(&self) -> Value {
        match self {
            Accumulator::Sum(v) | Accumulator::Last(v) => v.clone(),
            Accumulator::Count(c) => Value::Number(*c),
            Accumulator::Average { sum, count, initial } => {
                if count.is_zero() {
                    initial.clone()
                } else {
                    sum.checked_div(*count)
                        .map(|d| Value::Number(d.normalize()))
                        .unwrap_or(Value::Null)
                }
            }
            Accumulator::Extreme { value, .. } | Accumulator::First { value, .. } => value.clone(),
        }
    }
}
