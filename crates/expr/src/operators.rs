//! Operator semantics over non-null values.
//!
//! Null handling happens in the engine before these are reached, so every
//! function here sees two concrete values.

use crate::ast::{BinaryOperator, UnaryOperator};
use banded_types::{Decimal, Value};
use chrono::Duration;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OpError {
    TypeMismatch(String),
    DivisionByZero,
    Overflow,
}

fn mismatch(op: &str, left: &Value, right: &Value) -> OpError {
    OpError::TypeMismatch(format!(
        "cannot apply '{}' to {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn days(n: Decimal) -> Result<Duration, OpError> {
    if !n.fract().is_zero() {
        return Err(OpError::TypeMismatch(format!(
            "date offsets must be whole days, got {}",
            n
        )));
    }
    let whole: i64 = n.try_into().map_err(|_| OpError::Overflow)?;
    Duration::try_days(whole).ok_or(OpError::Overflow)
}

pub(crate) fn apply_unary(op: UnaryOperator, value: Value) -> Result<Value, OpError> {
    match (op, value) {
        (UnaryOperator::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOperator::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOperator::Minus, other) => Err(OpError::TypeMismatch(format!(
            "cannot negate {}",
            other.type_name()
        ))),
        (UnaryOperator::Not, other) => Err(OpError::TypeMismatch(format!(
            "'!' needs a boolean, got {}",
            other.type_name()
        ))),
    }
}

/// Applies every binary operator except the boolean connectives.
pub(crate) fn apply_binary(op: BinaryOperator, left: Value, right: Value) -> Result<Value, OpError> {
    use BinaryOperator::*;
    match op {
        Plus => add(left, right),
        Minus => subtract(left, right),
        Multiply | Divide | Modulo => arithmetic(op, left, right),
        Equals | NotEquals => {
            if left.value_type() != right.value_type() {
                return Err(mismatch(op.symbol(), &left, &right));
            }
            let equal = left == right;
            Ok(Value::Boolean(if op == Equals { equal } else { !equal }))
        }
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            let ordering = left
                .compare(&right)
                .ok_or_else(|| mismatch(op.symbol(), &left, &right))?;
            let result = match op {
                LessThan => ordering == Ordering::Less,
                LessThanOrEqual => ordering != Ordering::Greater,
                GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Boolean(result))
        }
        And | Or => Err(OpError::TypeMismatch(format!(
            "'{}' is evaluated by the engine",
            op.symbol()
        ))),
    }
}

/// `+` adds numbers, shifts dates by whole days and concatenates text.
/// A string joins with a number or boolean; a string and a date never mix.
fn add(left: Value, right: Value) -> Result<Value, OpError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            a.checked_add(b).map(Value::Number).ok_or(OpError::Overflow)
        }
        (Value::Date(d), Value::Number(n)) | (Value::Number(n), Value::Date(d)) => d
            .checked_add_signed(days(n)?)
            .map(Value::Date)
            .ok_or(OpError::Overflow),
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (Value::String(a), b @ (Value::Number(_) | Value::Boolean(_))) => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (a @ (Value::Number(_) | Value::Boolean(_)), Value::String(b)) => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (a, b) => Err(mismatch("+", &a, &b)),
    }
}

fn subtract(left: Value, right: Value) -> Result<Value, OpError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            a.checked_sub(b).map(Value::Number).ok_or(OpError::Overflow)
        }
        (Value::Date(d), Value::Number(n)) => d
            .checked_sub_signed(days(n)?)
            .map(Value::Date)
            .ok_or(OpError::Overflow),
        (Value::Date(a), Value::Date(b)) => {
            Ok(Value::Number(Decimal::from((a - b).num_days())))
        }
        (a, b) => Err(mismatch("-", &a, &b)),
    }
}

fn arithmetic(op: BinaryOperator, left: Value, right: Value) -> Result<Value, OpError> {
    let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
        return Err(mismatch(op.symbol(), &left, &right));
    };
    let result = match op {
        BinaryOperator::Multiply => a.checked_mul(*b).ok_or(OpError::Overflow)?,
        BinaryOperator::Divide => {
            if b.is_zero() {
                return Err(OpError::DivisionByZero);
            }
            a.checked_div(*b).ok_or(OpError::Overflow)?.normalize()
        }
        _ => {
            if b.is_zero() {
                return Err(OpError::DivisionByZero);
            }
            a.checked_rem(*b).ok_or(OpError::Overflow)?
        }
    };
    Ok(Value::Number(result))
}
