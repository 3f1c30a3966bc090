//! The closed table of built-in functions.

use banded_types::{Decimal, NaiveDate, Value};
use chrono::Datelike;
use rust_decimal::RoundingStrategy;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Upper,
    Lower,
    Trim,
    Length,
    Substring,
    Concat,
    Str,
    Round,
    Abs,
    Floor,
    Ceil,
    Year,
    Month,
    Day,
    Date,
    Coalesce,
    IsNull,
}

/// Accepted argument counts; `max` of `None` means variadic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{} to {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

impl Function {
    pub const ALL: [Function; 17] = [
        Function::Upper,
        Function::Lower,
        Function::Trim,
        Function::Length,
        Function::Substring,
        Function::Concat,
        Function::Str,
        Function::Round,
        Function::Abs,
        Function::Floor,
        Function::Ceil,
        Function::Year,
        Function::Month,
        Function::Day,
        Function::Date,
        Function::Coalesce,
        Function::IsNull,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::Upper => "upper",
            Function::Lower => "lower",
            Function::Trim => "trim",
            Function::Length => "length",
            Function::Substring => "substring",
            Function::Concat => "concat",
            Function::Str => "str",
            Function::Round => "round",
            Function::Abs => "abs",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Year => "year",
            Function::Month => "month",
            Function::Day => "day",
            Function::Date => "date",
            Function::Coalesce => "coalesce",
            Function::IsNull => "is_null",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn arity(self) -> Arity {
        match self {
            Function::Substring => Arity::between(2, 3),
            Function::Round => Arity::between(1, 2),
            Function::Concat => Arity::at_least(1),
            Function::Coalesce => Arity::at_least(2),
            _ => Arity::exactly(1),
        }
    }

    /// Whether a null argument makes the result null without calling the function.
    fn propagates_null(self) -> bool {
        !matches!(
            self,
            Function::Concat | Function::Coalesce | Function::IsNull
        )
    }

    /// Calls the function. Arity must already have been checked.
    pub fn call(self, args: Vec<Value>) -> Result<Value, String> {
        if self.propagates_null() && args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
        match self {
            Function::Upper => Ok(Value::String(string_arg(&args[0])?.to_uppercase())),
            Function::Lower => Ok(Value::String(string_arg(&args[0])?.to_lowercase())),
            Function::Trim => Ok(Value::String(string_arg(&args[0])?.trim().to_string())),
            Function::Length => Ok(Value::from(string_arg(&args[0])?.chars().count())),
            Function::Substring => substring(&args),
            Function::Concat => Ok(Value::String(
                args.iter()
                    .filter(|v| !v.is_null())
                    .map(ToString::to_string)
                    .collect(),
            )),
            Function::Str => Ok(Value::String(args[0].to_string())),
            Function::Round => {
                let n = number_arg(&args[0])?;
                let places = match args.get(1) {
                    Some(v) => whole_arg(v)?,
                    None => 0,
                };
                Ok(Value::Number(n.round_dp_with_strategy(
                    places,
                    RoundingStrategy::MidpointAwayFromZero,
                )))
            }
            Function::Abs => Ok(Value::Number(number_arg(&args[0])?.abs())),
            Function::Floor => Ok(Value::Number(number_arg(&args[0])?.floor())),
            Function::Ceil => Ok(Value::Number(number_arg(&args[0])?.ceil())),
            Function::Year => Ok(Value::from(date_arg(&args[0])?.year())),
            Function::Month => Ok(Value::from(date_arg(&args[0])?.month() as i64)),
            Function::Day => Ok(Value::from(date_arg(&args[0])?.day() as i64)),
            Function::Date => match &args[0] {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|e| format!("cannot read '{}' as a date: {}", s, e)),
                other => Err(format!("expected string or date, got {}", other.type_name())),
            },
            Function::Coalesce => Ok(args
                .into_iter()
                .find(|v| !v.is_null())
                .unwrap_or(Value::Null)),
            Function::IsNull => Ok(Value::Boolean(args[0].is_null())),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn string_arg(v: &Value) -> Result<&str, String> {
    v.as_str()
        .ok_or_else(|| format!("expected string, got {}", v.type_name()))
}

fn number_arg(v: &Value) -> Result<Decimal, String> {
    v.as_decimal()
        .ok_or_else(|| format!("expected number, got {}", v.type_name()))
}

fn date_arg(v: &Value) -> Result<NaiveDate, String> {
    v.as_date()
        .ok_or_else(|| format!("expected date, got {}", v.type_name()))
}

fn whole_arg(v: &Value) -> Result<u32, String> {
    let n = number_arg(v)?;
    if !n.fract().is_zero() || n.is_sign_negative() {
        return Err(format!("expected a non-negative whole number, got {}", n));
    }
    u32::try_from(n).map_err(|_| format!("{} is out of range", n))
}

/// `substring(text, start[, length])` with a 1-based start, counted in characters.
fn substring(args: &[Value]) -> Result<Value, String> {
    let text = string_arg(&args[0])?;
    let start = whole_arg(&args[1])?.max(1) as usize - 1;
    let chars = text.chars().skip(start);
    let out: String = match args.get(2) {
        Some(len) => chars.take(whole_arg(len)? as usize).collect(),
        None => chars.collect(),
    };
    Ok(Value::String(out))
}
