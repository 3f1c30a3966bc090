//! Conversion of raw row columns and caller parameters into typed values.

use crate::error::DataError;
use banded_expr::{Builtins, EvaluationContext, evaluate};
use banded_source::Row;
use banded_template::Template;
use banded_types::{Decimal, NaiveDate, Value, ValueType};
use serde_json::{Map, Value as Json};
use std::str::FromStr;

/// Converts a raw JSON value to the declared type.
///
/// Returns `None` when the value cannot be represented; JSON null and empty
/// strings for non-string types become [`Value::Null`].
pub fn coerce(raw: &Json, value_type: ValueType) -> Option<Value> {
    if raw.is_null() {
        return Some(Value::Null);
    }
    match value_type {
        ValueType::String => match raw {
            Json::String(s) => Some(Value::String(s.clone())),
            Json::Number(n) => Some(Value::String(n.to_string())),
            Json::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ValueType::Number => match raw {
            Json::Number(n) => parse_decimal(&n.to_string()).map(Value::Number),
            Json::String(s) if s.trim().is_empty() => Some(Value::Null),
            Json::String(s) => parse_decimal(s.trim()).map(Value::Number),
            _ => None,
        },
        ValueType::Date => match raw {
            Json::String(s) if s.trim().is_empty() => Some(Value::Null),
            Json::String(s) => parse_date(s.trim()).map(Value::Date),
            _ => None,
        },
        ValueType::Boolean => match raw {
            Json::Bool(b) => Some(Value::Boolean(*b)),
            Json::String(s) if s.trim().is_empty() => Some(Value::Null),
            Json::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part (`T...` or ` ...`).
fn parse_date(text: &str) -> Option<NaiveDate> {
    let (day, rest) = text.split_at_checked(10)?;
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return None;
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Binds one raw row to the template's fields, in declaration order.
///
/// Missing columns bind as null.
pub fn bind_row(template: &Template, row: &Row, index: usize) -> Result<Vec<Value>, DataError> {
    template
        .fields
        .iter()
        .map(|field| match row.get(&field.column) {
            None => Ok(Value::Null),
            Some(raw) => coerce(raw, field.value_type).ok_or_else(|| DataError::DataBindingError {
                field: field.name.clone(),
                expected: field.value_type.name(),
                raw: raw.to_string(),
                row: index,
            }),
        })
        .collect()
}

/// Resolves the parameter slots for one render.
///
/// Each parameter takes the caller's value if supplied, else its default
/// expression, else null. Defaults may refer to parameters declared before
/// them. Supplied names the template does not declare are logged, or rejected
/// when `strict` is set.
pub fn resolve_parameters(
    template: &Template,
    supplied: &Map<String, Json>,
    strict: bool,
) -> Result<Vec<Value>, DataError> {
    for name in supplied.keys() {
        if template.parameter_index(name).is_none() {
            if strict {
                return Err(DataError::UnknownParameter(name.clone()));
            }
            log::warn!("Ignoring parameter '{}': not declared by report '{}'", name, template.name);
        }
    }

    let mut values = vec![Value::Null; template.parameters.len()];
    for (i, parameter) in template.parameters.iter().enumerate() {
        values[i] = match (supplied.get(&parameter.name), &parameter.default) {
            (Some(raw), _) => {
                coerce(raw, parameter.value_type).ok_or_else(|| DataError::ParameterType {
                    name: parameter.name.clone(),
                    expected: parameter.value_type.name(),
                    raw: raw.to_string(),
                })?
            }
            (None, Some(default)) => {
                let ctx = EvaluationContext::new(&[], &[], &values, Builtins::default());
                evaluate(default.compiled()?, &ctx)?
            }
            (None, None) => Value::Null,
        };
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banded_template::{Expr, Parameter, TemplateBuilder};
    use serde_json::json;

    fn num(s: &str) -> Value {
        Value::Number(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce(&json!(12.5), ValueType::Number), Some(num("12.5")));
        assert_eq!(coerce(&json!("1,000"), ValueType::Number), None);
        assert_eq!(coerce(&json!(" 7 "), ValueType::Number), Some(num("7")));
        assert_eq!(coerce(&json!(""), ValueType::Number), Some(Value::Null));
        assert_eq!(coerce(&json!(true), ValueType::Number), None);
    }

    #[test]
    fn test_coerce_dates_and_booleans() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(coerce(&json!("2024-01-31"), ValueType::Date), Some(Value::Date(d)));
        assert_eq!(
            coerce(&json!("2024-01-31T10:00:00Z"), ValueType::Date),
            Some(Value::Date(d))
        );
        assert_eq!(coerce(&json!("31/01/2024"), ValueType::Date), None);
        assert_eq!(coerce(&json!("TRUE"), ValueType::Boolean), Some(Value::Boolean(true)));
        assert_eq!(coerce(&json!(1), ValueType::Boolean), None);
        assert_eq!(coerce(&json!(42), ValueType::String), Some(Value::from("42")));
        assert_eq!(coerce(&json!(null), ValueType::Date), Some(Value::Null));
    }

    #[test]
    fn test_bind_row_reports_field_and_raw_value() {
        let template = TemplateBuilder::new("t")
            .field("name", ValueType::String)
            .field("amount", ValueType::Number)
            .build()
            .unwrap();
        let row = json!({"amount": "abc"}).as_object().cloned().unwrap();
        match bind_row(&template, &row, 4) {
            Err(DataError::DataBindingError { field, raw, row, .. }) => {
                assert_eq!(field, "amount");
                assert_eq!(raw, "\"abc\"");
                assert_eq!(row, 4);
            }
            other => panic!("unexpected {:?}", other),
        }

        let row = json!({"amount": 3}).as_object().cloned().unwrap();
        assert_eq!(bind_row(&template, &row, 0).unwrap(), vec![Value::Null, num("3")]);
    }

    #[test]
    fn test_parameter_resolution_order() {
        let mut rate = Parameter::new("rate", ValueType::Number);
        rate.default = Some(Expr::new("0.2"));
        let mut doubled = Parameter::new("doubled", ValueType::Number);
        doubled.default = Some(Expr::new("$P{rate} * 2"));
        let template = TemplateBuilder::new("t")
            .parameter(Parameter::new("title", ValueType::String))
            .parameter(rate)
            .parameter(doubled)
            .build()
            .unwrap();

        let values = resolve_parameters(&template, &Map::new(), false).unwrap();
        assert_eq!(values, vec![Value::Null, num("0.2"), num("0.4")]);

        let supplied = json!({"rate": 0.5, "extra": 1}).as_object().cloned().unwrap();
        let values = resolve_parameters(&template, &supplied, false).unwrap();
        assert_eq!(values[2], num("1.0"));
        assert!(matches!(
            resolve_parameters(&template, &supplied, true),
            Err(DataError::UnknownParameter(name)) if name == "extra"
        ));

        let bad = json!({"rate": "high"}).as_object().cloned().unwrap();
        assert!(matches!(
            resolve_parameters(&template, &bad, false),
            Err(DataError::ParameterType { .. })
        ));
    }
}
