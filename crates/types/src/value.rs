//! The typed value model shared by expressions, data binding and layout.
//!
//! Numbers are fixed-point [`Decimal`]s throughout, so repeated aggregation of
//! currency amounts never accumulates binary floating point drift.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// The four declared value types a field, parameter or variable may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Date,
    Boolean,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Boolean => "boolean",
        }
    }

    /// Maps a declared type name onto a value type.
    ///
    /// Accepts the short names (`number`, `date`, ...) as well as the Java
    /// class names found in JRXML `class` attributes. Returns `None` for
    /// anything else.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let simple = declared.rsplit('.').next().unwrap_or(declared);
        match simple {
            "String" | "string" | "Object" | "Character" => Some(ValueType::String),
            "BigDecimal" | "Double" | "Float" | "Integer" | "Long" | "Short" | "Byte"
            | "Number" | "BigInteger" | "number" | "currency" => Some(ValueType::Number),
            "Date" | "Timestamp" | "LocalDate" | "LocalDateTime" | "date" => {
                Some(ValueType::Date)
            }
            "Boolean" | "boolean" => Some(ValueType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Number(#[serde(with = "rust_decimal::serde::str")] Decimal),
    Date(NaiveDate),
    Boolean(bool),
}

impl Value {
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(ValueType::String),
            Value::Number(_) => Some(ValueType::Number),
            Value::Date(_) => Some(ValueType::Date),
            Value::Boolean(_) => Some(ValueType::Boolean),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().map(ValueType::name).unwrap_or("null")
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Orders two values of the same type. Values of different types (and
    /// nulls) have no ordering.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting rows: nulls first, then by type, then by value.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Boolean(_) => 1,
                Value::Number(_) => 2,
                Value::Date(_) => 3,
                Value::String(_) => 4,
            }
        }
        self.compare(other)
            .unwrap_or_else(|| rank(self).cmp(&rank(other)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => f.write_str(s),
            Value::Number(d) => write!(f, "{}", d),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_declared_type_mapping() {
        assert_eq!(
            ValueType::from_declared("java.math.BigDecimal"),
            Some(ValueType::Number)
        );
        assert_eq!(
            ValueType::from_declared("java.lang.String"),
            Some(ValueType::String)
        );
        assert_eq!(
            ValueType::from_declared("java.sql.Timestamp"),
            Some(ValueType::Date)
        );
        assert_eq!(ValueType::from_declared("boolean"), Some(ValueType::Boolean));
        assert_eq!(ValueType::from_declared("java.awt.Image"), None);
    }

    #[test]
    fn test_display_keeps_decimal_scale() {
        let v = Value::Number(Decimal::from_str("120.50").unwrap());
        assert_eq!(v.to_string(), "120.50");
        assert_eq!(Value::Null.to_string(), "null");
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2024-03-09");
    }

    #[test]
    fn test_compare_only_within_type() {
        assert_eq!(
            Value::from(1).compare(&Value::from(2)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
        assert_eq!(Value::from(1).compare(&Value::from("1")), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_sort_cmp_puts_nulls_first() {
        let mut values = vec![Value::from(3), Value::Null, Value::from(1)];
        values.sort_by(Value::sort_cmp);
        assert_eq!(values, vec![Value::Null, Value::from(1), Value::from(3)]);
    }

    #[test]
    fn test_case_sensitive_string_ordering() {
        assert_eq!(
            Value::from("Z").compare(&Value::from("a")),
            Some(Ordering::Less)
        );
    }
}
