//! Display formatting for element values.
//!
//! A format is written on a text element either as a keyword specifier
//! (`currency`, `percentage`, `number:2`, `date:%d/%m/%Y`, `plain`) or as a
//! Java-style pattern (`#,##0.00`, `¤#,##0.00`, `0.0%`, `dd/MM/yyyy`).

use banded_types::{Decimal, NaiveDate, Value};
use chrono::format::{Item, StrftimeItems};
use rust_decimal::RoundingStrategy;
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormatSpec {
    #[default]
    Plain,
    Number {
        decimals: u32,
    },
    Currency {
        symbol: String,
        decimals: u32,
    },
    Percentage {
        decimals: u32,
    },
    Date {
        pattern: String,
    },
}

const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d";

impl FormatSpec {
    /// Renders a non-null value. Values whose type does not suit the format
    /// fall back to their plain text.
    pub fn apply(&self, value: &Value) -> String {
        match (self, value) {
            (FormatSpec::Number { decimals }, Value::Number(n)) => group_decimal(*n, *decimals),
            (FormatSpec::Currency { symbol, decimals }, Value::Number(n)) => {
                let body = group_decimal(n.abs(), *decimals);
                if n.is_sign_negative() && !n.is_zero() {
                    format!("-{}{}", symbol, body)
                } else {
                    format!("{}{}", symbol, body)
                }
            }
            (FormatSpec::Percentage { decimals }, Value::Number(n)) => {
                let scaled = n.checked_mul(Decimal::ONE_HUNDRED).unwrap_or(*n);
                format!("{}%", fixed(scaled, *decimals))
            }
            (FormatSpec::Date { pattern }, Value::Date(d)) => format_date(*d, pattern),
            (FormatSpec::Date { pattern }, Value::String(s)) => {
                match NaiveDate::parse_from_str(s.trim(), DEFAULT_DATE_PATTERN) {
                    Ok(d) => format_date(d, pattern),
                    Err(_) => self.unformatted(value),
                }
            }
            (FormatSpec::Plain, other) => other.to_string(),
            (_, other) => self.unformatted(other),
        }
    }

    fn unformatted(&self, value: &Value) -> String {
        log::debug!(
            "Format {:?} does not apply to {} value '{}'; printing it unformatted",
            self,
            value.type_name(),
            value
        );
        value.to_string()
    }
}

impl FromStr for FormatSpec {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(FormatSpec::Plain);
        }
        let (keyword, argument) = match spec.split_once(':') {
            Some((k, a)) => (k, Some(a)),
            None => (spec, None),
        };
        match keyword {
            "plain" => Ok(FormatSpec::Plain),
            "currency" => Ok(FormatSpec::Currency {
                symbol: argument.unwrap_or("$").to_string(),
                decimals: 2,
            }),
            "percentage" | "percent" => Ok(FormatSpec::Percentage {
                decimals: decimals_argument(argument, 1)?,
            }),
            "number" => Ok(FormatSpec::Number {
                decimals: decimals_argument(argument, 0)?,
            }),
            "date" => {
                let pattern = argument.unwrap_or(DEFAULT_DATE_PATTERN);
                check_strftime(pattern)?;
                Ok(FormatSpec::Date {
                    pattern: pattern.to_string(),
                })
            }
            _ => parse_java_pattern(spec),
        }
    }
}

fn check_strftime(pattern: &str) -> Result<(), String> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date pattern '{}'", pattern));
    }
    Ok(())
}

fn format_date(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        return date.to_string();
    }
    out
}

fn decimals_argument(argument: Option<&str>, default: u32) -> Result<u32, String> {
    match argument {
        None => Ok(default),
        Some(a) => a
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid decimal count '{}'", a)),
    }
}

/// Counts the `0`/`#` digits after the decimal point of a numeric pattern.
fn pattern_decimals(pattern: &str) -> u32 {
    pattern
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| matches!(c, '0' | '#')).count() as u32)
        .unwrap_or(0)
}

fn parse_java_pattern(pattern: &str) -> Result<FormatSpec, String> {
    let numeric = |c: char| matches!(c, '#' | '0' | ',' | '.' | '-');
    if let Some(body) = pattern.strip_suffix('%') {
        if body.chars().all(numeric) {
            return Ok(FormatSpec::Percentage {
                decimals: pattern_decimals(body),
            });
        }
    }
    let currency_prefix = ['¤', '$', '€', '£', '¥']
        .into_iter()
        .find(|c| pattern.starts_with(*c));
    if let Some(prefix) = currency_prefix {
        let body = &pattern[prefix.len_utf8()..];
        if body.chars().all(numeric) {
            let symbol = if prefix == '¤' { '$' } else { prefix };
            return Ok(FormatSpec::Currency {
                symbol: symbol.to_string(),
                decimals: pattern_decimals(body),
            });
        }
    }
    if pattern.chars().all(numeric) {
        return Ok(FormatSpec::Number {
            decimals: pattern_decimals(pattern),
        });
    }
    if pattern.chars().any(|c| matches!(c, 'y' | 'M' | 'd' | 'H' | 'm' | 's')) {
        return Ok(FormatSpec::Date {
            pattern: java_date_to_strftime(pattern),
        });
    }
    Err(format!("unrecognised format '{}'", pattern))
}

fn java_date_to_strftime(pattern: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let piece = match (c, run) {
            ('y', 2) => "%y".to_string(),
            ('y', _) => "%Y".to_string(),
            ('M', 1 | 2) => "%m".to_string(),
            ('M', 3) => "%b".to_string(),
            ('M', _) => "%B".to_string(),
            ('d', _) => "%d".to_string(),
            ('H', _) => "%H".to_string(),
            ('m', _) => "%M".to_string(),
            ('s', _) => "%S".to_string(),
            ('%', _) => "%%".repeat(run),
            (other, n) => std::iter::repeat_n(other, n).collect(),
        };
        out.push_str(&piece);
        i += run;
    }
    out
}

/// Rounds half away from zero and pads to exactly `decimals` places.
fn fixed(n: Decimal, decimals: u32) -> String {
    let mut rounded = n.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimals);
    rounded.to_string()
}

fn group_decimal(n: Decimal, decimals: u32) -> String {
    let text = fixed(n, decimals);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
