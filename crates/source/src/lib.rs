//! Row source abstractions for the report pipeline.
//!
//! A row source hands the engine one row at a time: a mapping from column
//! name to raw JSON value. Sources are finite and are read exactly once per
//! render. Query execution, connections and retries belong to whatever feeds
//! the source, not to the engine.
//!
//! ## Available Sources
//!
//! - `VecRowSource`: In-memory rows, also what a JSON array document loads into
//! - `IteratorRowSource`: Wraps any iterator of rows
//! - `JsonLinesRowSource`: Streams one JSON object per line from a reader
//!
//! ## Example
//!
//! ```
//! use banded_source::{RowSource, VecRowSource};
//!
//! let mut source = VecRowSource::from_json_str(r#"[{"id": 1}, {"id": 2}]"#).unwrap();
//! let first = source.next_row().unwrap().unwrap();
//! assert_eq!(first["id"], 1);
//! ```

use serde_json::{Map, Value};
use std::io::BufRead;
use thiserror::Error;

/// One raw row: column name to value.
pub type Row = Map<String, Value>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error reading rows: {0}")]
    Io(#[from] std::io::Error),

    #[error("Row data must be a JSON array of objects, found {0}")]
    NotAnArray(&'static str),

    #[error("Row {index} is not a JSON object (found {found})")]
    NotAnObject { index: usize, found: &'static str },
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A trait for finite, single-pass sources of rows.
pub trait RowSource: Send {
    /// Get the next row, if available.
    ///
    /// Returns `None` when the source is exhausted. An `Err` aborts the render.
    fn next_row(&mut self) -> Option<Result<Row, SourceError>>;

    /// Hint about the total number of rows.
    ///
    /// Returns `None` if the size is unknown.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// Wraps any iterator of rows as a RowSource.
pub struct IteratorRowSource<I>
where
    I: Iterator<Item = Row> + Send,
{
    inner: I,
    size_hint: Option<usize>,
}

impl<I> IteratorRowSource<I>
where
    I: Iterator<Item = Row> + Send,
{
    pub fn new(inner: I) -> Self {
        let (lower, upper) = inner.size_hint();
        let size_hint = if upper == Some(lower) {
            Some(lower)
        } else {
            None
        };
        Self { inner, size_hint }
    }
}

impl<I> RowSource for IteratorRowSource<I>
where
    I: Iterator<Item = Row> + Send,
{
    fn next_row(&mut self) -> Option<Result<Row, SourceError>> {
        self.inner.next().map(Ok)
    }

    fn size_hint(&self) -> Option<usize> {
        self.size_hint
    }
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct VecRowSource {
    rows: std::vec::IntoIter<Row>,
    len: usize,
}

impl VecRowSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            len: rows.len(),
            rows: rows.into_iter(),
        }
    }

    /// Loads a JSON array of objects.
    pub fn from_json_str(text: &str) -> Result<Self, SourceError> {
        Self::from_json_value(serde_json::from_str(text)?)
    }

    pub fn from_json_value(value: Value) -> Result<Self, SourceError> {
        let Value::Array(items) = value else {
            return Err(SourceError::NotAnArray(json_kind(&value)));
        };
        let rows = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(row) => Ok(row),
                other => Err(SourceError::NotAnObject {
                    index,
                    found: json_kind(&other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rows))
    }

    /// Get the total number of rows the source started with.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of rows remaining.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for VecRowSource {
    fn next_row(&mut self) -> Option<Result<Row, SourceError>> {
        self.rows.next().map(Ok)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len)
    }
}

/// Streams newline-delimited JSON objects. Blank lines are skipped.
pub struct JsonLinesRowSource<R: BufRead + Send> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R: BufRead + Send> JsonLinesRowSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead + Send> RowSource for JsonLinesRowSource<R> {
    fn next_row(&mut self) -> Option<Result<Row, SourceError>> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            let index = self.line;
            self.line += 1;
            let text = self.buffer.trim();
            if text.is_empty() {
                continue;
            }
            return Some(match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(row)) => Ok(row),
                Ok(other) => Err(SourceError::NotAnObject {
                    index,
                    found: json_kind(&other),
                }),
                Err(e) => Err(e.into()),
            });
        }
    }
}

// Blanket implementation for Box<dyn RowSource>
impl RowSource for Box<dyn RowSource> {
    fn next_row(&mut self) -> Option<Result<Row, SourceError>> {
        (**self).next_row()
    }

    fn size_hint(&self) -> Option<usize> {
        (**self).size_hint()
    }
}
