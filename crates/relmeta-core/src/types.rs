//! Raw introspection values, rows and query results

use serde::{Deserialize, Serialize};

use crate::{MetaError, Result};

/// A raw cell value in an introspection result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// A row from an introspection query, addressable by column label.
///
/// Column label lookup is case-insensitive, matching the loose labeling of
/// driver metadata result sets.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column label
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }

    /// Get column labels
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// String cell; absent column and NULL both map to `None`
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get_by_name(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Trimmed string cell; whitespace-only values collapse to `None`
    pub fn get_string_trimmed(&self, name: &str) -> Option<String> {
        self.get_by_name(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    /// Lossy integer cell; any unreadable value maps to `None`
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get_by_name(name).and_then(|v| v.as_i64())
    }

    /// Lossy integer cell; unreadable and out-of-range values map to `None`
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Textual yes/no flag cell; anything but "YES" reads as false
    pub fn get_bool_yes(&self, name: &str) -> bool {
        self.get_string_trimmed(name).as_deref() == Some("YES")
    }

    /// Strict integer cell read.
    ///
    /// `Ok(None)` when the column is absent or NULL; `Err` when a value is
    /// present but cannot be read as an integer. Callers that tolerate bad
    /// source data catch the error and substitute a default.
    pub fn try_get_i32(&self, name: &str) -> Result<Option<i32>> {
        match self.get_by_name(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match value.as_i64().and_then(|v| i32::try_from(v).ok()) {
                Some(v) => Ok(Some(v)),
                None => Err(MetaError::Query(format!(
                    "column {} is not readable as a 32-bit integer: {}",
                    name, value
                ))),
            },
        }
    }
}

/// Result of one introspection query
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Column labels
    pub columns: Vec<String>,
    /// Row data
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Create an empty result with the given column labels
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row of values matching the result's column labels
    pub fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push(Row::new(self.columns.clone(), values));
    }
}
