//! Attribute values

use crate::Interval;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value carried by an attribute
///
/// Plain attributes may hold anything a flat record can hold. Measurements
/// must hold `Integer` or `Number`. `Interval` keeps the caller's label so
/// that an age group such as `"0-4 years"` can be written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Missing value
    Null,
    /// Boolean flag
    Bool(bool),
    /// Whole number
    Integer(i64),
    /// Real number
    Number(f64),
    /// Free text or a category label
    Text(String),
    /// A labelled slice of a continuous grouping variable
    Interval {
        /// Display label, e.g. "0-4 years"
        label: String,
        /// The numeric range the label denotes
        interval: Interval,
    },
}

impl AttributeValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interval view of the value, if it has one
    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            AttributeValue::Interval { interval, .. } => Some(interval),
            _ => None,
        }
    }

    /// Text view of the value, if it has one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::Interval { label, .. } => Some(label),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Interval { label, .. } => write!(f, "{}", label),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}
