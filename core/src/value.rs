//! Runtime value types
//!
//! Block programs are loosely typed: every input slot accepts any value and
//! blocks cast on read. The casts here follow the conventions block editors
//! expose to users (empty strings are zero, "false" is falsy, text compares
//! case-insensitively).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/* ===================== Values ===================== */

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
    Obj(BTreeMap<String, Value>),
}

/// The kind of a [`Value`], used by return types and input descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    List,
    Object,
}

impl ValueKind {
    /// Primitive kinds are the ones a descriptor may name directly
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            ValueKind::Null | ValueKind::Boolean | ValueKind::Number | ValueKind::String
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Object => "object",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => ValueKind::Null,
            "boolean" => ValueKind::Boolean,
            "number" => ValueKind::Number,
            "string" => ValueKind::String,
            "list" => ValueKind::List,
            "object" => ValueKind::Object,
            _ => return None,
        })
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Num(_) => ValueKind::Number,
            Value::Str(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Obj(_) => ValueKind::Object,
        }
    }

    /// Cast to a number. Anything that does not parse is zero, and so is NaN.
    pub fn to_number(&self) -> f64 {
        let n = match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Num(n) => *n,
            Value::Str(s) => parse_number(s).unwrap_or(0.0),
            Value::List(_) | Value::Obj(_) => 0.0,
        };
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    /// Check if value is truthy (for conditionals)
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
            Value::List(items) => !items.is_empty(),
            Value::Obj(_) => true,
        }
    }

    /// Whether this value reads as a number without loss
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Num(n) => !n.is_nan(),
            Value::Bool(_) => true,
            Value::Str(s) => parse_number(s).is_some(),
            _ => false,
        }
    }

    /// Loose comparison: numeric when both sides read as numbers, otherwise
    /// case-insensitive text.
    pub fn compare(&self, other: &Value) -> Ordering {
        if self.is_numeric() && other.is_numeric() {
            let (a, b) = (self.to_number(), other.to_number());
            return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        }
        let a = self.to_string().to_lowercase();
        let b = other.to_string().to_lowercase();
        a.cmp(&b)
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

/// Parse text the way number slots do: surrounding whitespace is ignored and an
/// empty string is not a number.
fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if !n.is_nan() => Some(n),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Num(n) => {
                if n.is_infinite() {
                    write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
                } else if n.fract() == 0.0 && n.abs() < 1e16 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                // Single-character items join without separators
                let sep = if items.iter().all(|v| v.to_string().chars().count() == 1) {
                    ""
                } else {
                    " "
                };
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(sep))
            }
            Value::Obj(_) => f.write_str("[object]"),
        }
    }
}

/* ===================== Conversions ===================== */

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Num(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
