use std::{cmp::Ordering, fmt};

/// A decoded column value, materialised for display and comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Equality as a `WHERE col = literal` sees it once the literal carries
    /// the column's affinity: NULL matches nothing, integers and reals
    /// compare numerically, text compares byte-wise, and values of different
    /// storage classes never match. Agrees with [`Value::key_cmp`] on every
    /// non-NULL pair.
    pub fn sql_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            _ => self.key_cmp(other) == Ordering::Equal,
        }
    }

    /// Converts a literal to the storage class a column of `affinity` would
    /// give it, so that it compares against stored values the way SQLite
    /// does.
    pub fn with_affinity(self, affinity: Affinity) -> Value {
        match (affinity, self) {
            (Affinity::Integer | Affinity::Numeric, Value::Text(text)) => match parse_numeric(&text) {
                Some(Value::Real(r)) if r.fract() == 0.0 && r.abs() < 9.0e18 => Value::Integer(r as i64),
                Some(number) => number,
                None => Value::Text(text),
            },
            (Affinity::Real, Value::Text(text)) => match parse_numeric(&text) {
                Some(Value::Integer(i)) => Value::Real(i as f64),
                Some(number) => number,
                None => Value::Text(text),
            },
            (Affinity::Real, Value::Integer(i)) => Value::Real(i as f64),
            (Affinity::Text, value @ (Value::Integer(_) | Value::Real(_))) => {
                Value::Text(value.to_string())
            }
            (_, value) => value,
        }
    }

    /// Total order used for index keys: NULL < numbers < text < blob, text
    /// and blobs ordered byte-lexicographically.
    pub fn key_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(a), Value::Real(b)) => {
                let a = *a as f64;
                a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
            }
            (Value::Real(a), Value::Integer(b)) => {
                let b = *b as f64;
                a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
            }
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)),
            (Value::Text(a), Value::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            _ => self.class_rank().cmp(&other.class_rank()),
        }
    }

    fn class_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) | Value::Real(_) => 1,
            Value::Text(_) => 2,
            Value::Blob(_) => 3,
        }
    }
}

/// Type affinity of a declared column type, by SQLite's substring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    pub fn from_declared_type(declared_type: &str) -> Self {
        let declared = declared_type.to_ascii_uppercase();
        if declared.contains("INT") {
            Affinity::Integer
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|t| declared.contains(t)) {
            Affinity::Text
        } else if declared.is_empty() || declared.contains("BLOB") {
            Affinity::Blob
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|t| declared.contains(t)) {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }
}

/// Reads `text` as an integer or a finite real; anything else is not numeric.
fn parse_numeric(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .map(Value::Real)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e15 => {
                write!(f, "{r:.1}")
            }
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}
