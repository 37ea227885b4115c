//! Cell value types

use serde::{Deserialize, Serialize};

/// A scalar value held by a single grid cell.
///
/// `Null` is the empty cell. Values serialize untagged, so a cell reads
/// as plain JSON (`null`, `true`, `42`, `1.5`, `"text"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Number(Number::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(Number::Float(n)) => Some(*n),
            CellValue::Number(Number::Integer(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(Number::Integer(n)) => write!(f, "{}", n),
            CellValue::Number(Number::Float(n)) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(Number::Integer(v))
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(Number::Float(v))
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::String(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

/// Number type supporting both integers and floats.
///
/// Numbers compare by value, so `1` and `1.0` are equal whichever way a
/// peer encoded them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Integer(i), Number::Float(f)) | (Number::Float(f), Number::Integer(i)) => {
                // exact only where the float holds an integer in i64 range
                f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 && *f as i64 == *i
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_default() {
        assert!(CellValue::default().is_null());
        assert_eq!(CellValue::from(None::<&str>), CellValue::Null);
    }

    #[test]
    fn test_json_shape_is_untagged() {
        let cells = vec![
            CellValue::Null,
            CellValue::from(true),
            CellValue::from(7i64),
            CellValue::from(2.5),
            CellValue::from("x"),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,true,7,2.5,"x"]"#);

        let back: Vec<CellValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(CellValue::from(1i64), CellValue::from(1.0));
        assert_eq!(CellValue::from(-3.0), CellValue::from(-3i64));
        assert_ne!(CellValue::from(1i64), CellValue::from(1.5));
        assert_ne!(CellValue::from(1i64), CellValue::from("1"));
        assert_ne!(CellValue::from(i64::MAX), CellValue::from(i64::MAX as f64));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(CellValue::from(3i64).as_i64(), Some(3));
        assert_eq!(CellValue::from(3i64).as_f64(), Some(3.0));
        assert_eq!(CellValue::from("a").as_str(), Some("a"));
        assert_eq!(CellValue::from(false).as_bool(), Some(false));
        assert_eq!(CellValue::Null.as_str(), None);
    }
}
