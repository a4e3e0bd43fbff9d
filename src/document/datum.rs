//! Datum - the JSON-like value stored in document fields.
//!
//! Integers get their own variant so integer keys compare exactly; a key
//! above 2^53 must never collide with its neighbour through `f64` rounding.
//!
//! # Example
//!
//! ```rust
//! use acl_docstore::document::Datum;
//!
//! assert!(Datum::from(true).is_truthy());
//! assert_ne!(Datum::from(9_007_199_254_740_992i64), Datum::from(9_007_199_254_740_993i64));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Datum represents a value in a document.
///
/// Serialized untagged, so it reads and writes as plain JSON. `Integer` is
/// listed before `Number` so JSON integers load back as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Array(Vec<Datum>),
    Object(HashMap<String, Datum>),
}

impl Datum {
    /// Truthiness used to decide set membership.
    ///
    /// `null`, `false`, `0`, `NaN` and the empty string are falsy;
    /// everything else, including empty arrays and objects, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Datum::Null => false,
            Datum::Boolean(b) => *b,
            Datum::Integer(n) => *n != 0,
            Datum::Number(n) => *n != 0.0 && !n.is_nan(),
            Datum::String(s) => !s.is_empty(),
            Datum::Array(_) | Datum::Object(_) => true,
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Boolean(b)
    }
}

impl From<i64> for Datum {
    fn from(n: i64) -> Self {
        Datum::Integer(n)
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::String(s)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Datum::Boolean(true).is_truthy());
        assert!(Datum::Integer(-1).is_truthy());
        assert!(Datum::Number(1.5).is_truthy());
        assert!(Datum::String("x".into()).is_truthy());
        assert!(Datum::Array(vec![]).is_truthy());

        assert!(!Datum::Null.is_truthy());
        assert!(!Datum::Boolean(false).is_truthy());
        assert!(!Datum::Integer(0).is_truthy());
        assert!(!Datum::Number(0.0).is_truthy());
        assert!(!Datum::Number(f64::NAN).is_truthy());
        assert!(!Datum::String(String::new()).is_truthy());
    }

    #[test]
    fn test_untagged_serde() {
        let datum: Datum = serde_json::from_str(r#"["a", 1, 2.5, false, null]"#).unwrap();
        assert_eq!(
            datum,
            Datum::Array(vec![
                Datum::from("a"),
                Datum::Integer(1),
                Datum::Number(2.5),
                Datum::Boolean(false),
                Datum::Null,
            ])
        );
    }

    #[test]
    fn test_large_integers_stay_exact() {
        let a = Datum::from(9_007_199_254_740_992i64);
        let b = Datum::from(9_007_199_254_740_993i64);
        assert_ne!(a, b);

        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "9007199254740993");
        let back: Datum = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
