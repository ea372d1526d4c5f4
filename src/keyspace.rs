//! Cache Keyspace
//!
//! Deterministic key construction from a domain name and a set of named
//! arguments.
//!
//! Keys have the form `<domain>:<encoded-args>` where the encoded arguments
//! are the compact JSON object of the arguments sorted by name. Floating-point
//! arguments are rounded to [`COORD_PRECISION`] decimals first, so lookups for
//! near-identical coordinates share one slot. Encodings longer than
//! [`MAX_ENCODED_ARGS_LEN`] are replaced by their SHA-256 digest.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

/// Decimal places kept for floating-point arguments (~110 m of latitude).
pub const COORD_PRECISION: i32 = 3;

/// Longest argument encoding kept verbatim in a key.
pub const MAX_ENCODED_ARGS_LEN: usize = 200;

// == Key Argument ==
/// A primitive key argument.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyArg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl KeyArg {
    fn to_json(&self) -> Value {
        match self {
            KeyArg::Str(s) => Value::String(s.clone()),
            KeyArg::Int(i) => Value::Number((*i).into()),
            KeyArg::Float(f) => Number::from_f64(CacheKeyspace::round_coord(*f))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            KeyArg::Bool(b) => Value::Bool(*b),
            KeyArg::Null => Value::Null,
        }
    }
}

impl From<&str> for KeyArg {
    fn from(v: &str) -> Self {
        KeyArg::Str(v.to_string())
    }
}

impl From<String> for KeyArg {
    fn from(v: String) -> Self {
        KeyArg::Str(v)
    }
}

impl From<i64> for KeyArg {
    fn from(v: i64) -> Self {
        KeyArg::Int(v)
    }
}

impl From<i32> for KeyArg {
    fn from(v: i32) -> Self {
        KeyArg::Int(v.into())
    }
}

impl From<u32> for KeyArg {
    fn from(v: u32) -> Self {
        KeyArg::Int(v.into())
    }
}

impl From<f64> for KeyArg {
    fn from(v: f64) -> Self {
        KeyArg::Float(v)
    }
}

impl From<bool> for KeyArg {
    fn from(v: bool) -> Self {
        KeyArg::Bool(v)
    }
}

impl<T: Into<KeyArg>> From<Option<T>> for KeyArg {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(KeyArg::Null)
    }
}

// == Cache Keyspace ==
/// Builder of domain-prefixed cache keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheKeyspace;

impl CacheKeyspace {
    /// Builds the key for `domain` and `args`. Never fails.
    ///
    /// Argument order is irrelevant; a repeated name keeps its last value.
    pub fn build(domain: &str, args: &[(&str, KeyArg)]) -> String {
        let sorted: BTreeMap<&str, Value> = args
            .iter()
            .map(|(name, value)| (*name, value.to_json()))
            .collect();

        let mut object = Map::new();
        for (name, value) in sorted {
            object.insert(name.to_string(), value);
        }
        let encoded = Value::Object(object).to_string();

        Self::with_domain(domain, &encoded)
    }

    /// Builds a key from an already-normalised string argument.
    pub fn with_domain(domain: &str, encoded: &str) -> String {
        if encoded.len() > MAX_ENCODED_ARGS_LEN {
            format!("{}:#{}", domain, Self::digest(encoded))
        } else {
            format!("{}:{}", domain, encoded)
        }
    }

    /// Rounds a coordinate to [`COORD_PRECISION`] decimals.
    pub fn round_coord(value: f64) -> f64 {
        let scale = 10f64.powi(COORD_PRECISION);
        // Adding 0.0 folds -0.0 into 0.0 so both encode identically.
        (value * scale).round() / scale + 0.0
    }

    fn digest(input: &str) -> String {
        format!("{:x}", Sha256::digest(input.as_bytes()))
    }
}
