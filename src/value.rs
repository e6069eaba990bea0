//! Value trees paired with schemas by the encoder and decoder.
//!
//! Encode accepts a few representations per primitive (see
//! [`crate::projection`]); decode always produces exactly one:
//!
//! | schema                    | decoded as            |
//! |---------------------------|-----------------------|
//! | u8..u32, i8..i32          | `Int`                 |
//! | u64, u128, i64, i128      | `BigInt`              |
//! | f32, f64                  | `Float`               |
//! | option                    | `Null` or the inner value |
//! | vector of a numeric kind  | `Array` (after [`crate::visit::materialize`]) |
//! | other vector, set, array  | `Seq`                 |
//! | map                       | `Map`                 |
//!
//! Maps also encode from a `Struct` (string keys) or a `Seq` of
//! `[key, value]` pairs, which is how a decoded map renders as JSON.
//!
//! `Null` is the only absent marker, so `option<option<T>>` cannot carry an
//! inner absent value: the bytes `[1, 0]` decode to `Null`, which encodes
//! back as `[0]`.
pub mod array;
pub mod json;

use indexmap::IndexMap;
use num_bigint::BigInt;

pub use array::NumericArray;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent option.
    Null,
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    BigInt(BigInt),
    String(String),
    Seq(Vec<Value>),
    Array(NumericArray),
    /// Key/value pairs in wire order.
    Map(Vec<(Value, Value)>),
    Struct(IndexMap<String, Value>),
    /// Variant name and payload.
    Enum(String, Box<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Array(_) => "numeric array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Enum(..) => "enum",
        }
    }

    pub fn variant(name: impl Into<String>, payload: Value) -> Self {
        Value::Enum(name.into(), Box::new(payload))
    }

    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
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

    pub fn as_big_int(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NumericArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.get(field),
            _ => None,
        }
    }
}

impl From<NumericArray> for Value {
    fn from(a: NumericArray) -> Self {
        Value::Array(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_insertion_order() {
        let v = Value::record([("b", Value::Int(1)), ("a", Value::Bool(true))]);
        let Value::Struct(fields) = &v else { panic!("struct") };
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(v.get("a"), Some(&Value::Bool(true)));
        assert_eq!(v.get("missing"), None);
    }

    #[test]
    fn kinds_name_the_representation() {
        assert_eq!(Value::variant("Rejected", Value::Unit).kind(), "enum");
        assert_eq!(Value::BigInt(BigInt::from(7)).kind(), "bigint");
        assert_eq!(Value::Array(NumericArray::U8(vec![1])).kind(), "numeric array");
    }
}
