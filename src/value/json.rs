//! Conversions between JSON documents and value trees.
//!
//! JSON → value is schema-agnostic: the encoder's permissive coercions do the
//! rest (decimal strings for large integers, objects for maps and enums).
//! Value → JSON writes big integers as decimal strings so no precision is
//! lost, unit as `{}`, enums as `{ "Variant": payload }` and maps as
//! `[[key, value], ...]`.
use num_bigint::BigInt;
use serde_json::{Map, Number};

use super::Value;

impl From<serde_json::Value> for Value {
    fn from(doc: serde_json::Value) -> Self {
        match doc {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => from_number(&n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(xs) => Value::Seq(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Struct(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

fn from_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(u) = n.as_u64() {
        Value::BigInt(BigInt::from(u))
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl Value {
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Unit => J::Object(Map::new()),
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::from(*i),
            // JSON has no NaN/inf
            Value::Float(f) => Number::from_f64(*f).map(J::Number).unwrap_or(J::Null),
            Value::BigInt(b) => J::String(b.to_string()),
            Value::String(s) => J::String(s.clone()),
            Value::Seq(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
            Value::Array(a) => J::Array(a.to_values().iter().map(Value::to_json).collect()),
            Value::Map(pairs) => J::Array(
                pairs.iter()
                    .map(|(k, v)| J::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
            Value::Struct(fields) => J::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Enum(name, payload) => {
                let mut m = Map::new();
                m.insert(name.clone(), payload.to_json());
                J::Object(m)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NumericArray;
    use serde_json::json;

    #[test]
    fn numbers_pick_the_narrowest_representation() {
        assert_eq!(Value::from(json!(-5)), Value::Int(-5));
        assert_eq!(Value::from(json!(u64::MAX)), Value::BigInt(BigInt::from(u64::MAX)));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn objects_keep_key_order() {
        let v = Value::from(json!({ "z": 1, "a": [true, null] }));
        assert_eq!(
            v,
            Value::record([
                ("z", Value::Int(1)),
                ("a", Value::Seq(vec![Value::Bool(true), Value::Null])),
            ])
        );
    }

    #[test]
    fn decoded_forms_render_losslessly() {
        let v = Value::record([
            ("big", Value::BigInt(BigInt::from(u128::MAX))),
            ("unit", Value::Unit),
            ("status", Value::variant("Rejected", Value::Unit)),
            ("xs", Value::Array(NumericArray::F32(vec![1.5, -2.5]))),
            ("m", Value::Map(vec![(Value::Int(1), Value::String("one".into()))])),
        ]);
        assert_eq!(
            v.to_json(),
            json!({
                "big": "340282366920938463463374607431768211455",
                "unit": {},
                "status": { "Rejected": {} },
                "xs": [1.5, -2.5],
                "m": [[1, "one"]]
            })
        );
    }
}
