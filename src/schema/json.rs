//! JSON schema documents, using the borsh-js vocabulary:
//!
//! ```text
//! "u8" … "i128" | "f32" | "f64" | "bool" | "string" | "unit"
//! { "option": S }
//! { "array": { "type": S, "len": N } }     fixed array
//! { "array": { "type": S } }               vector
//! { "set": S }
//! { "map": { "key": K, "value": V } }
//! { "struct": { "name": S, ... } }         declaration order is kept
//! { "enum": [ { "struct": { "Name": S } }, ... ] }
//! ```
use serde_json::{json, Map, Value};

use super::{array_length, Primitive, Schema};
use crate::error::{Error, Result};
use crate::path::{Path, Segment};

pub fn from_json(doc: &Value) -> Result<Schema> {
    parse(doc, &mut Path::root())
}

pub fn from_json_str(src: &str) -> Result<Schema> {
    let doc: Value = serde_json::from_str(src)
        .map_err(|e| Error::construction(format!("schema is not valid JSON: {e}")))?;
    from_json(&doc)
}

fn parse(doc: &Value, path: &mut Path) -> Result<Schema> {
    match doc {
        Value::String(name) => Primitive::from_name(name)
            .map(Schema::primitive)
            .ok_or_else(|| invalid(path, format!("unknown type `{name}`"))),
        Value::Object(obj) => {
            let (tag, body) = single_entry(obj, path)?;
            match tag {
                "option" => Ok(Schema::option(path.scoped(Segment::Some, |p| parse(body, p))?)),
                "array" => parse_array(body, path),
                "set" => Ok(Schema::set(path.scoped(Segment::Index(0), |p| parse(body, p))?)),
                "map" => {
                    let body = expect_object(body, path)?;
                    let key = path.scoped(Segment::Key(0), |p| parse(required(body, "key", p)?, p))?;
                    let value = path.scoped(Segment::Value(0), |p| parse(required(body, "value", p)?, p))?;
                    Ok(Schema::map(key, value))
                }
                "struct" => {
                    let body = expect_object(body, path)?;
                    let mut fields = Vec::with_capacity(body.len());
                    for (name, field) in body {
                        let ty = path.scoped(Segment::Field(name.clone()), |p| parse(field, p))?;
                        fields.push((name.clone(), ty));
                    }
                    Schema::struct_from_pairs(fields)
                }
                "enum" => {
                    let Value::Array(items) = body else {
                        return Err(invalid(path, "`enum` expects an array of single-field structs"));
                    };
                    let mut variants = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        let variant = path.scoped(Segment::Index(i), |p| parse_variant(item, p))?;
                        variants.push(variant);
                    }
                    Schema::enum_from_pairs(variants)
                }
                other => Err(invalid(path, format!("unknown schema tag `{other}`"))),
            }
        }
        other => Err(invalid(path, format!("unexpected schema node {other}"))),
    }
}

fn parse_array(body: &Value, path: &mut Path) -> Result<Schema> {
    let body = expect_object(body, path)?;
    let inner = path.scoped(Segment::Index(0), |p| parse(required(body, "type", p)?, p))?;
    match body.get("len") {
        None | Some(Value::Null) => Ok(Schema::vector(inner)),
        Some(Value::Number(n)) => Ok(Schema::fixed_array(inner, array_length(n)?)),
        Some(other) => Err(invalid(path, format!("array length {other} is not an integer"))),
    }
}

fn parse_variant(item: &Value, path: &mut Path) -> Result<(String, Schema)> {
    let obj = expect_object(item, path)?;
    let (tag, body) = single_entry(obj, path)?;
    if tag != "struct" {
        return Err(invalid(path, "enum variants must be written as { \"struct\": { Name: S } }"));
    }
    let body = expect_object(body, path)?;
    let (name, payload) = single_entry(body, path)?;
    let payload = path.scoped(Segment::Variant(name.to_owned()), |p| parse(payload, p))?;
    Ok((name.to_owned(), payload))
}

// ------------------------------- Emission --------------------------------- //

pub fn to_json(schema: &Schema) -> Value {
    match schema {
        Schema::Primitive(p) => Value::from(p.name()),
        Schema::Option(inner) => json!({ "option": to_json(inner) }),
        Schema::FixedArray { inner, len } => json!({ "array": { "type": to_json(inner), "len": len } }),
        Schema::Vector(node) => json!({ "array": { "type": to_json(node.inner()) } }),
        Schema::Set(inner) => json!({ "set": to_json(inner) }),
        Schema::Map { key, value } => json!({ "map": { "key": to_json(key), "value": to_json(value) } }),
        Schema::Struct(fields) => {
            let body: Map<String, Value> = fields.iter()
                .map(|(name, ty)| (name.to_owned(), to_json(ty)))
                .collect();
            json!({ "struct": body })
        }
        Schema::Enum(variants) => {
            let items: Vec<Value> = variants.iter()
                .map(|(name, ty)| json!({ "struct": { name: to_json(ty) } }))
                .collect();
            json!({ "enum": items })
        }
    }
}

// ------------------------------- Helpers ---------------------------------- //

fn invalid(path: &Path, msg: impl std::fmt::Display) -> Error {
    if path.is_root() {
        Error::construction(msg.to_string())
    } else {
        Error::construction(format!("{msg} (at {path})"))
    }
}

fn expect_object<'a>(v: &'a Value, path: &Path) -> Result<&'a Map<String, Value>> {
    v.as_object().ok_or_else(|| invalid(path, format!("expected an object, found {v}")))
}

fn single_entry<'a>(obj: &'a Map<String, Value>, path: &Path) -> Result<(&'a str, &'a Value)> {
    let mut it = obj.iter();
    match (it.next(), it.next()) {
        (Some((k, v)), None) => Ok((k.as_str(), v)),
        _ => Err(invalid(path, format!("expected exactly one key, found {}", obj.len()))),
    }
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str, path: &Path) -> Result<&'a Value> {
    obj.get(key).ok_or_else(|| invalid(path, format!("missing `{key}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NumericKind;

    #[test]
    fn parses_every_shape() {
        let doc = json!({
            "struct": {
                "label": "string",
                "samples": { "array": { "type": "f32" } },
                "digest": { "array": { "type": "u8", "len": 32 } },
                "tags": { "set": "string" },
                "balances": { "map": { "key": "string", "value": "u128" } },
                "parent": { "option": "u64" },
                "status": { "enum": [
                    { "struct": { "Pending": "unit" } },
                    { "struct": { "Failed": { "struct": { "code": "i32" } } } }
                ] }
            }
        });
        let schema = from_json(&doc).unwrap();
        assert_eq!(
            schema.to_string(),
            "struct { label: string, samples: vec<f32>, digest: [u8; 32], tags: set<string>, \
             balances: map<string, u128>, parent: option<u64>, \
             status: enum { Pending(unit), Failed(struct { code: i32 }) } }"
        );
        let Schema::Struct(fields) = &schema else { panic!("struct") };
        let Some(Schema::Vector(node)) = fields.get("samples") else { panic!("vector") };
        assert_eq!(node.numeric(), Some(NumericKind::F32));
    }

    #[test]
    fn emission_parses_back_to_the_same_schema() {
        let doc = json!({ "enum": [
            { "struct": { "A": { "map": { "key": "u8", "value": { "array": { "type": "bool", "len": 2 } } } } } },
            { "struct": { "B": { "option": { "set": "i16" } } } }
        ]});
        let schema = from_json(&doc).unwrap();
        assert_eq!(to_json(&schema), doc);
        assert_eq!(from_json(&to_json(&schema)).unwrap(), schema);
    }

    #[test]
    fn rejects_duplicate_variants() {
        let doc = json!({ "enum": [
            { "struct": { "A": "unit" } },
            { "struct": { "A": "u8" } }
        ]});
        let err = from_json(&doc).unwrap_err();
        assert_eq!(err, Error::construction("duplicate enum variant `A`"));
    }

    #[test]
    fn rejects_bad_lengths_with_location() {
        let doc = json!({ "struct": { "xs": { "array": { "type": "u8", "len": -3 } } } });
        let err = from_json(&doc).unwrap_err();
        assert!(matches!(err, Error::SchemaConstruction(ref m) if m.contains("negative")), "{err}");

        let doc = json!({ "array": { "type": "u8", "len": 1.5 } });
        assert!(from_json(&doc).is_err());

        let doc = json!({ "struct": { "x": "u256" } });
        let err = from_json(&doc).unwrap_err();
        assert!(err.to_string().contains("at $.x"), "{err}");
    }
}
