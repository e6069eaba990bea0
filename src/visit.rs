//! Post-decode pass: rebuild typed numeric arrays wherever the schema has a
//! numeric vector, at any depth.
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::path::{Path, Segment};
use crate::schema::Schema;
use crate::value::{NumericArray, Value};

/// Rewrite every `Seq` sitting under a numeric vector schema into a
/// [`NumericArray`] of the matching element kind. Everything else passes
/// through unchanged; the value must already have the schema's shape.
pub fn materialize(schema: &Schema, value: Value) -> Result<Value> {
    walk(schema, value, &mut Path::root())
}

fn walk(schema: &Schema, value: Value, path: &mut Path) -> Result<Value> {
    match (schema, value) {
        (Schema::Vector(node), Value::Seq(items)) => match node.numeric() {
            Some(kind) => NumericArray::from_values(kind, &items)
                .map(Value::Array)
                .ok_or_else(|| Error::mismatch(path, format!("vec<{kind}>"), "mixed elements")),
            None => sequence(node.inner(), items, path),
        },
        (Schema::Vector(node), Value::Array(array)) => match node.numeric() {
            Some(kind) if kind == array.kind() => Ok(Value::Array(array)),
            _ => Err(Error::mismatch(path, schema, format!("{} array", array.kind()))),
        },
        (Schema::FixedArray { inner, .. } | Schema::Set(inner), Value::Seq(items)) => {
            sequence(inner, items, path)
        }
        (Schema::Option(_), Value::Null) => Ok(Value::Null),
        (Schema::Option(inner), value) => path.scoped(Segment::Some, |path| walk(inner, value, path)),
        (Schema::Map { key, value: value_schema }, Value::Map(pairs)) => pairs
            .into_iter()
            .enumerate()
            .map(|(i, (k, v))| -> Result<(Value, Value)> {
                let k = path.scoped(Segment::Key(i), |path| walk(key, k, path))?;
                let v = path.scoped(Segment::Value(i), |path| walk(value_schema, v, path))?;
                Ok((k, v))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Map),
        (Schema::Struct(fields), Value::Struct(mut raw)) => {
            let mut out = IndexMap::with_capacity(fields.len());
            for (name, field_schema) in fields.iter() {
                let Some(v) = raw.swap_remove(name) else {
                    return Err(Error::mismatch(path, format!("field `{name}`"), "nothing"));
                };
                let v = path.scoped(Segment::Field(name.to_owned()), |path| walk(field_schema, v, path))?;
                out.insert(name.to_owned(), v);
            }
            Ok(Value::Struct(out))
        }
        (Schema::Enum(variants), Value::Enum(name, payload)) => {
            let Some(payload_schema) = variants.get(&name) else {
                return Err(Error::UnknownEnumVariant { path: path.clone(), variant: name });
            };
            let payload = path.scoped(Segment::Variant(name.clone()), |path| walk(payload_schema, *payload, path))?;
            Ok(Value::Enum(name, Box::new(payload)))
        }
        (Schema::Primitive(_), value) => Ok(value),
        (schema, value) => Err(Error::mismatch(path, schema, value.kind())),
    }
}

fn sequence(inner: &Schema, items: Vec<Value>, path: &mut Path) -> Result<Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| path.scoped(Segment::Index(i), |path| walk(inner, item, path)))
        .collect::<Result<Vec<_>>>()
        .map(Value::Seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, decode_raw};
    use crate::encode::encode;

    fn reading() -> Schema {
        Schema::struct_from_pairs([
            ("label", Schema::STRING),
            ("samples", Schema::vector(Schema::F32)),
        ]).unwrap()
    }

    #[test]
    fn float_samples_come_back_as_a_typed_array() {
        let value = Value::record([
            ("label", Value::String("t".into())),
            ("samples", Value::Seq(vec![Value::Float(1.5), Value::Float(-2.5)])),
        ]);
        let bytes = encode(&reading(), &value).unwrap();
        assert_eq!(bytes.len(), 4 + 1 + 4 + 2 * 4);

        let raw = decode_raw(&reading(), &bytes).unwrap();
        assert!(matches!(raw.get("samples"), Some(Value::Seq(_))));

        let decoded = decode(&reading(), &bytes).unwrap();
        assert_eq!(decoded.get("samples"), Some(&Value::Array(NumericArray::F32(vec![1.5, -2.5]))));
        assert_eq!(decoded.get("label"), Some(&Value::String("t".into())));
    }

    #[test]
    fn reaches_vectors_nested_in_every_container() {
        let schema = Schema::struct_from_pairs([
            ("grid", Schema::fixed_array(Schema::vector(Schema::U8), 2)),
            ("by_name", Schema::map(Schema::STRING, Schema::vector(Schema::I64))),
            ("maybe", Schema::option(Schema::vector(Schema::U16))),
            ("shape", Schema::enum_from_pairs([
                ("Empty", Schema::UNIT),
                ("Points", Schema::vector(Schema::F64)),
            ]).unwrap()),
            ("names", Schema::vector(Schema::STRING)),
        ]).unwrap();
        let raw = Value::record([
            ("grid", Value::Seq(vec![
                Value::Seq(vec![Value::Int(1), Value::Int(2)]),
                Value::Seq(vec![]),
            ])),
            ("by_name", Value::Map(vec![(
                Value::String("a".into()),
                Value::Seq(vec![Value::BigInt((-5).into())]),
            )])),
            ("maybe", Value::Seq(vec![Value::Int(9)])),
            ("shape", Value::variant("Points", Value::Seq(vec![Value::Float(0.5)]))),
            ("names", Value::Seq(vec![Value::String("x".into())])),
        ]);

        let out = materialize(&schema, raw).unwrap();
        assert_eq!(
            out.get("grid"),
            Some(&Value::Seq(vec![
                Value::Array(NumericArray::U8(vec![1, 2])),
                Value::Array(NumericArray::U8(vec![])),
            ]))
        );
        assert_eq!(
            out.get("by_name"),
            Some(&Value::Map(vec![(
                Value::String("a".into()),
                Value::Array(NumericArray::I64(vec![-5])),
            )]))
        );
        assert_eq!(out.get("maybe"), Some(&Value::Array(NumericArray::U16(vec![9]))));
        assert_eq!(
            out.get("shape"),
            Some(&Value::variant("Points", Value::Array(NumericArray::F64(vec![0.5]))))
        );
        assert_eq!(out.get("names"), Some(&Value::Seq(vec![Value::String("x".into())])));
    }

    #[test]
    fn element_out_of_kind_range_is_a_mismatch() {
        let err = materialize(&Schema::vector(Schema::U8), Value::Seq(vec![Value::Int(256)])).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }
}
