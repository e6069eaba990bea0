//! Schema-directed Borsh encoder.
//!
//! Layout (little-endian throughout): fixed-width integers and floats;
//! `bool` as one byte; `unit` as nothing; strings, vectors, sets and maps
//! behind a `u32` count; options and enums behind a one-byte tag; fixed
//! arrays and structs as plain concatenation. Sets and maps are written in
//! the value's own order, never re-sorted.
use std::borrow::Cow;
use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::path::{Path, Segment};
use crate::projection::{coerce_float, coerce_large_int, coerce_small_int, IntoValue};
use crate::schema::{Fields, Primitive, Schema, Variants, VectorNode};
use crate::value::Value;

pub fn encode(schema: &Schema, value: &Value) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode(schema, value)?;
    let bytes = encoder.finish();
    debug!(schema = schema.kind(), bytes = bytes.len(), "encoded value");
    Ok(bytes)
}

/// Encode a native Rust value through its permissive [`IntoValue`] form.
pub fn encode_from<T: IntoValue>(schema: &Schema, value: T) -> Result<Vec<u8>> {
    encode(schema, &value.into_value())
}

/// Appends encodings to one growing buffer.
///
/// A failed [`Encoder::encode`] leaves nothing behind: the buffer is rolled
/// back to where that call started.
#[derive(Debug, Default)]
pub struct Encoder {
    out: Vec<u8>,
    path: Path,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { out: Vec::with_capacity(capacity), path: Path::root() }
    }

    pub fn encode(&mut self, schema: &Schema, value: &Value) -> Result<()> {
        let start = self.out.len();
        self.path = Path::root();
        let result = self.value(schema, value);
        if result.is_err() {
            self.out.truncate(start);
        }
        result
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }

    fn scoped<T>(&mut self, segment: Segment, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }

    fn value(&mut self, schema: &Schema, value: &Value) -> Result<()> {
        match schema {
            Schema::Primitive(p) => self.primitive(*p, value),
            Schema::Option(inner) => match value {
                Value::Null => {
                    self.out.push(0);
                    Ok(())
                }
                present => {
                    self.out.push(1);
                    self.scoped(Segment::Some, |this| this.value(inner, present))
                }
            },
            Schema::FixedArray { inner, len } => {
                let items = self.elements(schema, value)?;
                if items.len() != *len {
                    return Err(Error::mismatch(
                        &self.path,
                        format!("{len} elements"),
                        format!("{} elements", items.len()),
                    ));
                }
                self.sequence(inner, &items)
            }
            Schema::Vector(node) => self.vector(schema, node, value),
            Schema::Set(inner) => {
                let items = self.elements(schema, value)?;
                self.count(items.len(), inner.is_zero_sized())?;
                self.set(inner, &items)
            }
            Schema::Map { key, value: value_schema } => self.map(key, value_schema, value),
            Schema::Struct(fields) => self.structure(fields, value),
            Schema::Enum(variants) => self.enumeration(variants, value),
        }
    }

    fn primitive(&mut self, p: Primitive, value: &Value) -> Result<()> {
        match p {
            Primitive::Unit => match value {
                Value::Unit | Value::Null => Ok(()),
                Value::Struct(fields) if fields.is_empty() => Ok(()),
                other => Err(Error::mismatch(&self.path, p, other.kind())),
            },
            Primitive::Bool => match value {
                Value::Bool(b) => {
                    self.out.push(u8::from(*b));
                    Ok(())
                }
                other => Err(Error::mismatch(&self.path, p, other.kind())),
            },
            Primitive::String => match value {
                Value::String(s) => {
                    self.length(s.len())?;
                    self.out.extend_from_slice(s.as_bytes());
                    Ok(())
                }
                other => Err(Error::mismatch(&self.path, p, other.kind())),
            },
            Primitive::F32 => {
                let f = coerce_float(value, p, &self.path)?;
                let narrowed = f as f32;
                if f.is_finite() && narrowed.is_infinite() {
                    return Err(Error::mismatch(&self.path, "a value within f32 range", f));
                }
                self.out.extend_from_slice(&narrowed.to_le_bytes());
                Ok(())
            }
            Primitive::F64 => {
                let f = coerce_float(value, p, &self.path)?;
                self.out.extend_from_slice(&f.to_le_bytes());
                Ok(())
            }
            Primitive::U8 => self.small::<u8>(p, value),
            Primitive::U16 => self.small::<u16>(p, value),
            Primitive::U32 => self.small::<u32>(p, value),
            Primitive::I8 => self.small::<i8>(p, value),
            Primitive::I16 => self.small::<i16>(p, value),
            Primitive::I32 => self.small::<i32>(p, value),
            Primitive::U64 => self.large::<u64>(p, value),
            Primitive::U128 => self.large::<u128>(p, value),
            Primitive::I64 => self.large::<i64>(p, value),
            Primitive::I128 => self.large::<i128>(p, value),
        }
    }

    fn small<T>(&mut self, p: Primitive, value: &Value) -> Result<()>
    where
        T: TryFrom<i64> + LeBytes,
    {
        let n = coerce_small_int(value, p, &self.path)?;
        let n = T::try_from(n).map_err(|_| Error::out_of_range(&self.path, n, p))?;
        n.write_le(&mut self.out);
        Ok(())
    }

    fn large<T>(&mut self, p: Primitive, value: &Value) -> Result<()>
    where
        T: for<'a> TryFrom<&'a num_bigint::BigInt> + LeBytes,
    {
        let big = coerce_large_int(value, p, &self.path)?;
        let n = T::try_from(&big).map_err(|_| Error::out_of_range(&self.path, &big, p))?;
        n.write_le(&mut self.out);
        Ok(())
    }

    fn length(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| Error::out_of_range(&self.path, len, "u32 length prefix"))?;
        self.out.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    /// Collection count; non-empty collections of zero-sized elements are
    /// refused so that encode and decode accept the same byte strings.
    fn count(&mut self, len: usize, zero_sized: bool) -> Result<()> {
        if zero_sized && len > 0 {
            return Err(Error::ZeroSizedElements { path: self.path.clone(), len });
        }
        self.length(len)
    }

    /// Elements of a sequence-shaped value; typed arrays are expanded.
    fn elements<'v>(&self, schema: &Schema, value: &'v Value) -> Result<Cow<'v, [Value]>> {
        match value {
            Value::Seq(items) => Ok(Cow::Borrowed(items.as_slice())),
            Value::Array(array) => Ok(Cow::Owned(array.to_values())),
            other => Err(Error::mismatch(&self.path, schema.kind(), other.kind())),
        }
    }

    fn sequence(&mut self, inner: &Schema, items: &[Value]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            self.scoped(Segment::Index(i), |this| this.value(inner, item))?;
        }
        Ok(())
    }

    fn vector(&mut self, schema: &Schema, node: &VectorNode, value: &Value) -> Result<()> {
        if let Value::Array(array) = value {
            if Some(array.kind()) == node.numeric() {
                self.length(array.len())?;
                array.write_le(&mut self.out);
                return Ok(());
            }
        }
        let items = self.elements(schema, value)?;
        self.count(items.len(), node.inner().is_zero_sized())?;
        self.sequence(node.inner(), &items)
    }

    fn set(&mut self, inner: &Schema, items: &[Value]) -> Result<()> {
        let mut seen: HashSet<Vec<u8>> = HashSet::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            self.scoped(Segment::Index(i), |this| {
                let start = this.out.len();
                this.value(inner, item)?;
                if !seen.insert(this.out[start..].to_vec()) {
                    return Err(Error::DuplicateSetElement { path: this.path.clone() });
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn map(&mut self, key_schema: &Schema, value_schema: &Schema, value: &Value) -> Result<()> {
        let entries: Vec<(Cow<'_, Value>, &Value)> = match value {
            Value::Map(pairs) => pairs.iter().map(|(k, v)| (Cow::Borrowed(k), v)).collect(),
            Value::Struct(fields) => fields.iter()
                .map(|(k, v)| (Cow::Owned(Value::String(k.clone())), v))
                .collect(),
            // `[[key, value], ...]`, the JSON rendering of a decoded map
            Value::Seq(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::Seq(pair) if pair.len() == 2 => entries.push((Cow::Borrowed(&pair[0]), &pair[1])),
                        other => {
                            let mut path = self.path.clone();
                            path.push(Segment::Index(i));
                            return Err(Error::mismatch(&path, "[key, value] pair", other.kind()));
                        }
                    }
                }
                entries
            }
            other => return Err(Error::mismatch(&self.path, "map", other.kind())),
        };
        self.count(entries.len(), key_schema.is_zero_sized() && value_schema.is_zero_sized())?;
        let mut seen: HashSet<Vec<u8>> = HashSet::with_capacity(entries.len());
        for (i, (k, v)) in entries.iter().enumerate() {
            self.scoped(Segment::Key(i), |this| {
                let start = this.out.len();
                this.value(key_schema, k)?;
                if !seen.insert(this.out[start..].to_vec()) {
                    return Err(Error::DuplicateSetElement { path: this.path.clone() });
                }
                Ok(())
            })?;
            self.scoped(Segment::Value(i), |this| this.value(value_schema, v))?;
        }
        Ok(())
    }

    /// Fields in declaration order; fields the schema does not name are ignored.
    fn structure(&mut self, fields: &Fields, value: &Value) -> Result<()> {
        let Value::Struct(given) = value else {
            return Err(Error::mismatch(&self.path, "struct", value.kind()));
        };
        for (name, field_schema) in fields.iter() {
            let Some(field) = given.get(name) else {
                return Err(Error::mismatch(&self.path, format!("field `{name}`"), "nothing"));
            };
            self.scoped(Segment::Field(name.to_owned()), |this| this.value(field_schema, field))?;
        }
        Ok(())
    }

    fn enumeration(&mut self, variants: &Variants, value: &Value) -> Result<()> {
        let (name, payload) = match value {
            Value::Enum(name, payload) => (name.as_str(), payload.as_ref()),
            Value::Struct(fields) => match fields.first() {
                Some((name, payload)) if fields.len() == 1 => (name.as_str(), payload),
                _ => {
                    return Err(Error::mismatch(
                        &self.path,
                        "exactly one variant key",
                        format!("{} keys", fields.len()),
                    ));
                }
            },
            other => return Err(Error::mismatch(&self.path, "enum", other.kind())),
        };
        let Some((index, payload_schema)) = variants.find(name) else {
            return Err(Error::UnknownEnumVariant {
                path: self.path.clone(),
                variant: name.to_owned(),
            });
        };
        // builder caps variants at 256, so the index fits a byte
        self.out.push(index as u8);
        self.scoped(Segment::Variant(name.to_owned()), |this| this.value(payload_schema, payload))
    }
}

/// Fixed-width little-endian emission for the integer primitives.
trait LeBytes {
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! le_bytes {
    ($($t:ty),*) => {$(
        impl LeBytes for $t {
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }
    )*};
}

le_bytes!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NumericArray;
    use num_bigint::BigInt;

    fn status() -> Schema {
        Schema::enum_from_pairs([
            ("Pending", Schema::UNIT),
            ("Fulfilled", Schema::UNIT),
            ("Rejected", Schema::UNIT),
        ]).unwrap()
    }

    #[test]
    fn string_is_length_prefixed_utf8() {
        let bytes = encode(&Schema::STRING, &Value::String("hi".into())).unwrap();
        assert_eq!(bytes, [0x02, 0x00, 0x00, 0x00, 0x68, 0x69]);
    }

    #[test]
    fn enum_writes_declared_index() {
        let rejected = Value::record([("Rejected", Value::record::<&str, _>([]))]);
        assert_eq!(encode(&status(), &rejected).unwrap(), [0x02]);
        assert_eq!(encode(&status(), &Value::variant("Pending", Value::Unit)).unwrap(), [0x00]);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let err = encode(&status(), &Value::variant("Cancelled", Value::Unit)).unwrap_err();
        assert_eq!(err, Error::UnknownEnumVariant { path: Path::root(), variant: "Cancelled".into() });

        let two_keys = Value::record([("Pending", Value::Unit), ("Rejected", Value::Unit)]);
        assert!(matches!(encode(&status(), &two_keys), Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn integers_are_fixed_width_little_endian() {
        assert_eq!(encode(&Schema::U16, &Value::Int(0x0102)).unwrap(), [0x02, 0x01]);
        assert_eq!(encode(&Schema::I32, &Value::Int(-2)).unwrap(), [0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(encode(&Schema::U8, &Value::Float(7.0)).unwrap(), [7]);
        let bytes = encode(&Schema::I128, &Value::Int(-1)).unwrap();
        assert_eq!(bytes, [0xff; 16]);
    }

    #[test]
    fn out_of_range_integers_fail() {
        assert!(matches!(encode(&Schema::U8, &Value::Int(256)), Err(Error::IntegerOutOfRange { .. })));
        assert!(matches!(encode(&Schema::U64, &Value::Int(-1)), Err(Error::IntegerOutOfRange { .. })));
        assert!(matches!(encode(&Schema::I8, &Value::Float(0.5)), Err(Error::IntegerOutOfRange { .. })));
        let too_big = Value::BigInt(BigInt::from(u128::MAX) + 1u32);
        assert!(matches!(encode(&Schema::U128, &too_big), Err(Error::IntegerOutOfRange { .. })));
    }

    #[test]
    fn large_int_representations_encode_identically() {
        let max = u128::MAX;
        let from_str = encode(&Schema::U128, &Value::String(max.to_string())).unwrap();
        let from_big = encode(&Schema::U128, &Value::BigInt(BigInt::from(max))).unwrap();
        assert_eq!(from_str, from_big);
        assert_eq!(from_big, [0xff; 16]);
        assert_eq!(
            encode(&Schema::U64, &Value::Int(5)).unwrap(),
            encode_from(&Schema::U64, 5u64).unwrap()
        );
    }

    #[test]
    fn floats_bools_unit_and_options() {
        assert_eq!(encode(&Schema::F32, &Value::Float(1.5)).unwrap(), 1.5f32.to_le_bytes());
        assert_eq!(encode(&Schema::F64, &Value::Int(2)).unwrap(), 2.0f64.to_le_bytes());
        assert_eq!(encode(&Schema::BOOL, &Value::Bool(true)).unwrap(), [1]);
        assert!(encode(&Schema::UNIT, &Value::Unit).unwrap().is_empty());
        let opt = Schema::option(Schema::U16);
        assert_eq!(encode(&opt, &Value::Null).unwrap(), [0]);
        assert_eq!(encode(&opt, &Value::Int(1)).unwrap(), [1, 1, 0]);
    }

    #[test]
    fn fixed_array_length_is_enforced() {
        let schema = Schema::fixed_array(Schema::U8, 3);
        let ok = Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(encode(&schema, &ok).unwrap(), [1, 2, 3]);
        let short = Value::Seq(vec![Value::Int(1)]);
        assert!(matches!(encode(&schema, &short), Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn typed_arrays_take_the_fast_path() {
        let schema = Schema::vector(Schema::F32);
        let typed = encode(&schema, &Value::Array(NumericArray::F32(vec![1.5, -2.5]))).unwrap();
        let generic = encode(&schema, &Value::Seq(vec![Value::Float(1.5), Value::Float(-2.5)])).unwrap();
        assert_eq!(typed, generic);
        assert_eq!(&typed[..4], [2, 0, 0, 0]);

        // a typed array of another kind still goes through range checks
        let narrow = Schema::vector(Schema::U8);
        let wide = Value::Array(NumericArray::U16(vec![1, 300]));
        let err = encode(&narrow, &wide).unwrap_err();
        assert_eq!(err.path().map(|p| p.to_string()).as_deref(), Some("$[1]"));
    }

    #[test]
    fn sets_reject_duplicates_without_reordering() {
        let schema = Schema::set(Schema::STRING);
        let ok = Value::Seq(vec![Value::String("b".into()), Value::String("a".into())]);
        assert_eq!(encode(&schema, &ok).unwrap(), [2, 0, 0, 0, 1, 0, 0, 0, b'b', 1, 0, 0, 0, b'a']);
        let dup = Value::Seq(vec![Value::String("a".into()), Value::String("a".into())]);
        let err = encode(&schema, &dup).unwrap_err();
        assert_eq!(err, Error::DuplicateSetElement { path: {
            let mut p = Path::root();
            p.push(Segment::Index(1));
            p
        }});
    }

    #[test]
    fn maps_keep_source_order_and_accept_objects() {
        let schema = Schema::map(Schema::STRING, Schema::U8);
        let pairs = Value::Map(vec![
            (Value::String("z".into()), Value::Int(1)),
            (Value::String("a".into()), Value::Int(2)),
        ]);
        let object = Value::record([("z", Value::Int(1)), ("a", Value::Int(2))]);
        let expected = [2, 0, 0, 0, 1, 0, 0, 0, b'z', 1, 1, 0, 0, 0, b'a', 2];
        assert_eq!(encode(&schema, &pairs).unwrap(), expected);
        assert_eq!(encode(&schema, &object).unwrap(), expected);
    }

    #[test]
    fn decoded_map_json_encodes_again() {
        let schema = Schema::map(Schema::U8, Schema::STRING);
        let original = Value::Map(vec![(Value::Int(1), Value::String("one".into()))]);
        let bytes = encode(&schema, &original).unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 1, 3, 0, 0, 0, b'o', b'n', b'e']);

        let rendered = crate::decode::decode(&schema, &bytes).unwrap().to_json();
        assert_eq!(rendered, serde_json::json!([[1, "one"]]));
        assert_eq!(encode(&schema, &Value::from(rendered)).unwrap(), bytes);

        let ragged = Value::from(serde_json::json!([[1, "one"], [2]]));
        let err = encode(&schema, &ragged).unwrap_err();
        assert_eq!(err.to_string(), "schema mismatch at $[1]: expected [key, value] pair, found sequence");
    }

    #[test]
    fn zero_sized_collections_must_be_empty() {
        let units = Schema::vector(Schema::UNIT);
        assert_eq!(encode(&units, &Value::Seq(vec![])).unwrap(), [0, 0, 0, 0]);
        let err = encode(&units, &Value::Seq(vec![Value::Unit, Value::Unit])).unwrap_err();
        assert_eq!(err, Error::ZeroSizedElements { path: Path::root(), len: 2 });

        let unit_set = Schema::set(Schema::fixed_array(Schema::UNIT, 2));
        let one = Value::Seq(vec![Value::Seq(vec![Value::Unit, Value::Unit])]);
        assert!(matches!(encode(&unit_set, &one), Err(Error::ZeroSizedElements { len: 1, .. })));
    }

    #[test]
    fn f32_rejects_finite_values_beyond_its_range() {
        let err = encode(&Schema::F32, &Value::Float(1e300)).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }), "{err}");
        assert_eq!(encode(&Schema::F32, &Value::Float(f64::INFINITY)).unwrap(), f32::INFINITY.to_le_bytes());
        assert_eq!(encode(&Schema::F32, &Value::Float(f64::from(f32::MAX))).unwrap(), f32::MAX.to_le_bytes());
    }

    #[test]
    fn nested_option_cannot_express_inner_none() {
        let schema = Schema::option(Schema::option(Schema::U8));
        let decoded = crate::decode::decode(&schema, &[1, 0]).unwrap();
        assert_eq!(decoded, Value::Null);
        assert_eq!(encode(&schema, &decoded).unwrap(), [0]);
        assert_eq!(encode(&schema, &Value::Int(4)).unwrap(), [1, 1, 4]);
    }

    #[test]
    fn struct_field_order_changes_bytes() {
        let ab = Schema::struct_from_pairs([("a", Schema::U8), ("b", Schema::U16)]).unwrap();
        let ba = Schema::struct_from_pairs([("b", Schema::U16), ("a", Schema::U8)]).unwrap();
        let v = Value::record([("a", Value::Int(1)), ("b", Value::Int(2))]);
        assert_eq!(encode(&ab, &v).unwrap(), [1, 2, 0]);
        assert_eq!(encode(&ba, &v).unwrap(), [2, 0, 1]);
    }

    #[test]
    fn missing_field_reports_its_parent_path() {
        let inner = Schema::struct_from_pairs([("x", Schema::U8), ("y", Schema::U8)]).unwrap();
        let outer = Schema::struct_from_pairs([("point", inner)]).unwrap();
        let v = Value::record([("point", Value::record([("x", Value::Int(1))]))]);
        let err = encode(&outer, &v).unwrap_err();
        assert_eq!(err.to_string(), "schema mismatch at $.point: expected field `y`, found nothing");
    }

    #[test]
    fn encoder_rolls_back_failed_values() {
        let mut encoder = Encoder::new();
        encoder.encode(&Schema::U8, &Value::Int(1)).unwrap();
        let pair = Schema::fixed_array(Schema::U8, 2);
        assert!(encoder.encode(&pair, &Value::Seq(vec![Value::Int(2), Value::Int(999)])).is_err());
        encoder.encode(&Schema::U8, &Value::Int(3)).unwrap();
        assert_eq!(encoder.finish(), [1, 3]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let schema = Schema::map(Schema::U32, Schema::vector(Schema::STRING));
        let v = Value::Map(vec![
            (Value::Int(9), Value::Seq(vec![Value::String("x".into())])),
            (Value::Int(3), Value::Seq(vec![])),
        ]);
        assert_eq!(encode(&schema, &v).unwrap(), encode(&schema, &v).unwrap());
    }
}
