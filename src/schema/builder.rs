//! Constructors for every schema shape.
//!
//! Map-typed inputs (`IndexMap`) cannot carry duplicate names, so those
//! constructors only fail on limits. Pair sequences are checked for
//! duplicates here, at construction time, never during serialization.
use indexmap::IndexMap;
use indexmap::map::Entry;

use super::{Fields, Schema, Variants, VectorNode};
use crate::error::{Error, Result};

impl Schema {
    pub fn option(inner: Schema) -> Self {
        Schema::Option(Box::new(inner))
    }

    pub fn fixed_array(inner: Schema, len: usize) -> Self {
        Schema::FixedArray { inner: Box::new(inner), len }
    }

    /// A vector of a numeric primitive is tagged with that kind so decoding
    /// can materialize a typed array; the wire format does not change.
    pub fn vector(inner: Schema) -> Self {
        let numeric = inner.as_primitive().and_then(|p| p.numeric_kind());
        Schema::Vector(VectorNode { inner: Box::new(inner), numeric })
    }

    pub fn set(inner: Schema) -> Self {
        Schema::Set(Box::new(inner))
    }

    pub fn map(key: Schema, value: Schema) -> Self {
        Schema::Map { key: Box::new(key), value: Box::new(value) }
    }

    /// Zero fields is a valid, unit-like struct.
    pub fn structure(fields: IndexMap<String, Schema>) -> Self {
        Schema::Struct(Fields(fields))
    }

    pub fn struct_from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let fields = collect_unique(pairs, "struct field")?;
        Ok(Self::structure(fields))
    }

    pub fn enumeration(variants: IndexMap<String, Schema>) -> Result<Self> {
        if variants.len() > Variants::MAX {
            return Err(Error::construction(format!(
                "enum declares {} variants; a one-byte discriminant allows at most {}",
                variants.len(),
                Variants::MAX
            )));
        }
        Ok(Schema::Enum(Variants(variants)))
    }

    pub fn enum_from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let variants = collect_unique(pairs, "enum variant")?;
        Self::enumeration(variants)
    }
}

fn collect_unique<I, K>(pairs: I, what: &str) -> Result<IndexMap<String, Schema>>
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    let mut out = IndexMap::new();
    for (name, schema) in pairs {
        match out.entry(name.into()) {
            Entry::Occupied(slot) => {
                return Err(Error::construction(format!("duplicate {what} `{}`", slot.key())));
            }
            Entry::Vacant(slot) => {
                slot.insert(schema);
            }
        }
    }
    Ok(out)
}

/// Validate a fixed-array length coming from an untyped source.
pub fn array_length(raw: &serde_json::Number) -> Result<usize> {
    if let Some(n) = raw.as_u64() {
        return usize::try_from(n)
            .map_err(|_| Error::construction(format!("array length {n} is too large")));
    }
    if raw.as_i64().is_some() {
        return Err(Error::construction(format!("array length {raw} is negative")));
    }
    match raw.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => {
            Ok(f as usize)
        }
        Some(f) if f.is_finite() && f.fract() == 0.0 && f < 0.0 => {
            Err(Error::construction(format!("array length {raw} is negative")))
        }
        _ => Err(Error::construction(format!("array length {raw} is not an integer"))),
    }
}
