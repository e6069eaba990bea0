//! Schema nodes: an immutable description of a type's Borsh wire layout.
//!
//! A schema is a closed tree: primitive leaves, or composites owning their
//! children by value. Struct and enum levels keep declaration order because
//! that order *is* the wire order (field sequence, discriminant index).
//!
//! Composites with invariants ([`VectorNode`], [`Fields`], [`Variants`]) keep
//! their contents private; build them through the constructors in
//! [`builder`].
pub mod builder;
pub mod json;

use std::fmt;
use indexmap::IndexMap;

pub use builder::array_length;

// ------------------------------ Primitives -------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    Bool,
    Unit,
}

impl Primitive {
    pub const ALL: [Primitive; 15] = [
        Primitive::String,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::U128,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::I128,
        Primitive::F32,
        Primitive::F64,
        Primitive::Bool,
        Primitive::Unit,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::Unit => "unit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Encoded size in bytes; `None` for the self-delimiting `string`.
    pub const fn width(self) -> Option<usize> {
        match self {
            Primitive::String => None,
            Primitive::Unit => Some(0),
            Primitive::U8 | Primitive::I8 | Primitive::Bool => Some(1),
            Primitive::U16 | Primitive::I16 => Some(2),
            Primitive::U32 | Primitive::I32 | Primitive::F32 => Some(4),
            Primitive::U64 | Primitive::I64 | Primitive::F64 => Some(8),
            Primitive::U128 | Primitive::I128 => Some(16),
        }
    }

    /// 64- and 128-bit integers: permissive on encode, `BigInt` on decode.
    pub const fn is_large_int(self) -> bool {
        matches!(
            self,
            Primitive::U64 | Primitive::U128 | Primitive::I64 | Primitive::I128
        )
    }

    pub const fn numeric_kind(self) -> Option<NumericKind> {
        match self {
            Primitive::U8 => Some(NumericKind::U8),
            Primitive::U16 => Some(NumericKind::U16),
            Primitive::U32 => Some(NumericKind::U32),
            Primitive::U64 => Some(NumericKind::U64),
            Primitive::I8 => Some(NumericKind::I8),
            Primitive::I16 => Some(NumericKind::I16),
            Primitive::I32 => Some(NumericKind::I32),
            Primitive::I64 => Some(NumericKind::I64),
            Primitive::F32 => Some(NumericKind::F32),
            Primitive::F64 => Some(NumericKind::F64),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element kinds that have a fixed-width typed array representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl NumericKind {
    pub const fn primitive(self) -> Primitive {
        match self {
            NumericKind::U8 => Primitive::U8,
            NumericKind::U16 => Primitive::U16,
            NumericKind::U32 => Primitive::U32,
            NumericKind::U64 => Primitive::U64,
            NumericKind::I8 => Primitive::I8,
            NumericKind::I16 => Primitive::I16,
            NumericKind::I32 => Primitive::I32,
            NumericKind::I64 => Primitive::I64,
            NumericKind::F32 => Primitive::F32,
            NumericKind::F64 => Primitive::F64,
        }
    }

    pub const fn size(self) -> usize {
        match self {
            NumericKind::U8 | NumericKind::I8 => 1,
            NumericKind::U16 | NumericKind::I16 => 2,
            NumericKind::U32 | NumericKind::I32 | NumericKind::F32 => 4,
            NumericKind::U64 | NumericKind::I64 | NumericKind::F64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        self.primitive().name()
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------- Nodes ----------------------------------- //

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive(Primitive),
    Option(Box<Schema>),
    FixedArray { inner: Box<Schema>, len: usize },
    Vector(VectorNode),
    Set(Box<Schema>),
    Map { key: Box<Schema>, value: Box<Schema> },
    Struct(Fields),
    Enum(Variants),
}

/// Variable-length sequence; remembers the numeric kind of its element.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorNode {
    pub(crate) inner: Box<Schema>,
    pub(crate) numeric: Option<NumericKind>,
}

impl VectorNode {
    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    /// Set iff the element is a numeric primitive with a typed array form.
    pub fn numeric(&self) -> Option<NumericKind> {
        self.numeric
    }
}

/// Struct fields in wire order. Names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields(pub(crate) IndexMap<String, Schema>);

impl Fields {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Enum variants; the position of a variant is its discriminant byte.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variants(pub(crate) IndexMap<String, Schema>);

impl Variants {
    /// Discriminants are a single byte.
    pub const MAX: usize = 256;

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.get_index_of(name)
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0.get(name)
    }

    /// Discriminant and payload schema of the named variant.
    pub fn find(&self, name: &str) -> Option<(usize, &Schema)> {
        self.0.get_full(name).map(|(i, _, v)| (i, v))
    }

    pub fn get_index(&self, index: usize) -> Option<(&str, &Schema)> {
        self.0.get_index(index).map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ------------------------------ Singletons -------------------------------- //

impl Schema {
    pub const STRING: Schema = Schema::Primitive(Primitive::String);
    pub const U8: Schema = Schema::Primitive(Primitive::U8);
    pub const U16: Schema = Schema::Primitive(Primitive::U16);
    pub const U32: Schema = Schema::Primitive(Primitive::U32);
    pub const U64: Schema = Schema::Primitive(Primitive::U64);
    pub const U128: Schema = Schema::Primitive(Primitive::U128);
    pub const I8: Schema = Schema::Primitive(Primitive::I8);
    pub const I16: Schema = Schema::Primitive(Primitive::I16);
    pub const I32: Schema = Schema::Primitive(Primitive::I32);
    pub const I64: Schema = Schema::Primitive(Primitive::I64);
    pub const I128: Schema = Schema::Primitive(Primitive::I128);
    pub const F32: Schema = Schema::Primitive(Primitive::F32);
    pub const F64: Schema = Schema::Primitive(Primitive::F64);
    pub const BOOL: Schema = Schema::Primitive(Primitive::Bool);
    pub const UNIT: Schema = Schema::Primitive(Primitive::Unit);

    pub const fn primitive(p: Primitive) -> Self {
        Schema::Primitive(p)
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Schema::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Short shape name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Schema::Primitive(p) => p.name(),
            Schema::Option(_) => "option",
            Schema::FixedArray { .. } => "fixed array",
            Schema::Vector(_) => "vector",
            Schema::Set(_) => "set",
            Schema::Map { .. } => "map",
            Schema::Struct(_) => "struct",
            Schema::Enum(_) => "enum",
        }
    }

    /// True when every value of this schema encodes to zero bytes. Enums and
    /// options always carry a tag byte, so they never qualify.
    pub fn is_zero_sized(&self) -> bool {
        match self {
            Schema::Primitive(p) => *p == Primitive::Unit,
            Schema::FixedArray { inner, len } => *len == 0 || inner.is_zero_sized(),
            Schema::Struct(fields) => fields.iter().all(|(_, ty)| ty.is_zero_sized()),
            Schema::Option(_) | Schema::Vector(_) | Schema::Set(_) | Schema::Map { .. } | Schema::Enum(_) => false,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Primitive(p) => write!(f, "{p}"),
            Schema::Option(inner) => write!(f, "option<{inner}>"),
            Schema::FixedArray { inner, len } => write!(f, "[{inner}; {len}]"),
            Schema::Vector(node) => write!(f, "vec<{}>", node.inner),
            Schema::Set(inner) => write!(f, "set<{inner}>"),
            Schema::Map { key, value } => write!(f, "map<{key}, {value}>"),
            Schema::Struct(fields) => {
                if fields.is_empty() {
                    return write!(f, "struct {{}}");
                }
                write!(f, "struct {{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, " }}")
            }
            Schema::Enum(variants) => {
                write!(f, "enum {{ ")?;
                for (i, (name, ty)) in variants.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{name}({ty})")?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("u256"), None);
    }

    #[test]
    fn numeric_kinds_cover_typed_array_element_types_only() {
        let numeric: Vec<_> = Primitive::ALL.into_iter().filter_map(Primitive::numeric_kind).collect();
        assert_eq!(numeric.len(), 10);
        assert!(Primitive::U128.numeric_kind().is_none());
        assert!(Primitive::I128.numeric_kind().is_none());
        assert!(Primitive::Bool.numeric_kind().is_none());
        for kind in numeric {
            assert_eq!(Some(kind.size()), kind.primitive().width());
        }
    }

    #[test]
    fn singletons_are_shared_constants() {
        let a = Schema::U64;
        let b = Schema::primitive(Primitive::U64);
        assert_eq!(a, b);
        assert_eq!(Schema::STRING.as_primitive(), Some(Primitive::String));
    }

    #[test]
    fn zero_sized_schemas_are_the_ones_without_bytes() {
        assert!(Schema::UNIT.is_zero_sized());
        assert!(Schema::structure(IndexMap::new()).is_zero_sized());
        assert!(Schema::fixed_array(Schema::UNIT, 4).is_zero_sized());
        assert!(Schema::fixed_array(Schema::U64, 0).is_zero_sized());
        assert!(Schema::struct_from_pairs([("a", Schema::UNIT)]).unwrap().is_zero_sized());

        assert!(!Schema::U8.is_zero_sized());
        assert!(!Schema::option(Schema::UNIT).is_zero_sized());
        assert!(!Schema::vector(Schema::UNIT).is_zero_sized());
        assert!(!Schema::enum_from_pairs([("Only", Schema::UNIT)]).unwrap().is_zero_sized());
        assert!(!Schema::struct_from_pairs([("a", Schema::UNIT), ("b", Schema::BOOL)]).unwrap().is_zero_sized());
    }

    #[test]
    fn schemas_are_send_and_sync() {
        fn assert_shareable<T: Send + Sync>() {}
        assert_shareable::<Schema>();
    }
}
