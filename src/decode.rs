//! Schema-directed Borsh decoder.
//!
//! [`decode`] reads exactly the bytes the schema prescribes and ignores
//! anything after them; use [`decode_exact`] to reject trailing bytes.
//! Both run the numeric vector visitor ([`crate::visit::materialize`]) on the
//! raw tree; [`decode_raw`] skips it.
use indexmap::IndexMap;
use num_bigint::BigInt;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::path::{Path, Segment};
use crate::projection::FromValue;
use crate::schema::{Fields, Primitive, Schema, Variants};
use crate::value::Value;
use crate::visit::materialize;

pub fn decode(schema: &Schema, bytes: &[u8]) -> Result<Value> {
    let raw = decode_raw(schema, bytes)?;
    materialize(schema, raw)
}

/// Like [`decode`], but the value must span the whole buffer.
pub fn decode_exact(schema: &Schema, bytes: &[u8]) -> Result<Value> {
    let mut decoder = Decoder::new(bytes);
    let raw = decoder.decode_raw(schema)?;
    if decoder.remaining() > 0 {
        return Err(Error::TrailingBytes {
            consumed: decoder.position(),
            remaining: decoder.remaining(),
        });
    }
    materialize(schema, raw)
}

/// Decode without reconstructing typed numeric arrays.
pub fn decode_raw(schema: &Schema, bytes: &[u8]) -> Result<Value> {
    Decoder::new(bytes).decode_raw(schema)
}

/// Decode into a native Rust type through the strict [`FromValue`] side.
pub fn decode_into<T: FromValue>(schema: &Schema, bytes: &[u8]) -> Result<T> {
    T::from_value(decode(schema, bytes)?)
}

/// A cursor over one input buffer; successive calls decode successive values.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    path: Path,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, path: Path::root() }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// On failure the cursor is left where the call started.
    pub fn decode_raw(&mut self, schema: &Schema) -> Result<Value> {
        let start = self.pos;
        self.path = Path::root();
        match self.value(schema) {
            Ok(value) => {
                debug!(schema = schema.kind(), bytes = self.pos - start, "decoded value");
                Ok(value)
            }
            Err(err) => {
                self.pos = start;
                Err(err)
            }
        }
    }

    /// [`Decoder::decode_raw`] followed by the numeric vector visitor.
    pub fn decode(&mut self, schema: &Schema) -> Result<Value> {
        let raw = self.decode_raw(schema)?;
        materialize(schema, raw)
    }

    fn scoped<T>(&mut self, segment: Segment, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }

    fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEndOfBuffer {
                path: self.path.clone(),
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(u32::from_le_bytes(self.read_array()?) as usize)
    }

    /// Element count of a length-prefixed collection. Every accepted element
    /// consumes at least one input byte.
    fn read_count(&mut self, zero_sized: bool) -> Result<usize> {
        let len = self.read_len()?;
        if zero_sized && len > 0 {
            return Err(Error::ZeroSizedElements { path: self.path.clone(), len });
        }
        Ok(len)
    }

    /// Capacity hint bounded by what the input could possibly hold.
    fn capacity(&self, len: usize) -> usize {
        len.min(self.remaining())
    }

    fn value(&mut self, schema: &Schema) -> Result<Value> {
        match schema {
            Schema::Primitive(p) => self.primitive(*p),
            Schema::Option(inner) => match self.read_byte()? {
                0 => Ok(Value::Null),
                1 => self.scoped(Segment::Some, |this| this.value(inner)),
                byte => Err(Error::InvalidOptionTag { path: self.path.clone(), byte }),
            },
            Schema::FixedArray { inner, len } => self.sequence(inner, *len),
            Schema::Vector(node) => {
                let len = self.read_count(node.inner().is_zero_sized())?;
                self.sequence(node.inner(), len)
            }
            Schema::Set(inner) => {
                let len = self.read_count(inner.is_zero_sized())?;
                self.sequence(inner, len)
            }
            Schema::Map { key, value } => {
                let len = self.read_count(key.is_zero_sized() && value.is_zero_sized())?;
                let mut pairs = Vec::with_capacity(self.capacity(len));
                for i in 0..len {
                    let k = self.scoped(Segment::Key(i), |this| this.value(key))?;
                    let v = self.scoped(Segment::Value(i), |this| this.value(value))?;
                    pairs.push((k, v));
                }
                Ok(Value::Map(pairs))
            }
            Schema::Struct(fields) => self.structure(fields),
            Schema::Enum(variants) => self.enumeration(variants),
        }
    }

    fn primitive(&mut self, p: Primitive) -> Result<Value> {
        Ok(match p {
            Primitive::Unit => Value::Unit,
            Primitive::Bool => match self.read_byte()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                byte => return Err(Error::InvalidBool { path: self.path.clone(), byte }),
            },
            Primitive::String => {
                let len = self.read_len()?;
                let bytes = self.read(len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| Error::InvalidUtf8 { path: self.path.clone() })?;
                Value::String(s.to_owned())
            }
            Primitive::U8 => Value::Int(i64::from(u8::from_le_bytes(self.read_array()?))),
            Primitive::U16 => Value::Int(i64::from(u16::from_le_bytes(self.read_array()?))),
            Primitive::U32 => Value::Int(i64::from(u32::from_le_bytes(self.read_array()?))),
            Primitive::I8 => Value::Int(i64::from(i8::from_le_bytes(self.read_array()?))),
            Primitive::I16 => Value::Int(i64::from(i16::from_le_bytes(self.read_array()?))),
            Primitive::I32 => Value::Int(i64::from(i32::from_le_bytes(self.read_array()?))),
            Primitive::U64 => Value::BigInt(BigInt::from(u64::from_le_bytes(self.read_array()?))),
            Primitive::U128 => Value::BigInt(BigInt::from(u128::from_le_bytes(self.read_array()?))),
            Primitive::I64 => Value::BigInt(BigInt::from(i64::from_le_bytes(self.read_array()?))),
            Primitive::I128 => Value::BigInt(BigInt::from(i128::from_le_bytes(self.read_array()?))),
            Primitive::F32 => Value::Float(f64::from(f32::from_le_bytes(self.read_array()?))),
            Primitive::F64 => Value::Float(f64::from_le_bytes(self.read_array()?)),
        })
    }

    fn sequence(&mut self, inner: &Schema, len: usize) -> Result<Value> {
        let mut items = Vec::with_capacity(self.capacity(len));
        for i in 0..len {
            items.push(self.scoped(Segment::Index(i), |this| this.value(inner))?);
        }
        Ok(Value::Seq(items))
    }

    fn structure(&mut self, fields: &Fields) -> Result<Value> {
        let mut out = IndexMap::with_capacity(fields.len());
        for (name, field_schema) in fields.iter() {
            let v = self.scoped(Segment::Field(name.to_owned()), |this| this.value(field_schema))?;
            out.insert(name.to_owned(), v);
        }
        Ok(Value::Struct(out))
    }

    fn enumeration(&mut self, variants: &Variants) -> Result<Value> {
        let index = self.read_byte()?;
        let Some((name, payload_schema)) = variants.get_index(usize::from(index)) else {
            return Err(Error::InvalidEnumDiscriminant {
                path: self.path.clone(),
                index,
                count: variants.len(),
            });
        };
        trace!(index, variant = name, "enum variant");
        let payload = self.scoped(Segment::Variant(name.to_owned()), |this| this.value(payload_schema))?;
        Ok(Value::Enum(name.to_owned(), Box::new(payload)))
    }
}
