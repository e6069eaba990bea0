//! Type projection: which value shapes a schema accepts and produces.
//!
//! The two sides differ on purpose and the asymmetry is part of the public
//! contract:
//!
//! * **Input** is permissive. 64/128-bit integers accept a `BigInt`, a
//!   decimal string, or an ordinary number that is an exact integer; all are
//!   normalized to `BigInt` before emission. Other integers accept any
//!   integral number, floats accept any number, numeric vectors accept a
//!   sequence or a typed array.
//! * **Output** is strict. 64/128-bit integers always decode to `BigInt`,
//!   numeric vectors to a typed [`NumericArray`](crate::value::NumericArray).
pub mod native;

use std::fmt;
use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::path::Path;
use crate::schema::{NumericKind, Primitive, Schema};
use crate::value::Value;

pub use native::{FromValue, IntoValue};

/// Largest magnitude at which every integer is exactly representable in an f64.
const MAX_SAFE_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Unit,
    Bool,
    Int,
    Float,
    BigInt,
    String,
    NumericArray(NumericKind),
    Option(Box<Projection>),
    List(Box<Projection>),
    FixedList { item: Box<Projection>, len: usize },
    Map { key: Box<Projection>, value: Box<Projection> },
    Record(Vec<(String, Projection)>),
    Union(Vec<(String, Projection)>),
    /// Any one of several accepted representations.
    OneOf(Vec<Projection>),
}

pub fn project(schema: &Schema, side: Side) -> Projection {
    match schema {
        Schema::Primitive(p) => project_primitive(*p, side),
        Schema::Option(inner) => Projection::Option(Box::new(project(inner, side))),
        Schema::FixedArray { inner, len } => Projection::FixedList {
            item: Box::new(project(inner, side)),
            len: *len,
        },
        Schema::Vector(node) => {
            let list = Projection::List(Box::new(project(node.inner(), side)));
            match (node.numeric(), side) {
                (None, _) => list,
                (Some(kind), Side::Input) => Projection::OneOf(vec![list, Projection::NumericArray(kind)]),
                (Some(kind), Side::Output) => Projection::NumericArray(kind),
            }
        }
        Schema::Set(inner) => Projection::List(Box::new(project(inner, side))),
        Schema::Map { key, value } => Projection::Map {
            key: Box::new(project(key, side)),
            value: Box::new(project(value, side)),
        },
        Schema::Struct(fields) => Projection::Record(
            fields.iter().map(|(name, ty)| (name.to_owned(), project(ty, side))).collect(),
        ),
        Schema::Enum(variants) => Projection::Union(
            variants.iter().map(|(name, ty)| (name.to_owned(), project(ty, side))).collect(),
        ),
    }
}

fn project_primitive(p: Primitive, side: Side) -> Projection {
    use Projection as P;
    match (p, side) {
        (Primitive::Unit, _) => P::Unit,
        (Primitive::Bool, _) => P::Bool,
        (Primitive::String, _) => P::String,
        (Primitive::F32 | Primitive::F64, Side::Input) => P::OneOf(vec![P::Float, P::Int]),
        (Primitive::F32 | Primitive::F64, Side::Output) => P::Float,
        (p, Side::Input) if p.is_large_int() => P::OneOf(vec![P::BigInt, P::String, P::Int, P::Float]),
        (p, Side::Output) if p.is_large_int() => P::BigInt,
        (_, Side::Input) => P::OneOf(vec![P::Int, P::Float]),
        (_, Side::Output) => P::Int,
    }
}

impl Projection {
    fn write(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            Projection::Unit => write!(f, "()"),
            Projection::Bool => write!(f, "bool"),
            Projection::Int => write!(f, "i64"),
            Projection::Float => write!(f, "f64"),
            Projection::BigInt => write!(f, "BigInt"),
            Projection::String => write!(f, "String"),
            Projection::NumericArray(kind) => write!(f, "NumericArray<{kind}>"),
            Projection::Option(inner) => {
                write!(f, "Option<")?;
                inner.write(f, false)?;
                write!(f, ">")
            }
            Projection::List(item) => {
                write!(f, "Vec<")?;
                item.write(f, false)?;
                write!(f, ">")
            }
            Projection::FixedList { item, len } => {
                write!(f, "[")?;
                item.write(f, false)?;
                write!(f, "; {len}]")
            }
            Projection::Map { key, value } => {
                write!(f, "Map<")?;
                key.write(f, false)?;
                write!(f, ", ")?;
                value.write(f, false)?;
                write!(f, ">")
            }
            Projection::Record(fields) => {
                if fields.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{name}: ")?;
                    ty.write(f, false)?;
                }
                write!(f, " }}")
            }
            Projection::Union(variants) => {
                if nested { write!(f, "(")?; }
                for (i, (name, ty)) in variants.iter().enumerate() {
                    if i > 0 { write!(f, " | ")?; }
                    write!(f, "{name}(")?;
                    ty.write(f, false)?;
                    write!(f, ")")?;
                }
                if nested { write!(f, ")")?; }
                Ok(())
            }
            Projection::OneOf(arms) => {
                if nested { write!(f, "(")?; }
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 { write!(f, " | ")?; }
                    arm.write(f, true)?;
                }
                if nested { write!(f, ")")?; }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, false)
    }
}

// ------------------------- Encode-side coercions -------------------------- //

/// Normalize any accepted 64/128-bit input to `BigInt`. Range checks against
/// the target width happen at emission.
pub(crate) fn coerce_large_int(value: &Value, target: Primitive, path: &Path) -> Result<BigInt> {
    match value {
        Value::BigInt(b) => Ok(b.clone()),
        Value::Int(i) => Ok(BigInt::from(*i)),
        Value::String(s) => s.parse::<BigInt>().map_err(|_| {
            Error::mismatch(path, format!("{target} as a decimal string"), format!("string {s:?}"))
        }),
        Value::Float(f) => Ok(BigInt::from(exact_float_int(*f, target, path)?)),
        other => Err(Error::mismatch(path, target, other.kind())),
    }
}

/// Integers up to 32 bits: any number that is an exact integer.
pub(crate) fn coerce_small_int(value: &Value, target: Primitive, path: &Path) -> Result<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Float(f) => exact_float_int(*f, target, path),
        other => Err(Error::mismatch(path, target, other.kind())),
    }
}

pub(crate) fn coerce_float(value: &Value, target: Primitive, path: &Path) -> Result<f64> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        other => Err(Error::mismatch(path, target, other.kind())),
    }
}

fn exact_float_int(f: f64, target: Primitive, path: &Path) -> Result<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_FLOAT_INT {
        Ok(f as i64)
    } else {
        Err(Error::out_of_range(path, f, target))
    }
}
