//! Fixed-width numeric arrays produced for vectors of numeric primitives.
use num_bigint::BigInt;

use super::Value;
use crate::schema::NumericKind;

#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! each_array {
    ($array:expr, $xs:ident => $body:expr) => {
        match $array {
            NumericArray::U8($xs) => $body,
            NumericArray::U16($xs) => $body,
            NumericArray::U32($xs) => $body,
            NumericArray::U64($xs) => $body,
            NumericArray::I8($xs) => $body,
            NumericArray::I16($xs) => $body,
            NumericArray::I32($xs) => $body,
            NumericArray::I64($xs) => $body,
            NumericArray::F32($xs) => $body,
            NumericArray::F64($xs) => $body,
        }
    };
}

/// A typed array element: how it looks as a decoded [`Value`], and back.
trait Element: Copy {
    fn to_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! small_int_element {
    ($($t:ty),*) => {$(
        impl Element for $t {
            fn to_value(self) -> Value { Value::Int(i64::from(self)) }
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Int(i) => <$t>::try_from(*i).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

macro_rules! big_int_element {
    ($($t:ty),*) => {$(
        impl Element for $t {
            fn to_value(self) -> Value { Value::BigInt(BigInt::from(self)) }
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::BigInt(b) => <$t>::try_from(b).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

small_int_element!(u8, u16, u32, i8, i16, i32);
big_int_element!(u64, i64);

impl Element for f32 {
    fn to_value(self) -> Value {
        Value::Float(f64::from(self))
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            // decoded f32s are widened exactly, so narrowing is lossless
            Value::Float(f) => Some(*f as f32),
            _ => None,
        }
    }
}

impl Element for f64 {
    fn to_value(self) -> Value {
        Value::Float(self)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

fn collect<T: Element>(values: &[Value]) -> Option<Vec<T>> {
    values.iter().map(T::from_value).collect()
}

impl NumericArray {
    pub fn kind(&self) -> NumericKind {
        match self {
            NumericArray::U8(_) => NumericKind::U8,
            NumericArray::U16(_) => NumericKind::U16,
            NumericArray::U32(_) => NumericKind::U32,
            NumericArray::U64(_) => NumericKind::U64,
            NumericArray::I8(_) => NumericKind::I8,
            NumericArray::I16(_) => NumericKind::I16,
            NumericArray::I32(_) => NumericKind::I32,
            NumericArray::I64(_) => NumericKind::I64,
            NumericArray::F32(_) => NumericKind::F32,
            NumericArray::F64(_) => NumericKind::F64,
        }
    }

    pub fn len(&self) -> usize {
        each_array!(self, xs => xs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i` in its decoded [`Value`] form.
    pub fn get(&self, i: usize) -> Option<Value> {
        each_array!(self, xs => xs.get(i).map(|x| x.to_value()))
    }

    pub fn to_values(&self) -> Vec<Value> {
        each_array!(self, xs => xs.iter().map(|x| x.to_value()).collect())
    }

    /// Raw little-endian element bytes, back to back.
    pub fn write_le(&self, out: &mut Vec<u8>) {
        out.reserve(self.len() * self.kind().size());
        each_array!(self, xs => {
            for x in xs {
                out.extend_from_slice(&x.to_le_bytes());
            }
        })
    }

    /// Rebuild a typed array from decoded element values; `None` if any
    /// element has the wrong representation or range for `kind`.
    pub fn from_values(kind: NumericKind, values: &[Value]) -> Option<Self> {
        Some(match kind {
            NumericKind::U8 => NumericArray::U8(collect(values)?),
            NumericKind::U16 => NumericArray::U16(collect(values)?),
            NumericKind::U32 => NumericArray::U32(collect(values)?),
            NumericKind::U64 => NumericArray::U64(collect(values)?),
            NumericKind::I8 => NumericArray::I8(collect(values)?),
            NumericKind::I16 => NumericArray::I16(collect(values)?),
            NumericKind::I32 => NumericArray::I32(collect(values)?),
            NumericKind::I64 => NumericArray::I64(collect(values)?),
            NumericKind::F32 => NumericArray::F32(collect(values)?),
            NumericKind::F64 => NumericArray::F64(collect(values)?),
        })
    }
}

macro_rules! from_vec {
    ($($t:ty => $variant:ident),*) => {$(
        impl From<Vec<$t>> for NumericArray {
            fn from(xs: Vec<$t>) -> Self { NumericArray::$variant(xs) }
        }
    )*};
}

from_vec!(
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    f32 => F32, f64 => F64
);
