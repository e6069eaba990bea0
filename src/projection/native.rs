//! Native Rust types on both sides of the codec.
//!
//! [`IntoValue`] mirrors the permissive input side: `u64`, `i128` and friends
//! become `BigInt` values, `&str` may stand in for a decimal integer.
//! [`FromValue`] mirrors the strict output side: a `u64` can only be read
//! back from a `BigInt`.
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::path::{Path, Segment};
use crate::value::{NumericArray, Value};

pub trait IntoValue {
    fn into_value(self) -> Value;
}

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn wrong(expected: &str, found: &Value) -> Error {
    Error::mismatch(&Path::root(), expected, found.kind())
}

// ------------------------------- IntoValue -------------------------------- //

macro_rules! int_into_value {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Value { Value::Int(i64::from(self)) }
        }
    )*};
}

macro_rules! big_into_value {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Value { Value::BigInt(BigInt::from(self)) }
        }
    )*};
}

int_into_value!(u8, u16, u32, i8, i16, i32);
big_into_value!(u64, u128, i128);

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Unit
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_owned())
    }
}

impl IntoValue for BigInt {
    fn into_value(self) -> Value {
        Value::BigInt(self)
    }
}

impl IntoValue for NumericArray {
    fn into_value(self) -> Value {
        Value::Array(self)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Seq(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue> IntoValue for IndexMap<String, T> {
    fn into_value(self) -> Value {
        Value::Struct(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }
}

// ------------------------------- FromValue -------------------------------- //

macro_rules! int_from_value {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int(i) => <$t>::try_from(i)
                        .map_err(|_| Error::out_of_range(&Path::root(), i, stringify!($t))),
                    other => Err(wrong(stringify!($t), &other)),
                }
            }
        }
    )*};
}

macro_rules! big_from_value {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::BigInt(b) => <$t>::try_from(&b)
                        .map_err(|_| Error::out_of_range(&Path::root(), &b, stringify!($t))),
                    other => Err(wrong(concat!(stringify!($t), " (as BigInt)"), &other)),
                }
            }
        }
    )*};
}

int_from_value!(u8, u16, u32, i8, i16, i32);
big_from_value!(u64, u128, i64, i128);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            other => Err(wrong("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(wrong("bool", &other)),
        }
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Unit => Ok(()),
            other => Err(wrong("unit", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(wrong("string", &other)),
        }
    }
}

impl FromValue for BigInt {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::BigInt(b) => Ok(b),
            other => Err(wrong("BigInt", &other)),
        }
    }
}

impl FromValue for NumericArray {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(a) => Ok(a),
            other => Err(wrong("numeric array", &other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        let items = match value {
            Value::Seq(xs) => xs,
            Value::Array(a) => a.to_values(),
            other => return Err(wrong("sequence", &other)),
        };
        items.into_iter()
            .enumerate()
            .map(|(i, x)| T::from_value(x).map_err(|e| rebase(e, Segment::Index(i))))
            .collect()
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Struct(fields) => fields.into_iter()
                .map(|(k, v)| {
                    let v = T::from_value(v).map_err(|e| rebase(e, Segment::Field(k.clone())))?;
                    Ok((k, v))
                })
                .collect(),
            other => Err(wrong("struct", &other)),
        }
    }
}

/// Prefix an element error with the step that led to it.
fn rebase(err: Error, step: Segment) -> Error {
    let prefix = |path: Path| {
        let mut out = Path::root();
        out.push(step.clone());
        for s in path.segments() {
            out.push(s.clone());
        }
        out
    };
    match err {
        Error::SchemaMismatch { path, expected, found } => {
            Error::SchemaMismatch { path: prefix(path), expected, found }
        }
        Error::IntegerOutOfRange { path, value, target } => {
            Error::IntegerOutOfRange { path: prefix(path), value, target }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_integers_go_in_as_big_ints() {
        assert_eq!(7u64.into_value(), Value::BigInt(BigInt::from(7)));
        assert_eq!(u128::MAX.into_value(), Value::BigInt(BigInt::from(u128::MAX)));
        assert_eq!(7i64.into_value(), Value::Int(7));
        assert_eq!(Some(1u8).into_value(), Value::Int(1));
        assert_eq!(None::<u8>.into_value(), Value::Null);
    }

    #[test]
    fn wide_integers_only_come_out_of_big_ints() {
        assert_eq!(u64::from_value(Value::BigInt(BigInt::from(9))).unwrap(), 9);
        assert!(u64::from_value(Value::Int(9)).is_err());
        assert!(matches!(
            u8::from_value(Value::Int(300)),
            Err(Error::IntegerOutOfRange { .. })
        ));
    }

    #[test]
    fn vectors_read_from_typed_arrays_and_report_element_paths() {
        let xs: Vec<f32> = FromValue::from_value(Value::Array(NumericArray::F32(vec![1.5, -2.5]))).unwrap();
        assert_eq!(xs, [1.5, -2.5]);

        let err = Vec::<u8>::from_value(Value::Seq(vec![Value::Int(1), Value::Bool(true)])).unwrap_err();
        assert_eq!(err.path().map(|p| p.to_string()).as_deref(), Some("$[1]"));
    }
}
