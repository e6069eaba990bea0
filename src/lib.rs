//! Schema-driven Borsh serialization.
//!
//! A [`Schema`] describes the shape of a value; [`encode`] walks a [`Value`]
//! alongside it and emits the canonical Borsh bytes, [`decode`] reads them
//! back. Schemas can be built in code (see [`schema::builder`]) or loaded
//! from the borsh-js JSON vocabulary ([`schema::json`]).
//!
//! ```
//! use borsh_schema::{Schema, Value, encode, decode};
//!
//! let schema = Schema::struct_from_pairs([
//!     ("label", Schema::STRING),
//!     ("samples", Schema::vector(Schema::F32)),
//! ]).unwrap();
//! let value = Value::record([
//!     ("label", Value::String("t".into())),
//!     ("samples", Value::Seq(vec![Value::Float(1.5), Value::Float(-2.5)])),
//! ]);
//! let bytes = encode(&schema, &value).unwrap();
//! let back = decode(&schema, &bytes).unwrap();
//! assert_eq!(back.get("samples").and_then(Value::as_array).map(|a| a.len()), Some(2));
//! ```
pub mod error;
pub mod path;
pub mod schema;
pub mod value;
pub mod encode;
pub mod decode;
pub mod visit;
pub mod projection;
pub mod path_de;

pub use error::{Error, Result};
pub use path::{Path, Segment};
pub use schema::{Fields, NumericKind, Primitive, Schema, Variants, VectorNode};
pub use value::{NumericArray, Value};
pub use encode::{encode, encode_from, Encoder};
pub use decode::{decode, decode_exact, decode_into, decode_raw, Decoder};
pub use visit::materialize;
pub use projection::{project, FromValue, IntoValue, Projection, Side};
