//! Schema model and reference wire codec for alon record layouts.
//!
//! A schema is an ordered list of typed fields. The wire form is packed and
//! little-endian: scalars have fixed widths, strings carry a u32 length
//! prefix, optionals a presence byte and enums a variant-index byte.
//!
//! ```
//! use alon_schema::*;
//!
//! let schema = Schema::new_struct(vec![
//!     Field::new("x", FieldType::Scalar(ScalarKind::U32)),
//!     Field::new("y", FieldType::Scalar(ScalarKind::U16)),
//! ]);
//!
//! let value = Value::Struct(vec![
//!     ("x".to_owned(), Value::U32(50)),
//!     ("y".to_owned(), Value::U16(1000)),
//! ]);
//! assert_eq!(value.encode_schema(&schema).unwrap(), [50, 0, 0, 0, 232, 3]);
//! assert_eq!(Value::decode_schema(&schema, &[50, 0, 0, 0, 232, 3]).unwrap(), value);
//! ```

pub mod bb;
pub mod error;
pub mod types;
pub mod value;

pub use bb::*;
pub use error::CodecError;
pub use types::*;
pub use value::*;

/// Width of the length prefix in front of every string.
pub const TEXT_LENGTH_PREFIX: usize = 4;

/// Width of the presence byte in front of every optional.
pub const PRESENCE_FLAG: usize = 1;
