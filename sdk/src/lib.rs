//! alon
//!
//! Driver for the alon schema compiler:
//!
//! - [`Manifest`]: the records to compile, loaded from JSON
//! - [`Bundle`]: one header/source pair for every record
//! - [`test_vectors`]: golden wire bytes, cross-checked against the layout plan
//! - [`decode_to_json`]: inspect a buffer through a schema

pub mod bundle;
pub mod error;
pub mod manifest;
pub mod vectors;

pub use alon_compiler::{compile, CompileError, CompileOptions, CompiledSchema, Fault, Target};
pub use alon_schema::{Field, FieldType, ScalarKind, Schema, Value};
pub use bundle::Bundle;
pub use error::AlonError;
pub use manifest::{Manifest, SchemaCase};
pub use vectors::test_vectors;

/// Decode a buffer holding one record into a pretty-printed JSON string.
/// The whole buffer must be consumed.
pub fn decode_to_json(schema: &Schema, buffer: &[u8]) -> Result<String, AlonError> {
    let value = Value::decode_schema(schema, buffer)?;
    Ok(serde_json::to_string_pretty(&value.to_json())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alon_schema::CodecError;

    fn double_packed() -> Schema {
        Schema::new_struct(vec![
            Field::new("x", FieldType::Scalar(ScalarKind::U32)),
            Field::new("y", FieldType::Scalar(ScalarKind::U16)),
        ])
    }

    #[test]
    fn decodes_to_json() {
        let json = decode_to_json(&double_packed(), &[50, 0, 0, 0, 232, 3]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!({"x": 50, "y": 1000}));
    }

    #[test]
    fn decode_rejects_short_and_long_buffers() {
        assert!(matches!(
            decode_to_json(&double_packed(), &[50, 0, 0, 0, 232]),
            Err(AlonError::Codec(CodecError::UnexpectedEof(_)))
        ));
        assert!(matches!(
            decode_to_json(&double_packed(), &[50, 0, 0, 0, 232, 3, 0]),
            Err(AlonError::Codec(CodecError::TrailingBytes(1)))
        ));
    }
}
