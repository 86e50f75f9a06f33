use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    error::CodecError,
    types::{Field, FieldType, ScalarKind, Schema},
};

use serde_json::{json, Map, Value as Json};
use std::ops::Index;

/// This type holds dynamic record data.
///
/// Values can represent anything a [Schema](struct.Schema.html) describes and
/// are converted to and from wire bytes with the matching
/// [FieldType](enum.FieldType.html). This is the reference encoding that
/// generated C code is checked against.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Optional(Option<Box<Value>>),
    Struct(Vec<(String, Value)>),
    /// Variant name and payload.
    Enum(String, Box<Value>),
}

impl Value {
    /// A convenience method to extract the text out of a [Text](#variant.Text).
    /// Returns `""` for other value kinds.
    pub fn as_str(&self) -> &str {
        match *self {
            Value::Text(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to get the elements out of an [Array](#variant.Array).
    /// Returns an empty slice for other value kinds.
    pub fn as_array(&self) -> &[Value] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to extract a field out of a [Struct](#variant.Struct).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match *self {
            Value::Struct(ref fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        match *self {
            Value::Struct(ref mut fields) => fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Inserts or replaces a field on a [Struct](#variant.Struct). Does
    /// nothing for other value kinds.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Struct(ref mut fields) = *self {
            match fields.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value,
                None => fields.push((name.to_string(), value)),
            }
        }
    }

    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            Value::Bytes(ref bytes) => bytes.len(),
            Value::Struct(ref fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes a value of type `ty` from `bytes`, which must be consumed
    /// exactly.
    pub fn decode(ty: &FieldType, bytes: &[u8]) -> Result<Value, CodecError> {
        let mut bb = ByteBuffer::new(bytes);
        let value = Value::decode_bb(ty, &mut bb, "$")?;
        match bb.remaining() {
            0 => Ok(value),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    /// Decodes a top-level record.
    pub fn decode_schema(schema: &Schema, bytes: &[u8]) -> Result<Value, CodecError> {
        Value::decode(&schema.as_field_type(), bytes)
    }

    /// Encodes this value as type `ty`.
    pub fn encode(&self, ty: &FieldType) -> Result<Vec<u8>, CodecError> {
        let mut bb = ByteBufferMut::new();
        self.encode_bb(ty, &mut bb, "$")?;
        Ok(bb.data())
    }

    pub fn encode_schema(&self, schema: &Schema) -> Result<Vec<u8>, CodecError> {
        self.encode(&schema.as_field_type())
    }

    /// Decodes a value of type `ty` from `bb` starting at the current index.
    /// After this function returns, the current index will be advanced by the
    /// amount of data that was successfully parsed. `path` names the value in
    /// error messages.
    pub fn decode_bb(ty: &FieldType, bb: &mut ByteBuffer, path: &str) -> Result<Value, CodecError> {
        let eof = || CodecError::UnexpectedEof(path.to_string());

        match ty {
            FieldType::Scalar(kind) => match kind {
                ScalarKind::U8 => bb.read_byte().map(Value::U8),
                ScalarKind::U16 => bb.read_u16().map(Value::U16),
                ScalarKind::U32 => bb.read_u32().map(Value::U32),
                ScalarKind::U64 => bb.read_u64().map(Value::U64),
                ScalarKind::F32 => bb.read_f32().map(Value::F32),
                ScalarKind::F64 => bb.read_f64().map(Value::F64),
            }
            .map_err(|_| eof()),

            FieldType::Text => Ok(Value::Text(bb.read_string().map_err(|_| eof())?.into_owned())),

            FieldType::FixedBytes(n) => Ok(Value::Bytes(bb.read_bytes(*n).map_err(|_| eof())?.to_vec())),

            FieldType::FixedArray(element, count) => {
                let mut values = Vec::with_capacity(*count);
                for i in 0..*count {
                    values.push(Value::decode_bb(element, bb, &format!("{}[{}]", path, i))?);
                }
                Ok(Value::Array(values))
            }

            FieldType::Optional(inner) => match bb.read_byte().map_err(|_| eof())? {
                0 => Ok(Value::Optional(None)),
                _ => Ok(Value::Optional(Some(Box::new(Value::decode_bb(inner, bb, path)?)))),
            },

            FieldType::Struct(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = Value::decode_bb(&field.ty, bb, &format!("{}.{}", path, field.name))?;
                    values.push((field.name.clone(), value));
                }
                Ok(Value::Struct(values))
            }

            FieldType::Enum(variants) => {
                let index = bb.read_byte().map_err(|_| eof())?;
                let variant = variants.get(index as usize).ok_or_else(|| CodecError::InvalidVariant {
                    path:  path.to_string(),
                    index,
                    count: variants.len(),
                })?;
                let payload = Value::decode_bb(&variant.ty, bb, &format!("{}.{}", path, variant.name))?;
                Ok(Value::Enum(variant.name.clone(), Box::new(payload)))
            }
        }
    }

    /// Encodes the current value to the end of `bb` as type `ty`. This is
    /// mainly useful as a helper routine for [encode](#method.encode), which
    /// you probably want to use instead.
    pub fn encode_bb(&self, ty: &FieldType, bb: &mut ByteBufferMut, path: &str) -> Result<(), CodecError> {
        let mismatch = || CodecError::TypeMismatch {
            path:     path.to_string(),
            expected: ty.to_json().to_string(),
        };

        match (ty, self) {
            (FieldType::Scalar(ScalarKind::U8), Value::U8(v)) => bb.write_byte(*v),
            (FieldType::Scalar(ScalarKind::U16), Value::U16(v)) => bb.write_u16(*v),
            (FieldType::Scalar(ScalarKind::U32), Value::U32(v)) => bb.write_u32(*v),
            (FieldType::Scalar(ScalarKind::U64), Value::U64(v)) => bb.write_u64(*v),
            (FieldType::Scalar(ScalarKind::F32), Value::F32(v)) => bb.write_f32(*v),
            (FieldType::Scalar(ScalarKind::F64), Value::F64(v)) => bb.write_f64(*v),

            (FieldType::Text, Value::Text(s)) => bb.write_string(s).map_err(|_| mismatch())?,

            (FieldType::FixedBytes(n), Value::Bytes(bytes)) if bytes.len() == *n => bb.write_bytes(bytes),

            (FieldType::FixedArray(element, count), Value::Array(values)) if values.len() == *count => {
                for (i, value) in values.iter().enumerate() {
                    value.encode_bb(element, bb, &format!("{}[{}]", path, i))?;
                }
            }

            (FieldType::Optional(_), Value::Optional(None)) => bb.write_byte(0),
            (FieldType::Optional(inner), Value::Optional(Some(value))) => {
                bb.write_byte(1);
                value.encode_bb(inner, bb, path)?;
            }

            (FieldType::Struct(fields), Value::Struct(_)) => {
                for field in fields {
                    let field_path = format!("{}.{}", path, field.name);
                    let value = self.get(&field.name).ok_or_else(|| CodecError::TypeMismatch {
                        path:     field_path.clone(),
                        expected: field.ty.to_json().to_string(),
                    })?;
                    value.encode_bb(&field.ty, bb, &field_path)?;
                }
            }

            (FieldType::Enum(variants), Value::Enum(name, payload)) => {
                let index = variants
                    .iter()
                    .position(|v| &v.name == name)
                    .filter(|i| *i <= u8::MAX as usize)
                    .ok_or_else(mismatch)?;
                bb.write_byte(index as u8);
                payload.encode_bb(&variants[index].ty, bb, &format!("{}.{}", path, name))?;
            }

            _ => return Err(mismatch()),
        }

        Ok(())
    }

    /// Builds a typed value from its JSON form: numbers, strings, `null` for
    /// an absent option, arrays, objects keyed by field name, and
    /// single-key objects for enum variants.
    pub fn from_json(raw: &Json, ty: &FieldType) -> Result<Value, CodecError> {
        Value::from_json_at(raw, ty, "$")
    }

    fn from_json_at(raw: &Json, ty: &FieldType, path: &str) -> Result<Value, CodecError> {
        let mismatch = || CodecError::TypeMismatch {
            path:     path.to_string(),
            expected: ty.to_json().to_string(),
        };
        let unsigned = |max: u64| raw.as_u64().filter(|v| *v <= max).ok_or_else(mismatch);

        match ty {
            FieldType::Scalar(kind) => Ok(match kind {
                ScalarKind::U8 => Value::U8(unsigned(u8::MAX as u64)? as u8),
                ScalarKind::U16 => Value::U16(unsigned(u16::MAX as u64)? as u16),
                ScalarKind::U32 => Value::U32(unsigned(u32::MAX as u64)? as u32),
                ScalarKind::U64 => Value::U64(unsigned(u64::MAX)?),
                ScalarKind::F32 => Value::F32(raw.as_f64().ok_or_else(mismatch)? as f32),
                ScalarKind::F64 => Value::F64(raw.as_f64().ok_or_else(mismatch)?),
            }),

            FieldType::Text => raw.as_str().map(|s| Value::Text(s.to_string())).ok_or_else(mismatch),

            FieldType::FixedBytes(n) => {
                let items = raw.as_array().filter(|a| a.len() == *n).ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|b| b.as_u64().filter(|b| *b <= u8::MAX as u64).map(|b| b as u8))
                    .collect::<Option<Vec<u8>>>()
                    .map(Value::Bytes)
                    .ok_or_else(mismatch)
            }

            FieldType::FixedArray(element, count) => {
                let items = raw.as_array().filter(|a| a.len() == *count).ok_or_else(mismatch)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Value::from_json_at(item, element, &format!("{}[{}]", path, i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }

            FieldType::Optional(inner) => match raw {
                Json::Null => Ok(Value::Optional(None)),
                other => Ok(Value::Optional(Some(Box::new(Value::from_json_at(other, inner, path)?)))),
            },

            FieldType::Struct(fields) => {
                let map = raw.as_object().ok_or_else(mismatch)?;
                fields
                    .iter()
                    .map(|field| -> Result<(String, Value), CodecError> {
                        let field_path = format!("{}.{}", path, field.name);
                        // An absent optional member reads as `null`.
                        let item = map.get(&field.name).unwrap_or(&Json::Null);
                        Ok((field.name.clone(), Value::from_json_at(item, &field.ty, &field_path)?))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Struct)
            }

            FieldType::Enum(variants) => {
                let map = raw.as_object().filter(|m| m.len() == 1).ok_or_else(mismatch)?;
                let (name, payload) = map.iter().next().ok_or_else(mismatch)?;
                let variant: &Field = variants.iter().find(|v| &v.name == name).ok_or_else(mismatch)?;
                let value = Value::from_json_at(payload, &variant.ty, &format!("{}.{}", path, name))?;
                Ok(Value::Enum(name.clone(), Box::new(value)))
            }
        }
    }

    /// The inverse of [from_json](#method.from_json).
    pub fn to_json(&self) -> Json {
        match *self {
            Value::U8(v) => json!(v),
            Value::U16(v) => json!(v),
            Value::U32(v) => json!(v),
            Value::U64(v) => json!(v),
            Value::F32(v) => json!(v),
            Value::F64(v) => json!(v),
            Value::Text(ref s) => json!(s),
            Value::Bytes(ref bytes) => json!(bytes),
            Value::Array(ref values) => Json::Array(values.iter().map(Value::to_json).collect()),
            Value::Optional(None) => Json::Null,
            Value::Optional(Some(ref value)) => value.to_json(),
            Value::Struct(ref fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                Json::Object(map)
            }
            Value::Enum(ref name, ref value) => {
                let mut map = Map::new();
                map.insert(name.clone(), value.to_json());
                Json::Object(map)
            }
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't an [Array](#variant.Array) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::Array(ref values) => &values[index],
            _ => panic!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn record(fields: Vec<(&str, FieldType)>) -> Schema {
        Schema::new_struct(fields.into_iter().map(|(n, t)| Field::new(n, t)).collect())
    }

    fn u(kind: ScalarKind) -> FieldType {
        FieldType::Scalar(kind)
    }

    fn encode_json(schema: &Schema, raw: Json) -> Vec<u8> {
        Value::from_json(&raw, &schema.as_field_type())
            .unwrap()
            .encode_schema(schema)
            .unwrap()
    }

    #[test]
    fn single_fixed() {
        let schema = record(vec![("x", u(ScalarKind::U8))]);
        assert_eq!(encode_json(&schema, json!({"x": 10})), [10]);
        assert_eq!(encode_json(&schema, json!({"x": 255})), [255]);
    }

    #[test]
    fn double_packed() {
        let schema = record(vec![("x", u(ScalarKind::U32)), ("y", u(ScalarKind::U16))]);
        assert_eq!(encode_json(&schema, json!({"x": 50, "y": 1000})), [50, 0, 0, 0, 232, 3]);
    }

    #[test]
    fn two_strings() {
        let schema = record(vec![("x", FieldType::Text), ("y", FieldType::Text)]);
        assert_eq!(
            encode_json(&schema, json!({"x": "foo", "y": "bar"})),
            [3, 0, 0, 0, b'f', b'o', b'o', 3, 0, 0, 0, b'b', b'a', b'r']
        );
    }

    #[test]
    fn fixed_array_of_bytes() {
        let schema = record(vec![("x", FieldType::array(u(ScalarKind::U8), 3))]);
        assert_eq!(encode_json(&schema, json!({"x": [1, 2, 3]})), [1, 2, 3]);
    }

    #[test]
    fn optional_string() {
        let schema = record(vec![("x", FieldType::optional(FieldType::Text))]);
        assert_eq!(encode_json(&schema, json!({"x": null})), [0]);
        assert_eq!(encode_json(&schema, json!({})), [0]);
        assert_eq!(
            encode_json(&schema, json!({"x": "bruh"})),
            [1, 4, 0, 0, 0, b'b', b'r', b'u', b'h']
        );
    }

    #[test]
    fn optional_u64() {
        let schema = record(vec![("x", FieldType::optional(u(ScalarKind::U64)))]);
        assert_eq!(encode_json(&schema, json!({"x": null})), [0]);
        assert_eq!(encode_json(&schema, json!({"x": 2})), [1, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn enum_payload() {
        let schema = Schema::new_enum(vec![
            Field::new("empty", u(ScalarKind::U8)),
            Field::new("named", FieldType::Text),
        ]);
        let bytes = encode_json(&schema, json!({"named": "a"}));
        assert_eq!(bytes, [1, 1, 0, 0, 0, b'a']);

        let decoded = Value::decode_schema(&schema, &bytes).unwrap();
        assert_eq!(decoded, Value::Enum("named".to_string(), Box::new(Value::Text("a".to_string()))));
        assert_eq!(
            Value::decode_schema(&schema, &[7, 0]),
            Err(CodecError::InvalidVariant { path: "$".to_string(), index: 7, count: 2 })
        );
    }

    #[test]
    fn decode_round_trip() {
        let schema = record(vec![
            ("a", u(ScalarKind::U16)),
            ("b", FieldType::Text),
            ("c", FieldType::FixedBytes(2)),
            ("d", FieldType::array(FieldType::Text, 2)),
            ("e", FieldType::optional(u(ScalarKind::F64))),
        ]);
        let raw = json!({"a": 7, "b": "hi", "c": [9, 8], "d": ["x", ""], "e": 1.5});
        let value = Value::from_json(&raw, &schema.as_field_type()).unwrap();
        let bytes = value.encode_schema(&schema).unwrap();

        assert_eq!(Value::decode_schema(&schema, &bytes).unwrap(), value);
        assert_eq!(value.to_json(), raw);
    }

    #[test]
    fn decode_errors() {
        let schema = record(vec![("x", u(ScalarKind::U32)), ("y", FieldType::Text)]);
        assert_eq!(
            Value::decode_schema(&schema, &[1, 0, 0]),
            Err(CodecError::UnexpectedEof("$.x".to_string()))
        );
        assert_eq!(
            Value::decode_schema(&schema, &[1, 0, 0, 0, 2, 0, 0, 0, b'a']),
            Err(CodecError::UnexpectedEof("$.y".to_string()))
        );
        assert_eq!(
            Value::decode_schema(&schema, &[1, 0, 0, 0, 0, 0, 0, 0, 9]),
            Err(CodecError::TrailingBytes(1))
        );
    }

    #[test]
    fn from_json_mismatches() {
        let ty = record(vec![("x", u(ScalarKind::U8)), ("k", FieldType::FixedBytes(2))]).as_field_type();
        assert!(matches!(
            Value::from_json(&json!({"x": 256, "k": [1, 2]}), &ty),
            Err(CodecError::TypeMismatch { ref path, .. }) if path == "$.x"
        ));
        assert!(matches!(
            Value::from_json(&json!({"x": 1, "k": [1]}), &ty),
            Err(CodecError::TypeMismatch { ref path, .. }) if path == "$.k"
        ));
        assert!(Value::from_json(&json!({"x": "1", "k": [1, 2]}), &ty).is_err());
    }

    #[test]
    fn value_accessors() {
        let mut value = Value::Struct(vec![]);
        assert_eq!(value.get("x"), None);

        value.set("x", Value::U8(1));
        value.set("y", Value::Text("abc".to_string()));
        value.set("x", Value::U8(2));
        assert_eq!(value.get("x"), Some(&Value::U8(2)));
        assert_eq!(value.get("y").map(Value::as_str), Some("abc"));
        assert_eq!(value.len(), 2);

        let array = Value::Array(vec![Value::U16(1), Value::U16(2)]);
        assert_eq!(array[1], Value::U16(2));
        assert_eq!(array.as_array().len(), 2);
    }
}
