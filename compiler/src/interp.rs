//! Executes a [`Plan`] against byte slices with the same bounds checks,
//! cursor arithmetic and string handling as the emitted C. Vector generation
//! cross-checks every example through it.

use alon_schema::{CodecError, FieldType, Value, PRESENCE_FLAG, TEXT_LENGTH_PREFIX};
use thiserror::Error;

use crate::{
    error::Fault,
    layout::Access,
    plan::{Plan, Step, Target},
};

#[derive(Debug, Error, PartialEq)]
pub enum InterpretError {
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error("Record has no member {0}")]
    MissingMember(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Result of a successful serialize: the whole caller-provided buffer and
/// the final cursor position.
#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub bytes:  Vec<u8>,
    pub cursor: usize,
}

impl Written {
    /// The bytes actually produced.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.cursor]
    }
}

pub struct Interpreter<'a> {
    plan: &'a Plan,
}

impl<'a> Interpreter<'a> {
    pub fn new(plan: &'a Plan) -> Interpreter<'a> {
        Interpreter { plan }
    }

    /// Behaves like `<name>_deserialize(buffer, buffer.len(), out)`.
    /// Trailing bytes are ignored.
    pub fn deserialize(&self, buffer: &[u8]) -> Result<Value, Fault> {
        if buffer.len() < self.plan.prefix() {
            return Err(Fault::BufferTooShort);
        }

        let mut reader = Reader { buffer, offset: self.plan.prefix() };
        let mut record = Value::Struct(vec![]);

        for step in self.plan.steps() {
            let (target, value) = match step {
                Step::SeedCursor { offset } => {
                    reader.offset = *offset;
                    continue;
                }
                Step::Scalar { target, kind, access } => {
                    let bytes = reader.fixed(*access, kind.width())?;
                    (target, decode(&FieldType::Scalar(*kind), bytes)?)
                }
                Step::Block { target, ty, len, access } => {
                    let bytes = reader.fixed(*access, *len)?;
                    (target, decode(ty, bytes)?)
                }
                Step::Text { target } => (target, Value::Text(reader.text()?)),
                Step::TextArray { target, count } => {
                    let texts = (0..*count).map(|_| reader.text().map(Value::Text)).collect::<Result<Vec<_>, Fault>>()?;
                    (target, Value::Array(texts))
                }
                Step::OptionalText { target } => {
                    let value = match reader.flag()? {
                        true => Some(Box::new(Value::Text(reader.text()?))),
                        false => None,
                    };
                    (target, Value::Optional(value))
                }
                Step::OptionalScalar { target, kind } => {
                    let value = match reader.flag()? {
                        true => {
                            let bytes = reader.fixed(Access::Cursor, kind.width())?;
                            Some(Box::new(decode(&FieldType::Scalar(*kind), bytes)?))
                        }
                        false => None,
                    };
                    (target, Value::Optional(value))
                }
            };
            insert(&mut record, &target.path(), value);
        }

        Ok(record)
    }

    /// Behaves like `<name>_serialize(value, buffer, capacity)` on a zeroed
    /// buffer of `capacity` bytes.
    pub fn serialize(&self, value: &Value, capacity: usize) -> Result<Written, InterpretError> {
        if capacity < self.plan.prefix() {
            return Err(Fault::BufferTooShort.into());
        }

        let mut writer = Writer { buffer: vec![0; capacity], offset: self.plan.prefix() };

        for step in self.plan.steps() {
            match step {
                Step::SeedCursor { offset } => writer.offset = *offset,
                Step::Scalar { target, kind, access } => {
                    let bytes = lookup(value, target)?.encode(&FieldType::Scalar(*kind))?;
                    writer.fixed(*access, &bytes)?;
                }
                Step::Block { target, ty, access, .. } => {
                    let bytes = lookup(value, target)?.encode(ty)?;
                    writer.fixed(*access, &bytes)?;
                }
                Step::Text { target } => writer.text(text(lookup(value, target)?, target)?)?,
                Step::TextArray { target, count } => {
                    let elements = match lookup(value, target)? {
                        Value::Array(elements) if elements.len() == *count => elements,
                        _ => return Err(mismatch(target, &format!("array of {} strings", count))),
                    };
                    for element in elements {
                        writer.text(text(element, target)?)?;
                    }
                }
                Step::OptionalText { target } => match lookup(value, target)? {
                    Value::Optional(None) => writer.flag(false)?,
                    Value::Optional(Some(inner)) => {
                        writer.flag(true)?;
                        writer.text(text(inner, target)?)?;
                    }
                    _ => return Err(mismatch(target, "optional string")),
                },
                Step::OptionalScalar { target, kind } => match lookup(value, target)? {
                    Value::Optional(None) => writer.flag(false)?,
                    Value::Optional(Some(inner)) => {
                        let bytes = inner.encode(&FieldType::Scalar(*kind))?;
                        writer.flag(true)?;
                        writer.fixed(Access::Cursor, &bytes)?;
                    }
                    _ => return Err(mismatch(target, "optional scalar")),
                },
            }
        }

        Ok(Written { bytes: writer.buffer, cursor: writer.offset })
    }
}

struct Reader<'b> {
    buffer: &'b [u8],
    offset: usize,
}

impl<'b> Reader<'b> {
    fn fixed(&mut self, access: Access, width: usize) -> Result<&'b [u8], Fault> {
        match access {
            Access::Static(at) => self.buffer.get(at..at + width).ok_or(Fault::BufferTooShort),
            Access::Cursor => {
                if self.buffer.len() - self.offset < width {
                    return Err(Fault::BufferTooShort);
                }
                let bytes = &self.buffer[self.offset..self.offset + width];
                self.offset += width;
                Ok(bytes)
            }
        }
    }

    fn flag(&mut self) -> Result<bool, Fault> {
        Ok(self.fixed(Access::Cursor, PRESENCE_FLAG)?[0] != 0)
    }

    fn text(&mut self) -> Result<String, Fault> {
        let prefix = self.fixed(Access::Cursor, TEXT_LENGTH_PREFIX)?;
        let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let bytes = self.fixed(Access::Cursor, len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

struct Writer {
    buffer: Vec<u8>,
    offset: usize,
}

impl Writer {
    fn fixed(&mut self, access: Access, bytes: &[u8]) -> Result<(), Fault> {
        let at = match access {
            Access::Static(at) => at,
            Access::Cursor => {
                if self.buffer.len() - self.offset < bytes.len() {
                    return Err(Fault::BufferTooShort);
                }
                self.offset += bytes.len();
                self.offset - bytes.len()
            }
        };
        self.buffer
            .get_mut(at..at + bytes.len())
            .ok_or(Fault::BufferTooShort)?
            .copy_from_slice(bytes);
        Ok(())
    }

    fn flag(&mut self, present: bool) -> Result<(), Fault> {
        self.fixed(Access::Cursor, &[present as u8])
    }

    /// Strings are measured with `strlen`, so anything after an interior
    /// NUL is dropped.
    fn text(&mut self, text: &str) -> Result<(), Fault> {
        let bytes = text.as_bytes();
        let bytes = &bytes[..bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len())];
        self.fixed(Access::Cursor, &text_length(bytes.len())?.to_le_bytes())?;
        self.fixed(Access::Cursor, bytes)
    }
}

/// The `u32` length prefix for a string of `len` bytes. Longer strings
/// cannot be framed and fail like the C `size > 0xFFFFFFFFu` check.
fn text_length(len: usize) -> Result<u32, Fault> {
    u32::try_from(len).map_err(|_| Fault::BufferTooShort)
}

fn decode(ty: &FieldType, bytes: &[u8]) -> Result<Value, Fault> {
    // Only reachable with exactly `fixed_width` bytes in hand.
    Value::decode(ty, bytes).map_err(|_| Fault::BufferTooShort)
}

fn insert(record: &mut Value, path: &[String], value: Value) {
    match path {
        [] => {}
        [name] => record.set(name, value),
        [head, rest @ ..] => {
            if record.get(head).is_none() {
                record.set(head, Value::Struct(vec![]));
            }
            if let Some(inner) = record.get_mut(head) {
                insert(inner, rest, value);
            }
        }
    }
}

fn lookup<'v>(record: &'v Value, target: &Target) -> Result<&'v Value, InterpretError> {
    target
        .path()
        .iter()
        .try_fold(record, |value, name| value.get(name))
        .ok_or_else(|| InterpretError::MissingMember(target.dotted()))
}

fn text<'v>(value: &'v Value, target: &Target) -> Result<&'v str, InterpretError> {
    match value {
        Value::Text(text) => Ok(text.as_str()),
        _ => Err(mismatch(target, "string")),
    }
}

fn mismatch(target: &Target, expected: &str) -> InterpretError {
    InterpretError::Codec(CodecError::TypeMismatch { path: target.dotted(), expected: expected.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alon_schema::{Field, ScalarKind::*};

    fn record(fields: Vec<(&str, Value)>) -> Value {
        Value::Struct(fields.into_iter().map(|(n, v)| (n.to_string(), v)).collect())
    }

    #[test]
    fn fixed_record() {
        let plan = Plan::build(&[Field::new("x", FieldType::Scalar(U32)), Field::new("y", FieldType::Scalar(U16))], "out").unwrap();
        let interp = Interpreter::new(&plan);
        let expected = record(vec![("x", Value::U32(50)), ("y", Value::U16(1000))]);

        assert_eq!(interp.deserialize(&[50, 0, 0, 0, 232, 3]), Ok(expected.clone()));
        assert_eq!(interp.deserialize(&[50, 0, 0, 0, 232]), Err(Fault::BufferTooShort));
        assert_eq!(interp.deserialize(&[50, 0, 0, 0, 232, 3, 9]), Ok(expected.clone()));

        let written = interp.serialize(&expected, 6).unwrap();
        assert_eq!(written.payload(), [50, 0, 0, 0, 232, 3]);
        assert_eq!(interp.serialize(&expected, 5), Err(InterpretError::Fault(Fault::BufferTooShort)));
    }

    #[test]
    fn optional_string() {
        let plan = Plan::build(&[Field::new("m", FieldType::optional(FieldType::Text))], "out").unwrap();
        let interp = Interpreter::new(&plan);

        let absent = record(vec![("m", Value::Optional(None))]);
        assert_eq!(interp.serialize(&absent, 8).unwrap().payload(), [0]);
        assert_eq!(interp.deserialize(&[0]), Ok(absent));

        let present = record(vec![("m", Value::Optional(Some(Box::new(Value::Text("bruh".into())))))]);
        let bytes = [1, 4, 0, 0, 0, b'b', b'r', b'u', b'h'];
        assert_eq!(interp.serialize(&present, 9).unwrap().payload(), bytes);
        assert_eq!(interp.deserialize(&bytes), Ok(present));
        assert_eq!(interp.deserialize(&bytes[..8]), Err(Fault::BufferTooShort));
        assert_eq!(interp.deserialize(&[]), Err(Fault::BufferTooShort));
    }

    #[test]
    fn nested_and_arrays() {
        let inner = FieldType::Struct(vec![Field::new("a", FieldType::Scalar(U8))]);
        let plan = Plan::build(
            &[
                Field::new("inner", inner),
                Field::new("names", FieldType::array(FieldType::Text, 2)),
                Field::new("n", FieldType::optional(FieldType::Scalar(U16))),
            ],
            "out",
        )
        .unwrap();
        let interp = Interpreter::new(&plan);
        let value = record(vec![
            ("inner", record(vec![("a", Value::U8(7))])),
            ("names", Value::Array(vec![Value::Text("a".into()), Value::Text("".into())])),
            ("n", Value::Optional(Some(Box::new(Value::U16(2))))),
        ]);

        let written = interp.serialize(&value, 32).unwrap();
        assert_eq!(written.payload(), [7, 1, 0, 0, 0, b'a', 0, 0, 0, 0, 1, 2, 0]);
        assert_eq!(written.bytes.len(), 32);
        assert_eq!(interp.deserialize(written.payload()), Ok(value));
    }

    #[test]
    fn interior_nul_truncates() {
        let plan = Plan::build(&[Field::new("s", FieldType::Text)], "in").unwrap();
        let value = record(vec![("s", Value::Text("ab\0cd".into()))]);
        let written = Interpreter::new(&plan).serialize(&value, 16).unwrap();
        assert_eq!(written.payload(), [2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_strings_cannot_be_framed() {
        assert_eq!(text_length(0), Ok(0));
        assert_eq!(text_length(u32::MAX as usize), Ok(u32::MAX));
        assert_eq!(text_length(u32::MAX as usize + 1), Err(Fault::BufferTooShort));
    }

    #[test]
    fn malformed_values() {
        let plan = Plan::build(&[Field::new("s", FieldType::Text)], "in").unwrap();
        let interp = Interpreter::new(&plan);
        assert_eq!(
            interp.serialize(&record(vec![]), 16),
            Err(InterpretError::MissingMember("s".into()))
        );
        assert!(matches!(
            interp.serialize(&record(vec![("s", Value::U8(1))]), 16),
            Err(InterpretError::Codec(CodecError::TypeMismatch { .. }))
        ));
    }
}
