use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("Unexpected end of buffer while reading {0}")]
    UnexpectedEof(String),

    #[error("{0} trailing bytes after the decoded value")]
    TrailingBytes(usize),

    #[error("Variant index {index} is out of range for enum {path} with {count} variants")]
    InvalidVariant {
        path:  String,
        index: u8,
        count: usize,
    },

    #[error("Value mismatch at {path}: expected {expected}")]
    TypeMismatch {
        path:     String,
        expected: String,
    },
}
