use alon_compiler::{CompileError, Fault, InterpretError};
use alon_schema::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Generated code would fail: {0}")]
    Fault(#[from] Fault),

    #[error("Plan interpreter error: {0}")]
    Interpret(#[from] InterpretError),

    #[error("No schema named \"{0}\" in the manifest")]
    UnknownCase(String),

    #[error("The schema \"{0}\" is defined twice in the manifest")]
    DuplicateCase(String),

    #[error("Example {index} of \"{prefix}\": {reason}")]
    VectorMismatch {
        prefix: String,
        index:  usize,
        reason: String,
    },
}
