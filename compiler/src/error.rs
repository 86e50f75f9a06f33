use thiserror::Error;

/// Compile-time rejections. All of them are raised before any C is emitted.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("Schema {0} is an enum; raw deserializers can only be generated for structs")]
    TopLevelEnum(String),

    #[error("Field {field} is a nested {kind}, which the generated storage layout does not support")]
    NestedComposite {
        field: String,
        kind:  &'static str,
    },

    #[error("Field {0} is optional over a type that is neither a string nor a scalar")]
    UnsupportedOptional(String),

    #[error("Field {0} is an array of an unsupported element type")]
    UnsupportedArrayElement(String),

    #[error("Field {0} has length zero")]
    ZeroLength(String),

    #[error("Struct {0} has no fields")]
    EmptyStruct(String),

    #[error("The name {0} is not a valid C identifier")]
    InvalidIdentifier(String),

    #[error("The field {0} is defined twice")]
    DuplicateField(String),

    #[error("Field {0} does not fit in the addressable layout")]
    LayoutOverflow(String),
}

/// Failure statuses returned by the generated functions. Success is
/// [`OK_STATUS`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("buffer too short")]
    BufferTooShort,

    #[error("allocation failed")]
    AllocationFailure,
}

/// Name and value of the success status in generated code.
pub const OK_STATUS: (&str, i32) = ("ALON_OK", 0);

impl Fault {
    pub const ALL: [Fault; 2] = [Fault::BufferTooShort, Fault::AllocationFailure];

    /// Status code returned by the generated function.
    pub fn code(self) -> i32 {
        match self {
            Fault::BufferTooShort => 1,
            Fault::AllocationFailure => 2,
        }
    }

    /// Name of the status macro in generated code.
    pub fn c_name(self) -> &'static str {
        match self {
            Fault::BufferTooShort => "ALON_ERR_BUFFER_TOO_SHORT",
            Fault::AllocationFailure => "ALON_ERR_ALLOC",
        }
    }
}
