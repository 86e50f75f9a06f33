//! alon-compiler
//!
//! Turns a verified record schema into C:
//!  1) a layout plan that tracks static offsets until the first
//!     variable-width field and a runtime cursor after it,
//!  2) `deserialize`/`serialize` functions emitted from that plan,
//!  3) a `release` function freeing every owned string,
//!  4) the storage struct, prototypes and optional Solana adapters,
//!  5) an interpreter that runs a plan the way the emitted C does.

pub mod compiler;
pub mod decls;
pub mod emit;
pub mod error;
pub mod interp;
pub mod layout;
pub mod lifecycle;
pub mod plan;
pub mod scope;
pub mod utils;
pub mod verifier;

pub use compiler::{compile, CompileOptions, CompiledSchema, Target};
pub use decls::prelude;
pub use error::{CompileError, Fault, OK_STATUS};
pub use interp::{InterpretError, Interpreter, Written};
pub use plan::{Plan, Step};
pub use verifier::verify_schema;
