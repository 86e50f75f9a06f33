use alon_schema::{Field, FieldType};

use crate::{error::{CompileError, Fault, OK_STATUS}, compiler::Target};

pub const DESERIALIZE_BASE: &str = "out";
pub const SERIALIZE_BASE: &str = "in";
pub const RELEASE_BASE: &str = "x";

/// Members of the anonymous struct that stores an optional scalar.
pub const PRESENCE_MEMBER: &str = "is_some";
pub const VALUE_MEMBER: &str = "value";

pub fn deserialize_signature(symbol: &str) -> String {
    format!(
        "int {}_deserialize(const uint8_t *buffer, uint64_t length, struct {} *{})",
        symbol, symbol, DESERIALIZE_BASE
    )
}

pub fn serialize_signature(symbol: &str) -> String {
    format!(
        "int {}_serialize(const struct {} *{}, uint8_t *buffer, uint64_t length)",
        symbol, symbol, SERIALIZE_BASE
    )
}

pub fn release_signature(symbol: &str) -> String {
    format!("void {}_release(struct {} *{})", symbol, symbol, RELEASE_BASE)
}

/// The storage struct for a record.
pub fn emit_struct(symbol: &str, fields: &[Field]) -> Result<String, CompileError> {
    let members = fields
        .iter()
        .map(|field| member(field).map(|decl| format!("  {}", decl)))
        .collect::<Result<Vec<_>, CompileError>>()?;

    Ok(format!("struct {} {{\n{}\n}};\n", symbol, members.join("\n")))
}

fn member(field: &Field) -> Result<String, CompileError> {
    let name = &field.name;
    match &field.ty {
        FieldType::Scalar(kind) => Ok(format!("{} {};", kind.c_type(), name)),
        FieldType::Text => Ok(format!("char *{};", name)),
        FieldType::FixedBytes(len) => Ok(format!("uint8_t {}[{}];", name, len)),
        FieldType::FixedArray(element, count) if **element == FieldType::Text => Ok(format!("char *{}[{}];", name, count)),
        FieldType::FixedArray(..) => {
            let (base, dims) = array_parts(&field.ty).ok_or_else(|| CompileError::UnsupportedArrayElement(name.clone()))?;
            Ok(format!("{} {}{};", base, name, dims))
        }
        FieldType::Optional(inner) => match inner.as_ref() {
            FieldType::Text => Ok(format!("char *{};", name)),
            FieldType::Scalar(kind) => Ok(format!(
                "struct {{\n    uint8_t {};\n    {} {};\n  }} {};",
                PRESENCE_MEMBER,
                kind.c_type(),
                VALUE_MEMBER,
                name
            )),
            _ => Err(CompileError::UnsupportedOptional(name.clone())),
        },
        FieldType::Struct(_) => Err(CompileError::NestedComposite { field: name.clone(), kind: "struct" }),
        FieldType::Enum(_) => Err(CompileError::NestedComposite { field: name.clone(), kind: "enum" }),
    }
}

/// Element C type and the `[n][m]` suffix of a fixed-width array.
fn array_parts(ty: &FieldType) -> Option<(&'static str, String)> {
    match ty {
        FieldType::Scalar(kind) => Some((kind.c_type(), String::new())),
        FieldType::FixedBytes(len) => Some(("uint8_t", format!("[{}]", len))),
        FieldType::FixedArray(element, count) => {
            let (base, dims) = array_parts(element)?;
            Some((base, format!("[{}]{}", count, dims)))
        }
        _ => None,
    }
}

pub fn emit_prototypes(symbol: &str) -> String {
    format!(
        "{};\n{};\n{};\n",
        deserialize_signature(symbol),
        serialize_signature(symbol),
        release_signature(symbol)
    )
}

fn adapter_signatures(symbol: &str) -> [String; 3] {
    [
        format!(
            "int {}_deserialize_account(const SolAccountInfo *account, struct {} *{})",
            symbol, symbol, DESERIALIZE_BASE
        ),
        format!(
            "int {}_serialize_account(const struct {} *{}, SolAccountInfo *account)",
            symbol, symbol, SERIALIZE_BASE
        ),
        format!(
            "int {}_deserialize_instruction(const SolParameters *params, struct {} *{})",
            symbol, symbol, DESERIALIZE_BASE
        ),
    ]
}

/// Prototypes for the account and instruction adapters.
pub fn emit_adapter_prototypes(symbol: &str) -> String {
    adapter_signatures(symbol).iter().map(|s| format!("{};\n", s)).collect()
}

/// Definitions of the account and instruction adapters. Each one forwards
/// the host buffer to the core function.
pub fn emit_adapters(symbol: &str) -> String {
    let [account_in, account_out, instruction] = adapter_signatures(symbol);
    let bodies = [
        (
            account_in,
            format!("{}_deserialize(account->data, account->data_len, {})", symbol, DESERIALIZE_BASE),
        ),
        (
            account_out,
            format!("{}_serialize({}, account->data, account->data_len)", symbol, SERIALIZE_BASE),
        ),
        (
            instruction,
            format!("{}_deserialize(params->data, params->data_len, {})", symbol, DESERIALIZE_BASE),
        ),
    ];

    bodies
        .iter()
        .map(|(signature, call)| format!("{} {{\n  return {};\n}}\n", signature, call))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header preamble shared by every record: includes, memory primitives and
/// status codes.
pub fn prelude(target: Target) -> String {
    let (includes, memory) = match target {
        Target::Host => (
            "#include <stddef.h>\n#include <stdint.h>\n#include <stdlib.h>\n#include <string.h>\n",
            [
                ("alon_memcpy", "(dst, src, n) memcpy((dst), (src), (n))"),
                ("alon_alloc", "(n) ((char *)calloc((n), 1))"),
                ("alon_free", "(p) free(p)"),
                ("alon_strlen", "(s) strlen(s)"),
            ],
        ),
        Target::Solana => (
            "#include <solana_sdk.h>\n",
            [
                ("alon_memcpy", "(dst, src, n) sol_memcpy((dst), (src), (n))"),
                ("alon_alloc", "(n) ((char *)sol_calloc((n), char))"),
                ("alon_free", "(p) sol_free(p)"),
                ("alon_strlen", "(s) sol_strlen(s)"),
            ],
        ),
    };

    // Each hook can be predefined before the header is included.
    let memory = memory
        .iter()
        .map(|(name, body)| format!("#ifndef {0}\n#define {0}{1}\n#endif", name, body))
        .collect::<Vec<_>>();

    let mut statuses = vec![format!("#define {} {}", OK_STATUS.0, OK_STATUS.1)];
    statuses.extend(Fault::ALL.iter().map(|f| format!("#define {} {}", f.c_name(), f.code())));

    format!("#pragma once\n\n{}\n{}\n\n{}\n", includes, memory.join("\n"), statuses.join("\n"))
}
