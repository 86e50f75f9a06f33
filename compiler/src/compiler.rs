use std::{fmt, str::FromStr};

use alon_schema::Schema;
use tracing::debug;

use crate::{
    decls::{
        emit_adapter_prototypes, emit_adapters, emit_prototypes, emit_struct, DESERIALIZE_BASE, SERIALIZE_BASE,
    },
    emit::{emit_deserialize, emit_serialize},
    error::CompileError,
    lifecycle::emit_release,
    plan::Plan,
    verifier::{check_identifier, verify_schema},
};

/// The environment the generated C is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Hosted C with libc.
    #[default]
    Host,
    /// Solana BPF programs, built against `solana_sdk.h`.
    Solana,
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Target, String> {
        match s {
            "host" => Ok(Target::Host),
            "solana" => Ok(Target::Solana),
            _ => Err(format!("Unknown target {:?}, expected \"host\" or \"solana\"", s)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Host => f.write_str("host"),
            Target::Solana => f.write_str("solana"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Prefix of every generated symbol.
    pub namespace: String,
    pub target:    Target,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { namespace: "alon".to_string(), target: Target::Host }
    }
}

impl CompileOptions {
    /// `<namespace>_<name>`: the struct tag and the stem of every function.
    pub fn symbol(&self, name: &str) -> String {
        format!("{}_{}", self.namespace, name)
    }
}

/// Generated C for one record, split by role.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    pub name:             String,
    /// Struct definition and prototypes, including adapter prototypes.
    pub declarations:     String,
    pub deserialize_body: String,
    pub serialize_body:   String,
    pub lifecycle_body:   String,
    /// Account and instruction adapters, present for [`Target::Solana`].
    pub adapters:         Option<String>,
}

impl CompiledSchema {
    pub fn header(&self) -> String {
        self.declarations.clone()
    }

    pub fn source(&self) -> String {
        let mut parts = vec![
            self.deserialize_body.as_str(),
            self.serialize_body.as_str(),
            self.lifecycle_body.as_str(),
        ];
        if let Some(adapters) = &self.adapters {
            parts.push(adapters);
        }
        parts.join("\n")
    }
}

/// Compiles the record `name` into C. Every rejection happens before any
/// code is emitted.
pub fn compile(name: &str, schema: &Schema, options: &CompileOptions) -> Result<CompiledSchema, CompileError> {
    check_identifier(&options.namespace)?;
    verify_schema(name, schema)?;

    let symbol = options.symbol(name);
    let read_plan = Plan::build(&schema.fields, DESERIALIZE_BASE)?;
    let write_plan = Plan::build(&schema.fields, SERIALIZE_BASE)?;

    let mut declarations = format!("{}\n{}", emit_struct(&symbol, &schema.fields)?, emit_prototypes(&symbol));
    let adapters = match options.target {
        Target::Host => None,
        Target::Solana => {
            declarations.push_str(&emit_adapter_prototypes(&symbol));
            Some(emit_adapters(&symbol))
        }
    };

    debug!(
        name,
        symbol = symbol.as_str(),
        prefix = read_plan.prefix(),
        dynamic = read_plan.is_dynamic(),
        "compiled schema"
    );

    Ok(CompiledSchema {
        name: name.to_string(),
        declarations,
        deserialize_body: emit_deserialize(&symbol, &read_plan),
        serialize_body: emit_serialize(&symbol, &write_plan),
        lifecycle_body: emit_release(&symbol, &schema.fields),
        adapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alon_schema::{Field, FieldType, ScalarKind::*};

    fn double_padded() -> Schema {
        Schema::new_struct(vec![Field::new("x", FieldType::Scalar(U8)), Field::new("y", FieldType::Scalar(U32))])
    }

    #[test]
    fn host_output() {
        let compiled = compile("double_padded", &double_padded(), &CompileOptions::default()).unwrap();
        assert!(compiled.header().starts_with("struct alon_double_padded {\n  uint8_t x;\n  uint32_t y;\n};\n\n"));
        assert!(compiled.header().contains("void alon_double_padded_release(struct alon_double_padded *x);\n"));
        assert_eq!(compiled.adapters, None);
        assert!(!compiled.source().contains("SolAccountInfo"));
        assert!(compiled.source().contains("alon_memcpy(&out->y, buffer + 1, 4);"));
        assert!(compiled.source().contains("alon_memcpy(buffer + 1, &in->y, 4);"));
    }

    #[test]
    fn solana_adds_adapters() {
        let options = CompileOptions { target: Target::Solana, ..CompileOptions::default() };
        let compiled = compile("double_padded", &double_padded(), &options).unwrap();
        assert!(compiled.header().contains("int alon_double_padded_deserialize_account(const SolAccountInfo *account"));
        assert!(compiled.source().contains("return alon_double_padded_deserialize(params->data, params->data_len, out);"));
    }

    #[test]
    fn custom_namespace() {
        let options = CompileOptions { namespace: "acme".into(), ..CompileOptions::default() };
        let compiled = compile("double_padded", &double_padded(), &options).unwrap();
        assert!(compiled.header().starts_with("struct acme_double_padded {"));
        assert!(compiled.source().contains("int acme_double_padded_serialize("));

        let bad = CompileOptions { namespace: "1x".into(), ..CompileOptions::default() };
        assert!(matches!(compile("t", &double_padded(), &bad), Err(CompileError::InvalidIdentifier(_))));
    }

    #[test]
    fn rejects_before_emitting() {
        let schema = Schema::new_enum(vec![Field::new("A", FieldType::Scalar(U8))]);
        assert!(matches!(
            compile("e", &schema, &CompileOptions::default()),
            Err(CompileError::TopLevelEnum(_))
        ));
    }

    #[test]
    fn targets_parse() {
        assert_eq!("host".parse::<Target>(), Ok(Target::Host));
        assert_eq!("solana".parse::<Target>(), Ok(Target::Solana));
        assert!("wasm".parse::<Target>().is_err());
        assert_eq!(Target::Solana.to_string(), "solana");
    }
}
