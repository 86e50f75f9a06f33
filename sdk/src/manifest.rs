use std::{collections::HashSet, fs, path::Path};

use alon_compiler::{decls::DESERIALIZE_BASE, verify_schema, Plan};
use alon_schema::Schema;
use serde::{Deserialize, Serialize};

use crate::error::AlonError;

/// One record to compile, with example values used for test vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaCase {
    /// Record name. Generated symbols are `<namespace>_<prefix>_*`.
    pub prefix:     String,
    pub definition: Schema,
    #[serde(default)]
    pub examples:   Vec<serde_json::Value>,
}

impl SchemaCase {
    /// The verified layout plan of this record, as seen by the deserializer.
    pub fn plan(&self) -> Result<Plan, AlonError> {
        verify_schema(&self.prefix, &self.definition)?;
        Ok(Plan::build(&self.definition.fields, DESERIALIZE_BASE)?)
    }
}

/// The set of records compiled into one `alon.h`/`alon.c` pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub cases: Vec<SchemaCase>,
}

impl Manifest {
    /// Parses a manifest and rejects duplicate prefixes, which would produce
    /// clashing C symbols.
    pub fn from_json_str(text: &str) -> Result<Manifest, AlonError> {
        let manifest: Manifest = serde_json::from_str(text)?;
        let mut seen = HashSet::new();
        for case in &manifest.cases {
            if !seen.insert(case.prefix.as_str()) {
                return Err(AlonError::DuplicateCase(case.prefix.clone()));
            }
        }
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Manifest, AlonError> {
        Manifest::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn case(&self, prefix: &str) -> Result<&SchemaCase, AlonError> {
        self.cases
            .iter()
            .find(|c| c.prefix == prefix)
            .ok_or_else(|| AlonError::UnknownCase(prefix.to_string()))
    }
}
