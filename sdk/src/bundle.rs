use std::{
    fs,
    path::{Path, PathBuf},
};

use alon_compiler::{compile, prelude, CompileOptions};
use tracing::info;

use crate::{error::AlonError, manifest::Manifest};

/// A generated header/source pair covering every case of a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// File stem of both files, `alon` by default.
    pub stem:   String,
    pub header: String,
    pub source: String,
}

impl Bundle {
    pub fn build(manifest: &Manifest, options: &CompileOptions) -> Result<Bundle, AlonError> {
        let compiled = manifest
            .cases
            .iter()
            .map(|case| compile(&case.prefix, &case.definition, options))
            .collect::<Result<Vec<_>, _>>()?;

        let mut header = prelude(options.target);
        let mut source = format!("#include \"{}.h\"\n", options.namespace);
        for schema in &compiled {
            header.push('\n');
            header.push_str(&schema.header());
            source.push('\n');
            source.push_str(&schema.source());
        }

        Ok(Bundle { stem: options.namespace.clone(), header, source })
    }

    pub fn header_name(&self) -> String {
        format!("{}.h", self.stem)
    }

    pub fn source_name(&self) -> String {
        format!("{}.c", self.stem)
    }

    /// Writes both files into `dir`, creating it if needed, and returns their
    /// paths.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf), AlonError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let header_path = dir.join(self.header_name());
        let source_path = dir.join(self.source_name());
        fs::write(&header_path, &self.header)?;
        fs::write(&source_path, &self.source)?;

        info!(header = %header_path.display(), source = %source_path.display(), "wrote bundle");
        Ok((header_path, source_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alon_compiler::Target;

    fn manifest() -> Manifest {
        Manifest::from_json_str(
            r#"{"cases": [
                {"prefix": "single_fixed", "definition": {"kind": "struct", "fields": [["x", "u8"]]}},
                {"prefix": "named", "definition": {"kind": "struct", "fields": [["name", "string"]]}}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn header_then_records() {
        let bundle = Bundle::build(&manifest(), &CompileOptions::default()).unwrap();
        assert!(bundle.header.starts_with("#pragma once\n"));
        let fixed = bundle.header.find("struct alon_single_fixed {").unwrap();
        let named = bundle.header.find("struct alon_named {").unwrap();
        assert!(bundle.header.find("#define ALON_OK 0").unwrap() < fixed);
        assert!(fixed < named);

        assert!(bundle.source.starts_with("#include \"alon.h\"\n"));
        assert!(bundle.source.contains("int alon_named_deserialize("));
        assert!(bundle.source.contains("void alon_single_fixed_release("));
    }

    #[test]
    fn solana_bundle() {
        let options = CompileOptions { target: Target::Solana, ..CompileOptions::default() };
        let bundle = Bundle::build(&manifest(), &options).unwrap();
        assert!(bundle.header.contains("#include <solana_sdk.h>"));
        assert!(bundle.source.contains("int alon_named_deserialize_instruction("));
    }

    #[test]
    fn one_bad_case_fails_the_bundle() {
        let manifest = Manifest::from_json_str(
            r#"{"cases": [{"prefix": "e", "definition": {"kind": "enum", "values": [["A", "u8"]]}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Bundle::build(&manifest, &CompileOptions::default()),
            Err(AlonError::Compile(alon_compiler::CompileError::TopLevelEnum(_)))
        ));
    }

    #[test]
    fn writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::build(&manifest(), &CompileOptions::default()).unwrap();
        let (header, source) = bundle.write_to(dir.path().join("output")).unwrap();

        assert_eq!(header.file_name(), Some(std::ffi::OsStr::new("alon.h")));
        assert_eq!(fs::read_to_string(&header).unwrap(), bundle.header);
        assert_eq!(fs::read_to_string(&source).unwrap(), bundle.source);
    }
}
