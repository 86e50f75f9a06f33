use alon_compiler::Interpreter;
use alon_schema::Value;
use serde_json::{json, Map, Value as Json};
use tracing::debug;

use crate::{error::AlonError, manifest::{Manifest, SchemaCase}};

/// Golden vectors for every case:
/// `{prefix: {definition, examples: [{input, output: [bytes]}]}}`.
///
/// Each example is encoded with the reference codec, then replayed through
/// the layout plan in both directions. Any disagreement is an error, so the
/// vectors describe what the generated C will actually do.
pub fn test_vectors(manifest: &Manifest) -> Result<Json, AlonError> {
    let mut vectors = Map::new();
    for case in &manifest.cases {
        vectors.insert(case.prefix.clone(), case_vectors(case)?);
    }
    Ok(Json::Object(vectors))
}

fn case_vectors(case: &SchemaCase) -> Result<Json, AlonError> {
    let ty = case.definition.as_field_type();
    let plan = case.plan()?;
    let interp = Interpreter::new(&plan);

    let examples = case
        .examples
        .iter()
        .enumerate()
        .map(|(index, input)| -> Result<Json, AlonError> {
            let mismatch = |reason: String| AlonError::VectorMismatch {
                prefix: case.prefix.clone(),
                index,
                reason,
            };

            let value = Value::from_json(input, &ty)?;
            let output = value.encode(&ty)?;

            let decoded = interp.deserialize(&output)?;
            if decoded != value {
                return Err(mismatch(format!("plan decodes {:?}, expected {:?}", decoded, value)));
            }

            let written = interp.serialize(&value, output.len())?;
            if written.payload() != output.as_slice() {
                return Err(mismatch(format!("plan encodes {:?}, expected {:?}", written.payload(), output)));
            }

            debug!(prefix = case.prefix.as_str(), index, len = output.len(), "vector");
            Ok(json!({ "input": input, "output": output }))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(json!({ "definition": case.definition, "examples": examples }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(text: &str) -> Manifest {
        Manifest::from_json_str(text).unwrap()
    }

    #[test]
    fn double_packed_vector() {
        let vectors = test_vectors(&manifest(
            r#"{"cases": [{
                "prefix": "double_packed",
                "definition": {"kind": "struct", "fields": [["x", "u32"], ["y", "u16"]]},
                "examples": [{"x": 50, "y": 1000}]
            }]}"#,
        ))
        .unwrap();

        assert_eq!(
            vectors["double_packed"]["examples"][0],
            json!({"input": {"x": 50, "y": 1000}, "output": [50, 0, 0, 0, 232, 3]})
        );
        assert_eq!(
            vectors["double_packed"]["definition"],
            json!({"kind": "struct", "fields": [["x", "u32"], ["y", "u16"]]})
        );
    }

    #[test]
    fn optional_string_vectors() {
        let vectors = test_vectors(&manifest(
            r#"{"cases": [{
                "prefix": "maybe",
                "definition": {"kind": "struct", "fields": [["x", {"kind": "option", "type": "string"}]]},
                "examples": [{"x": null}, {"x": "bruh"}]
            }]}"#,
        ))
        .unwrap();

        let examples = &vectors["maybe"]["examples"];
        assert_eq!(examples[0]["output"], json!([0]));
        assert_eq!(examples[1]["output"], json!([1, 4, 0, 0, 0, 98, 114, 117, 104]));
    }

    #[test]
    fn bad_example_is_reported() {
        let result = test_vectors(&manifest(
            r#"{"cases": [{
                "prefix": "t",
                "definition": {"kind": "struct", "fields": [["x", "u8"]]},
                "examples": [{"x": "not a number"}]
            }]}"#,
        ));
        assert!(matches!(result, Err(AlonError::Codec(_))));
    }

    #[test]
    fn unsupported_schema_is_reported() {
        let result = test_vectors(&manifest(
            r#"{"cases": [{
                "prefix": "t",
                "definition": {"kind": "struct", "fields": [["x", {"kind": "option", "type": ["u8", 2]}]]},
                "examples": []
            }]}"#,
        ));
        assert!(matches!(result, Err(AlonError::Compile(_))));
    }
}
