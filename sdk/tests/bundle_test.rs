#![cfg(test)]

use std::path::PathBuf;

use alon::{decode_to_json, test_vectors, Bundle, CompileOptions, Manifest};
use serde_json::json;

fn fixture() -> Manifest {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas.json");
    Manifest::load(path).expect("fixture manifest")
}

#[test]
fn vectors_match_the_wire_format() {
    let vectors = test_vectors(&fixture()).unwrap();

    assert_eq!(vectors["single_fixed"]["examples"][0]["output"], json!([10]));
    assert_eq!(vectors["double_packed"]["examples"][0]["output"], json!([50, 0, 0, 0, 232, 3]));
    assert_eq!(vectors["double_padded"]["examples"][0]["output"], json!([1, 255, 255, 255, 255]));
    assert_eq!(
        vectors["two_strings"]["examples"][0]["output"],
        json!([3, 0, 0, 0, 102, 111, 111, 3, 0, 0, 0, 98, 97, 114])
    );
    assert_eq!(vectors["byte_run"]["examples"][0]["output"], json!([1, 2, 3, 1, 0, 2, 0, 3, 0, 4, 0]));
    assert_eq!(vectors["maybe"]["examples"][0]["output"], json!([0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
    assert_eq!(
        vectors["maybe"]["examples"][1]["output"],
        json!([1, 4, 0, 0, 0, 98, 114, 117, 104, 1, 7, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 97, 1, 0, 0, 0, 98])
    );
    assert_eq!(
        vectors["mixed"]["examples"][0]["output"],
        json!([1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 104, 105, 2, 0, 1, 2, 3, 4, 1, 1, 0, 0, 0, 120])
    );
}

#[test]
fn vectors_decode_back_to_their_inputs() {
    let manifest = fixture();
    let vectors = test_vectors(&manifest).unwrap();

    for case in &manifest.cases {
        for example in vectors[&case.prefix]["examples"].as_array().unwrap() {
            let bytes: Vec<u8> = serde_json::from_value(example["output"].clone()).unwrap();
            let decoded: serde_json::Value = serde_json::from_str(&decode_to_json(&case.definition, &bytes).unwrap()).unwrap();
            assert_eq!(decoded, example["input"], "{}", case.prefix);
        }
    }
}

#[test]
fn bundle_declares_every_case() {
    let manifest = fixture();
    let bundle = Bundle::build(&manifest, &CompileOptions::default()).unwrap();

    for case in &manifest.cases {
        assert!(bundle.header.contains(&format!("struct alon_{} {{", case.prefix)));
        assert!(bundle.header.contains(&format!("int alon_{}_serialize(", case.prefix)));
        assert!(bundle.source.contains(&format!("void alon_{}_release(struct alon_{} *x) {{", case.prefix, case.prefix)));
    }
}
