//! On-disk pipeline behavior: artifact placement, extras staging, and the
//! no-partial-output guarantee on failure.

use std::path::PathBuf;

use apigen::{GenOptions, Variant};

fn fixture_path(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("testapi.json");
    std::fs::write(&path, include_str!("fixtures/testapi.json")).expect("write fixture");
    path
}

#[test]
fn run_writes_headers_and_sources_to_their_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let header_dir = dir.path().join("include");
    let source_dir = dir.path().join("src");

    apigen::run(&GenOptions {
        description: fixture_path(&dir),
        header_dir: header_dir.clone(),
        source_dir: source_dir.clone(),
        variant: Variant::Cpp,
        impl_namespace: "TR".to_string(),
        extras_dir: None,
    })
    .expect("run cpp generation");

    for name in ["IlBuilder.hpp", "MethodBuilder.hpp", "JitBuilder.hpp"] {
        assert!(header_dir.join(name).is_file(), "missing header {name}");
    }
    for name in ["IlBuilder.cpp", "MethodBuilder.cpp", "JitBuilder.cpp"] {
        assert!(source_dir.join(name).is_file(), "missing source {name}");
    }
}

#[test]
fn run_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let description = fixture_path(&dir);

    let opts = |suffix: &str| GenOptions {
        description: description.clone(),
        header_dir: dir.path().join(format!("include-{suffix}")),
        source_dir: dir.path().join(format!("src-{suffix}")),
        variant: Variant::Cpp,
        impl_namespace: "TR".to_string(),
        extras_dir: None,
    };
    apigen::run(&opts("a")).expect("first run");
    apigen::run(&opts("b")).expect("second run");

    let a = std::fs::read_to_string(dir.path().join("include-a/IlBuilder.hpp")).expect("a");
    let b = std::fs::read_to_string(dir.path().join("include-b/IlBuilder.hpp")).expect("b");
    assert_eq!(a, b, "two runs over the same description must agree");
}

#[test]
fn extras_staged_verbatim() {
    let dir = tempfile::tempdir().expect("tempdir");
    let extras_dir = dir.path().join("extras");
    std::fs::create_dir_all(&extras_dir).expect("extras dir");
    std::fs::write(
        extras_dir.join("TypeDictionaryExtrasInsideClass.hpp"),
        "// hand-written extras\n",
    )
    .expect("write extras header");
    std::fs::write(extras_dir.join("notes.txt"), "not a header\n").expect("write stray file");

    let header_dir = dir.path().join("include");
    apigen::run(&GenOptions {
        description: fixture_path(&dir),
        header_dir: header_dir.clone(),
        source_dir: dir.path().join("src"),
        variant: Variant::Cpp,
        impl_namespace: "TR".to_string(),
        extras_dir: Some(extras_dir),
    })
    .expect("run with extras");

    let staged = header_dir.join("TypeDictionaryExtrasInsideClass.hpp");
    assert_eq!(
        std::fs::read_to_string(staged).expect("staged extras"),
        "// hand-written extras\n",
        "extras must be copied byte for byte"
    );
    assert!(
        !header_dir.join("notes.txt").exists(),
        "only .hpp extras are staged"
    );
}

#[test]
fn failed_generation_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let description = dir.path().join("broken.json");
    std::fs::write(
        &description,
        r#"{
            "project": "Broken",
            "version": { "major": 0, "minor": 1, "patch": 0 },
            "classes": [
                {
                    "name": "Widget",
                    "services": [ { "name": "frob", "return": "mystery", "parms": [] } ]
                }
            ]
        }"#,
    )
    .expect("write broken description");

    let header_dir = dir.path().join("include");
    let err = apigen::run(&GenOptions {
        description,
        header_dir: header_dir.clone(),
        source_dir: dir.path().join("src"),
        variant: Variant::Cpp,
        impl_namespace: "TR".to_string(),
        extras_dir: None,
    })
    .expect_err("unknown type must fail the run");
    assert!(format!("{err:#}").contains("mystery"), "{err:#}");

    assert!(
        !header_dir.exists(),
        "a failed run must not leave partial output behind"
    );
}

#[test]
fn missing_description_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nowhere.json");
    let err = apigen::run(&GenOptions {
        description: missing.clone(),
        header_dir: dir.path().join("include"),
        source_dir: dir.path().join("src"),
        variant: Variant::Cpp,
        impl_namespace: "TR".to_string(),
        extras_dir: None,
    })
    .expect_err("missing file must fail");
    assert!(
        format!("{err:#}").contains("nowhere.json"),
        "diagnostic must name the path: {err:#}"
    );
}
