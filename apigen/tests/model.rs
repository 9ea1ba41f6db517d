//! Model construction and traversal: lookups, enclosing chains, the base
//! relation, and the malformed-input rejections.

use std::sync::LazyLock;

use apigen::ApiDescription;

static MODEL: LazyLock<ApiDescription> = LazyLock::new(|| {
    apigen::build_model(include_str!("fixtures/testapi.json")).expect("build model from fixture")
});

#[test]
fn class_lookup_by_name() {
    assert!(MODEL.class_by_name("IlBuilder").is_ok());
    assert!(MODEL.class_by_name("JBCase").is_ok(), "nested classes are indexed too");

    let err = MODEL.class_by_name("NoSuchClass").expect_err("unknown name must fail");
    assert!(
        err.to_string().contains("NoSuchClass"),
        "diagnostic must name the class: {err}"
    );
}

#[test]
fn enclosing_chain_outermost_first() {
    assert_eq!(
        MODEL.containing_classes("JBCase").expect("JBCase"),
        &["IlBuilder".to_string()]
    );
    assert!(MODEL.containing_classes("IlBuilder").expect("IlBuilder").is_empty());
}

#[test]
fn base_follows_the_extends_chain_to_the_root() {
    let method_builder = MODEL.class_by_name("MethodBuilder").expect("MethodBuilder");
    assert_eq!(MODEL.base_of(method_builder).name, "IlBuilder");

    let stack = MODEL
        .class_by_name("VirtualMachineOperandStack")
        .expect("VirtualMachineOperandStack");
    assert_eq!(MODEL.base_of(stack).name, "VirtualMachineState");

    // A class with no parent is its own base.
    let il_builder = MODEL.class_by_name("IlBuilder").expect("IlBuilder");
    assert_eq!(MODEL.base_of(il_builder).name, "IlBuilder");
    assert!(MODEL.parent_of(il_builder).is_none());
}

#[test]
fn declared_services_suppress_duplicate_overload_names() {
    let il_builder = MODEL.class_by_name("IlBuilder").expect("IlBuilder");
    let declared = MODEL.declared_services(il_builder);
    let stores: Vec<_> = declared.iter().filter(|s| s.name == "Store").collect();
    assert_eq!(stores.len(), 1, "first Store wins, later duplicates suppressed");
    assert_eq!(stores[0].parms[0].name, "name");

    // Distinct suffixes are distinct overload names.
    let pushes: Vec<String> = declared
        .iter()
        .filter(|s| s.name == "Push")
        .map(|s| s.overload_name())
        .collect();
    assert_eq!(pushes, vec!["Push".to_string(), "PushArray".to_string()]);
}

#[test]
fn recorder_hooks_collect_through_the_parent_chain() {
    let method_builder = MODEL.class_by_name("MethodBuilder").expect("MethodBuilder");
    let hooks = MODEL.recorder_hooks(method_builder);
    let names: Vec<&str> = hooks.iter().map(|s| s.name.as_str()).collect();

    assert!(names.contains(&"DefineLine"), "own service missing: {names:?}");
    assert!(names.contains(&"buildIl"), "own callback missing: {names:?}");
    assert!(names.contains(&"Add"), "inherited service missing: {names:?}");
    // Deduplicated by overload name.
    assert_eq!(
        names.iter().filter(|n| **n == "Store").count(),
        1,
        "duplicate hooks must collapse: {names:?}"
    );
}

#[test]
fn listenable_classes_are_flag_driven() {
    let names: Vec<&str> = MODEL
        .listenable_classes()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["IlBuilder", "MethodBuilder"]);
}

#[test]
fn version_triple_parsed() {
    assert_eq!(MODEL.version.major, 2);
    assert_eq!(MODEL.version.minor, 14);
    assert_eq!(MODEL.version.patch, 3);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn cyclic_extends_chain_rejected() {
    let json = r#"{
        "project": "Cycle",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            { "name": "A", "extends": "B" },
            { "name": "B", "extends": "A" }
        ]
    }"#;
    let err = apigen::build_model(json).expect_err("cycle must be rejected");
    assert!(
        err.to_string().contains("cyclic"),
        "diagnostic should call out the cycle: {err}"
    );
}

#[test]
fn self_extends_rejected() {
    let json = r#"{
        "project": "Cycle",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            { "name": "A", "extends": "A" }
        ]
    }"#;
    assert!(apigen::build_model(json).is_err());
}

#[test]
fn unknown_parent_rejected() {
    let json = r#"{
        "project": "Dangling",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            { "name": "A", "extends": "Ghost" }
        ]
    }"#;
    let err = apigen::build_model(json).expect_err("unknown parent must be rejected");
    assert!(err.to_string().contains("Ghost"), "diagnostic must name the parent: {err}");
}

#[test]
fn duplicate_class_name_rejected() {
    let json = r#"{
        "project": "Dup",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            { "name": "A" },
            { "name": "B", "types": [ { "name": "A" } ] }
        ]
    }"#;
    let err = apigen::build_model(json).expect_err("flattened names must stay unique");
    assert!(err.to_string().contains("duplicate class name"), "{err}");
}

#[test]
fn array_parameter_requires_length_binding() {
    let json = r#"{
        "project": "NoLen",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            {
                "name": "A",
                "services": [
                    {
                        "name": "run",
                        "return": "none",
                        "parms": [
                            { "name": "items", "type": "int32Array", "attributes": ["array"] }
                        ]
                    }
                ]
            }
        ]
    }"#;
    let err = apigen::build_model(json).expect_err("array without array_len must be rejected");
    assert!(err.to_string().contains("array_len"), "{err}");
}

#[test]
fn array_length_must_name_a_sibling_parameter() {
    let json = r#"{
        "project": "BadLen",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            {
                "name": "A",
                "services": [
                    {
                        "name": "run",
                        "return": "none",
                        "parms": [
                            {
                                "name": "items",
                                "type": "int32Array",
                                "attributes": ["array"],
                                "array_len": "ghost"
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;
    let err = apigen::build_model(json).expect_err("dangling array_len must be rejected");
    assert!(err.to_string().contains("ghost"), "{err}");
}

#[test]
fn vararg_parameter_must_be_a_trailing_array() {
    let json = r#"{
        "project": "BadVararg",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            {
                "name": "A",
                "services": [
                    {
                        "name": "run",
                        "return": "none",
                        "parms": [
                            { "name": "x", "type": "int32", "attributes": ["can_be_vararg"] }
                        ]
                    }
                ]
            }
        ]
    }"#;
    assert!(apigen::build_model(json).is_err(), "non-array vararg must be rejected");
}

#[test]
fn missing_required_key_fails_at_parse_time() {
    // A service without a return type never reaches generation.
    let json = r#"{
        "project": "Short",
        "version": { "major": 0, "minor": 0, "patch": 0 },
        "classes": [
            {
                "name": "A",
                "services": [ { "name": "run", "parms": [] } ]
            }
        ]
    }"#;
    assert!(apigen::build_model(json).is_err());
}
