//! Type mapping table: spellings, the conversion partition, and lookup
//! failures.

use std::sync::LazyLock;

use apigen::ApiDescription;
use apigen::types::TypeMap;

static MODEL: LazyLock<ApiDescription> = LazyLock::new(|| {
    apigen::build_model(include_str!("fixtures/testapi.json")).expect("build model from fixture")
});

#[test]
fn primitives_spell_the_same_on_both_sides() {
    let types = TypeMap::new(&MODEL, "TR");
    for (name, spelling) in [
        ("none", "void"),
        ("boolean", "bool"),
        ("int32", "int32_t"),
        ("double", "double"),
        ("pointer", "void *"),
        ("constString", "const char *"),
    ] {
        assert_eq!(types.client_type(name).expect(name), spelling);
        assert_eq!(types.impl_type(name).expect(name), spelling);
        assert!(!types.needs_conversion(name), "{name} must not convert");
    }
}

#[test]
fn handles_get_distinct_client_and_impl_spellings() {
    let types = TypeMap::new(&MODEL, "TR");
    for class in ["IlValue", "IlBuilder", "TypeDictionary"] {
        let client = types.client_type(class).expect(class);
        let impl_ = types.impl_type(class).expect(class);
        assert!(!client.is_empty() && !impl_.is_empty());
        assert_ne!(client, impl_, "{class} spellings must differ across the boundary");
        assert!(types.needs_conversion(class), "{class} must convert");
    }
    assert_eq!(types.client_type("IlValue").expect("IlValue"), "IlValue *");
    assert_eq!(types.impl_type("IlValue").expect("IlValue"), "TR::IlValue *");
}

#[test]
fn impl_namespace_is_configurable() {
    let types = TypeMap::new(&MODEL, "Internal");
    assert_eq!(
        types.impl_type("IlValue").expect("IlValue"),
        "Internal::IlValue *"
    );
}

#[test]
fn derived_array_and_byref_forms_resolve() {
    let types = TypeMap::new(&MODEL, "TR");
    assert_eq!(types.client_type("IlValueArray").expect("array"), "IlValue **");
    assert_eq!(types.impl_type("IlValueArray").expect("array"), "TR::IlValue **");
    assert_eq!(types.client_type("IlBuilderByRef").expect("byref"), "IlBuilder **");
    // Array and by-ref forms are bracketed, never converted inline.
    assert!(!types.needs_conversion("IlValueArray"));
    assert!(!types.needs_conversion("IlBuilderByRef"));
}

#[test]
fn nested_classes_qualify_or_flatten_by_variant() {
    let types = TypeMap::new(&MODEL, "TR");
    assert_eq!(types.client_type("JBCase").expect("nested"), "IlBuilder::JBCase *");
    assert_eq!(
        types.client_type_flat("JBCase").expect("nested"),
        "IlBuilderJBCase *"
    );
}

#[test]
fn primitive_arrays_stay_primitive() {
    let types = TypeMap::new(&MODEL, "TR");
    assert_eq!(types.client_type("int32Array").expect("int32Array"), "int32_t *");
    assert!(!types.needs_conversion("int32Array"));
    assert_eq!(
        types.client_element_type("int32Array").expect("element"),
        "int32_t"
    );
}

#[test]
fn bracket_elements_name_the_wrapped_class() {
    let types = TypeMap::new(&MODEL, "TR");
    assert_eq!(types.bracket_element("IlValueArray").expect("array"), "IlValue");
    assert_eq!(types.bracket_element("IlBuilderByRef").expect("byref"), "IlBuilder");
}

#[test]
fn absent_names_fail_instead_of_emitting_placeholders() {
    let types = TypeMap::new(&MODEL, "TR");
    for name in ["mystery", "IlValu", "IlValueArrayy", "GhostArray"] {
        let err = types.client_type(name).expect_err(name);
        assert!(
            err.to_string().contains(name),
            "diagnostic must name the type: {err}"
        );
    }
}
