//! C client emission: struct embedding, flattened names, explicit self,
//! constructor functions, vararg twins.

use std::path::Path;
use std::sync::LazyLock;

use apigen::{Artifact, Variant};

static ARTIFACTS: LazyLock<Vec<Artifact>> = LazyLock::new(|| {
    let json = include_str!("fixtures/testapi.json");
    let model = apigen::build_model(json).expect("build model from fixture");
    apigen::generate(
        &model,
        Variant::C,
        "TR",
        Path::new("include"),
        Path::new("src"),
    )
    .expect("generate C client")
});

fn text(file: &str) -> &'static str {
    ARTIFACTS
        .iter()
        .find(|a| a.path.ends_with(file))
        .map(|a| a.text.as_str())
        .unwrap_or_else(|| {
            let have: Vec<_> = ARTIFACTS.iter().map(|a| a.path.clone()).collect();
            panic!("missing artifact {file}. Have: {have:?}")
        })
}

fn pos(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{haystack}"))
}

#[test]
fn c_headers_and_cpp_bridge_sources() {
    // Same pairing as the C++ variant, with .h declaration artifacts.
    text("IlBuilder.h");
    text("IlBuilder.cpp");
    text("JitBuilder.h");
    text("JitBuilder.cpp");
}

#[test]
fn parent_embedded_as_first_super_field() {
    let header = text("MethodBuilder.h");
    let open = pos(header, "struct MethodBuilder {");
    let embed = pos(header, "    IlBuilder super;");
    let close = pos(header, "};");
    assert!(open < embed && embed < close, "super must be inside the struct");

    // The impl slot lives on the root struct only.
    assert!(!header.contains("void * _impl;"), "derived struct re-declares _impl:\n{header}");
    let base = text("IlBuilder.h");
    let base_open = pos(base, "struct IlBuilder {");
    let slot = pos(base, "    void * _impl;");
    assert!(base_open < slot);
}

#[test]
fn every_class_forward_declared_flat() {
    let header = text("IlValue.h");
    assert!(header.contains("typedef struct IlBuilder IlBuilder;"));
    assert!(
        header.contains("typedef struct IlBuilderJBCase IlBuilderJBCase;"),
        "nested classes flatten to top-level names:\n{header}"
    );
}

#[test]
fn nested_class_flattened_to_sibling_struct() {
    let header = text("IlBuilder.h");
    assert!(header.contains("struct IlBuilderJBCase {"));
    assert!(header.contains("IlBuilderJBCase * NewIlBuilderJBCase(int32_t value);"));
}

#[test]
fn services_take_explicit_self_first() {
    let header = text("IlBuilder.h");
    assert!(header.contains(
        "IlValue * IlBuilder_Add(IlBuilder * self, IlValue * left, IlValue * right);"
    ));
    // Static services have no receiver.
    let counter = text("Counter.h");
    assert!(counter.contains("void Counter_make();"));
    assert!(!counter.contains("Counter_make(Counter * self"));
}

#[test]
fn vararg_twin_uses_v_suffix_and_delegates() {
    let header = text("IlBuilder.h");
    assert!(header.contains(
        "IlValue * IlBuilder_Call(IlBuilder * self, const char * name, int32_t numArgs, IlValue ** args);"
    ));
    assert!(header.contains(
        "IlValue * IlBuilder_Call_v(IlBuilder * self, const char * name, int32_t numArgs, ...);"
    ));

    let source = text("IlBuilder.cpp");
    let alloc = pos(source, "IlValue ** args = new IlValue *[numArgs];");
    let delegate = pos(source, "IlValue * ret = IlBuilder_Call(self, name, numArgs, args);");
    let release = pos(source, "delete[] args;");
    assert!(alloc < delegate && delegate < release);
}

#[test]
fn constructor_functions_numbered_for_overloads() {
    let header = text("MethodBuilder.h");
    assert!(header.contains("MethodBuilder * NewMethodBuilder(TypeDictionary * dict);"));
    assert!(header.contains(
        "MethodBuilder * NewMethodBuilder2(TypeDictionary * dict, MethodBuilder * caller);"
    ));
}

#[test]
fn constructor_allocates_wrapper_and_impl() {
    let source = text("MethodBuilder.cpp");
    let wrapper = pos(source, "MethodBuilder * self = new MethodBuilder();");
    let impl_alloc = pos(source, "TR::MethodBuilder * implObj = new TR::MethodBuilder(");
    let associate = pos(source, "implObj->setClient(self);");
    let init = pos(source, "MethodBuilder_initializeFromImpl(self, implObj);");
    assert!(wrapper < impl_alloc && impl_alloc < associate && associate < init);
}

#[test]
fn allocator_is_the_adopting_constructor() {
    let header = text("TypeDictionary.h");
    assert!(header.contains("void * allocateTypeDictionary(void * impl);"));

    let source = text("TypeDictionary.cpp");
    let def = pos(source, "extern \"C\" void * allocateTypeDictionary(void * impl) {");
    let adopt = pos(source, "static_cast<TR::TypeDictionary *>(impl)->setClient(self);");
    let init = pos(source, "TypeDictionary_initializeFromImpl(self, impl);");
    assert!(def < adopt && adopt < init);
}

#[test]
fn initializer_walks_the_embedding_chain() {
    let source = text("MethodBuilder.cpp");
    assert!(source.contains(
        "extern \"C\" void MethodBuilder_initializeFromImpl(MethodBuilder * self, void * impl) {"
    ));
    assert!(source.contains(
        "IlBuilder_initializeFromImpl(reinterpret_cast<IlBuilder *>(self), impl);"
    ));

    let base = text("IlBuilder.cpp");
    assert!(base.contains("self->_impl = impl;"));
}

#[test]
fn impl_reached_through_the_root_struct() {
    let source = text("MethodBuilder.cpp");
    assert!(source.contains(
        "static_cast<TR::MethodBuilder *>(reinterpret_cast<IlBuilder *>(self)->_impl)->DefineLine("
    ));
    // A root class dereferences its own slot directly.
    let base = text("IlBuilder.cpp");
    assert!(base.contains("static_cast<TR::IlBuilder *>(self->_impl)->Add("));
}

#[test]
fn destructor_function_per_class() {
    let header = text("IlBuilder.h");
    assert!(header.contains("void DeleteIlBuilder(IlBuilder * self);"));
    let source = text("IlBuilder.cpp");
    assert!(source.contains("extern \"C\" void DeleteIlBuilder(IlBuilder * self) {"));
    assert!(source.contains("delete self;"));
}

#[test]
fn headers_stay_c_compatible() {
    let header = text("IlBuilder.h");
    assert!(header.contains("#ifdef __cplusplus\nextern \"C\" {\n#endif"));
    assert!(header.contains("#include <stdint.h>"));
    assert!(
        !header.contains("class "),
        "C headers must not declare C++ classes:\n{header}"
    );
}

#[test]
fn bracketing_rules_shared_with_the_cpp_variant() {
    let source = text("IlBuilder.cpp");
    let setup = pos(source, "ARG_SETUP(IlBuilder, thenPathImpl, thenPathArg, thenPath);");
    let call = pos(source, "->IfThenElse(thenPathArg, elsePathArg);");
    let teardown = pos(source, "ARG_RETURN(IlBuilder, thenPathImpl, thenPath);");
    assert!(setup < call && call < teardown);

    // Wrapped handle results use the flattened client name.
    assert!(source.contains("GET_CLIENT_OBJECT(clientObj, IlValue, implRet);"));
}

#[test]
fn free_services_in_aggregate_pair() {
    let header = text("JitBuilder.h");
    assert!(header.contains("bool initializeJit();"));
    assert!(header.contains("void shutdownJit();"));

    let source = text("JitBuilder.cpp");
    assert!(source.contains("extern \"C\" bool initializeJit() {"));
    assert!(source.contains("internal_initializeJit()"));
}
