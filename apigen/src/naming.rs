//! Naming rules for generated entities.
//!
//! Every variant derives names from here rather than concatenating strings
//! in place, so the conventions stay consistent across the C++, C, and
//! listener/recorder emitters.

use crate::model::{ApiDescription, ClassDesc};
use crate::schema::ServiceDecl;

/// C++ spelling of a class name, qualified by its enclosing classes
/// (`Outer::Inner`).
pub fn qualified_class(class: &ClassDesc) -> String {
    let mut parts = class.containers.clone();
    parts.push(class.name.clone());
    parts.join("::")
}

/// Flattened class name used by the C variant and by file-scope symbols:
/// enclosing class names prefixed with no separator (`OuterInner`).
pub fn flat_class(class: &ClassDesc) -> String {
    let mut parts = class.containers.clone();
    parts.push(class.name.clone());
    parts.concat()
}

/// Implementation-side spelling of a class (`TR::IlBuilder`).
pub fn impl_class(impl_namespace: &str, class: &ClassDesc) -> String {
    format!("{}::{}", impl_namespace, class.name)
}

/// Name of the `extern "C"` allocator that wraps a raw implementation
/// pointer in a fresh client object.
pub fn allocator(class: &ClassDesc) -> String {
    format!("allocate{}", flat_class(class))
}

/// Name of the implementation-side hook that registers a client allocator.
pub fn allocator_setter(class: &ClassDesc) -> String {
    format!("setClientAllocator_{}", flat_class(class))
}

/// Name of the `extern "C"` thunk the implementation calls to reach a
/// client-overridden callback.
pub fn callback_thunk(class: &ClassDesc, callback: &ServiceDecl) -> String {
    format!("{}Callback_{}", flat_class(class), callback.name)
}

/// Name of the implementation-side setter that installs a callback thunk.
pub fn callback_setter(callback: &ServiceDecl) -> String {
    format!("setClientCallback_{}", callback.name)
}

/// Implementation entry point for a free-standing (non-member) service.
pub fn impl_service(service: &ServiceDecl) -> String {
    format!("internal_{}", service.name)
}

/// C client function for a class service: `<Class>_<overloadName>`.
pub fn c_service(class: &ClassDesc, service: &ServiceDecl) -> String {
    format!("{}_{}", flat_class(class), service.overload_name())
}

/// Variadic twin of a C client function.
pub fn c_vararg_service(class: &ClassDesc, service: &ServiceDecl) -> String {
    format!("{}_v", c_service(class, service))
}

/// C constructor function names: `New<Class>`, then `New<Class>2`, ... for
/// the later overloads (C has no overloading).
pub fn c_constructor(class: &ClassDesc, index: usize) -> String {
    if index == 0 {
        format!("New{}", flat_class(class))
    } else {
        format!("New{}{}", flat_class(class), index + 1)
    }
}

/// C spelling of the initialize-from-implementation hook.
pub fn c_initializer(class: &ClassDesc) -> String {
    format!("{}_initializeFromImpl", flat_class(class))
}

/// C destructor function.
pub fn c_destructor(class: &ClassDesc) -> String {
    format!("Delete{}", flat_class(class))
}

pub fn listener_class(class: &ClassDesc) -> String {
    format!("{}Listener", class.name)
}

pub fn recorder_class(class: &ClassDesc) -> String {
    format!("{}Recorder", class.name)
}

/// Include-guard macro for a file stem.
pub fn include_guard(stem: &str) -> String {
    format!("{}_INCL", stem.to_uppercase())
}

/// Statement-name constant for a service.
pub fn statement_constant(service: &ServiceDecl) -> String {
    format!("STATEMENT_{}", service.name.to_uppercase())
}

/// Root of a class's extends chain, spelled flat — the struct that holds
/// the `_impl` slot in the C variant.
pub fn c_impl_root(model: &ApiDescription, class: &ClassDesc) -> String {
    flat_class(model.base_of(class))
}
