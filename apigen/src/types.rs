//! Type mapping — abstract description type names to target-language
//! spellings.
//!
//! The table has two halves: a fixed, hand-maintained primitive map, and the
//! handle spellings derived from the classes registered in the description
//! (`X`, `XArray`, `XByRef` for every class `X`). Primitives spell the same
//! on both sides of the client/implementation boundary; handle types spell
//! as a client wrapper pointer on one side and an implementation pointer on
//! the other, and are the types that need conversion when crossing.

use anyhow::{Result, bail};

use crate::model::ApiDescription;

/// Fixed primitive spellings. Spelled identically for client and
/// implementation code.
const PRIMITIVES: &[(&str, &str)] = &[
    ("none", "void"),
    ("boolean", "bool"),
    ("integer", "size_t"),
    ("unsignedInteger", "size_t"),
    ("int8", "int8_t"),
    ("int16", "int16_t"),
    ("int32", "int32_t"),
    ("int64", "int64_t"),
    ("uint32", "uint32_t"),
    ("float", "float"),
    ("double", "double"),
    ("pointer", "void *"),
    ("ppointer", "void **"),
    ("constString", "const char *"),
    ("string", "char *"),
    ("booleanArray", "bool *"),
    ("int32Array", "int32_t *"),
];

/// How an abstract type name resolved against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
    Primitive(&'static str),
    /// A class handle; the payload is the class name.
    Handle(String),
    /// Array of class handles.
    HandleArray(String),
    /// In-out class handle.
    HandleByRef(String),
}

/// The type mapping table for one generation run.
pub struct TypeMap<'a> {
    model: &'a ApiDescription,
    impl_namespace: String,
}

impl<'a> TypeMap<'a> {
    pub fn new(model: &'a ApiDescription, impl_namespace: &str) -> Self {
        TypeMap {
            model,
            impl_namespace: impl_namespace.to_string(),
        }
    }

    /// Implementation-side namespace prefix (e.g. `TR`).
    pub fn impl_namespace(&self) -> &str {
        &self.impl_namespace
    }

    fn resolve(&self, name: &str) -> Result<Resolved> {
        if let Some(&(_, spelling)) = PRIMITIVES.iter().find(|(n, _)| *n == name) {
            return Ok(Resolved::Primitive(spelling));
        }
        if self.model.is_class(name) {
            return Ok(Resolved::Handle(name.to_string()));
        }
        if let Some(base) = name.strip_suffix("Array")
            && self.model.is_class(base)
        {
            return Ok(Resolved::HandleArray(base.to_string()));
        }
        if let Some(base) = name.strip_suffix("ByRef")
            && self.model.is_class(base)
        {
            return Ok(Resolved::HandleByRef(base.to_string()));
        }
        bail!("unknown type name `{name}` in API description");
    }

    /// Client-facing spelling, with nested class names qualified the C++
    /// way (`Outer::Inner`).
    pub fn client_type(&self, name: &str) -> Result<String> {
        match self.resolve(name)? {
            Resolved::Primitive(s) => Ok(s.to_string()),
            Resolved::Handle(base) => Ok(format!("{} *", self.qualified(&base)?)),
            Resolved::HandleArray(base) | Resolved::HandleByRef(base) => {
                Ok(format!("{} **", self.qualified(&base)?))
            }
        }
    }

    /// Client-facing spelling with flattened class names, for the C
    /// variant (C has no namespaces or nested types).
    pub fn client_type_flat(&self, name: &str) -> Result<String> {
        match self.resolve(name)? {
            Resolved::Primitive(s) => Ok(s.to_string()),
            Resolved::Handle(base) => Ok(format!("{} *", self.flattened(&base)?)),
            Resolved::HandleArray(base) | Resolved::HandleByRef(base) => {
                Ok(format!("{} **", self.flattened(&base)?))
            }
        }
    }

    /// Implementation-facing spelling.
    pub fn impl_type(&self, name: &str) -> Result<String> {
        match self.resolve(name)? {
            Resolved::Primitive(s) => Ok(s.to_string()),
            Resolved::Handle(base) => Ok(format!("{}::{} *", self.impl_namespace, base)),
            Resolved::HandleArray(base) | Resolved::HandleByRef(base) => {
                Ok(format!("{}::{} **", self.impl_namespace, base))
            }
        }
    }

    /// True if a value of this type needs unwrap/wrap conversion when
    /// crossing the client/implementation boundary directly (plain handles
    /// only — array and by-ref forms go through setup/teardown bracketing).
    pub fn needs_conversion(&self, name: &str) -> bool {
        matches!(self.resolve(name), Ok(Resolved::Handle(_)))
    }

    /// The class name behind `X`, `XArray`, or `XByRef`, if this is a
    /// handle-derived type.
    pub fn handle_base(&self, name: &str) -> Option<String> {
        match self.resolve(name) {
            Ok(Resolved::Handle(b))
            | Ok(Resolved::HandleArray(b))
            | Ok(Resolved::HandleByRef(b)) => Some(b),
            _ => None,
        }
    }

    /// Element spelling used by the setup/teardown macros: the class name
    /// for handle-derived types, the bare primitive spelling (pointer
    /// stripped) for primitive arrays.
    pub fn bracket_element(&self, name: &str) -> Result<String> {
        match self.resolve(name)? {
            Resolved::Handle(b) | Resolved::HandleArray(b) | Resolved::HandleByRef(b) => Ok(b),
            Resolved::Primitive(s) => Ok(s.trim_end_matches([' ', '*']).to_string()),
        }
    }

    /// Spelling of one element of an array-typed parameter on the client
    /// side, e.g. `IlValue *` for `IlValueArray`, `int32_t` for
    /// `int32Array`. This is the type `va_arg` drains in variadic adapters.
    pub fn client_element_type(&self, name: &str) -> Result<String> {
        match self.resolve(name)? {
            Resolved::HandleArray(base) => Ok(format!("{} *", self.qualified(&base)?)),
            Resolved::Primitive(s) => Ok(s.trim_end_matches([' ', '*']).to_string()),
            _ => bail!("type `{name}` is not an array type"),
        }
    }

    fn qualified(&self, class_name: &str) -> Result<String> {
        let mut parts = self.model.containing_classes(class_name)?.to_vec();
        parts.push(class_name.to_string());
        Ok(parts.join("::"))
    }

    fn flattened(&self, class_name: &str) -> Result<String> {
        let mut parts = self.model.containing_classes(class_name)?.to_vec();
        parts.push(class_name.to_string());
        Ok(parts.concat())
    }
}
