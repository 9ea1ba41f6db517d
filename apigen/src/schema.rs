//! Serde types for the JSON API description.
//!
//! This is the validating parse layer: a document missing a required key
//! fails here, with serde's path in the error, instead of somewhere deep in
//! generation. Structural rules that serde cannot express (parent links,
//! `array_len` bindings, cyclic `extends` chains) are checked when the
//! [`model::ApiDescription`](crate::model::ApiDescription) is built.

use serde::Deserialize;
use std::path::Path;

/// Root of the API description document.
#[derive(Debug, Deserialize)]
pub struct ApiFile {
    /// Project name, used for the aggregate artifact file names.
    pub project: String,
    pub version: Version,
    /// Enclosing namespace path, outermost first.
    #[serde(default)]
    pub namespace: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    /// Free-standing services (not members of any class).
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
}

/// Semantic version triple of the described API.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Version {
    pub major: i16,
    pub minor: i16,
    pub patch: i16,
}

/// One class in the description. `types` holds nested classes.
#[derive(Debug, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub extends: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
    #[serde(default)]
    pub callbacks: Vec<ServiceDecl>,
    #[serde(default)]
    pub types: Vec<ClassDecl>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Deserialize)]
pub struct ConstructorDecl {
    #[serde(default)]
    pub parms: Vec<ParameterDecl>,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// A service or callback. Callbacks reuse the same shape; only the list
/// they appear in differs.
#[derive(Debug, Deserialize)]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default, rename = "overloadsuffix")]
    pub overload_suffix: String,
    #[serde(rename = "return")]
    pub return_type: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub parms: Vec<ParameterDecl>,
}

#[derive(Debug, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Name of the companion length parameter; required iff the `array`
    /// attribute is present.
    #[serde(default)]
    pub array_len: Option<String>,
}

// Flag and attribute spellings used in the description document.
pub const FLAG_STATIC: &str = "static";
pub const FLAG_PROTECTED: &str = "protected";
pub const FLAG_SETS_ALLOCATORS: &str = "sets_allocators";
pub const FLAG_IMPL_DEFAULT: &str = "impl_default";
pub const FLAG_HAS_EXTRAS: &str = "has_extras_header";
pub const FLAG_LISTENABLE: &str = "listenable";
pub const ATTR_IN_OUT: &str = "in_out";
pub const ATTR_ARRAY: &str = "array";
pub const ATTR_CAN_BE_VARARG: &str = "can_be_vararg";

/// Load and parse an API description document.
pub fn load_description(path: &Path) -> anyhow::Result<ApiFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read description file {}: {}", path.display(), e))?;
    parse_description(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse description file {}: {}", path.display(), e))
}

/// Parse an API description from a JSON string.
pub fn parse_description(json: &str) -> anyhow::Result<ApiFile> {
    let api: ApiFile = serde_json::from_str(json)?;
    Ok(api)
}
