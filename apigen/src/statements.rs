//! Statement-names artifact.
//!
//! One header collecting the API version triple, the recorder wire
//! signature constants, and a string constant per service of every
//! listenable class — the vocabulary a recorder emits and a replay layer
//! consumes.

use std::path::Path;

use anyhow::Result;

use crate::cppgen::banner;
use crate::model::ApiDescription;
use crate::naming;
use crate::output::Artifact;

pub fn generate(model: &ApiDescription, header_dir: &Path) -> Result<Artifact> {
    let stem = "StatementNames";
    let guard = naming::include_guard(stem);

    let mut out = banner(&model.project);
    out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    out.push_str("#include <cstdint>\n\n");

    for ns in &model.namespaces {
        out.push_str(&format!("namespace {ns} {{\n"));
    }
    out.push_str("namespace StatementNames {\n\n");

    out.push_str(&format!(
        "static const int16_t VERSION_MAJOR = {};\n",
        model.version.major
    ));
    out.push_str(&format!(
        "static const int16_t VERSION_MINOR = {};\n",
        model.version.minor
    ));
    out.push_str(&format!(
        "static const int16_t VERSION_PATCH = {};\n\n",
        model.version.patch
    ));

    out.push_str("static const char * const RECORDER_SIGNATURE = \"JBIL\";\n");
    out.push_str("static const char * const JBIL_COMPLETE      = \"Done\";\n\n");

    // One constant per service name; listenable classes can share service
    // names up the extends chain, so emit each name once.
    let mut seen: Vec<String> = Vec::new();
    for class in model.listenable_classes() {
        for service in model.declared_services(class) {
            if seen.contains(&service.name) {
                continue;
            }
            seen.push(service.name.clone());
            out.push_str(&format!(
                "static const char * const {} = \"{}\";\n",
                naming::statement_constant(service),
                service.name
            ));
        }
    }
    out.push('\n');

    out.push_str("static const char * const STATEMENT_ID16BIT = \"ID16BIT\";\n");
    out.push_str("static const char * const STATEMENT_ID32BIT = \"ID32BIT\";\n\n");

    out.push_str("} // namespace StatementNames\n");
    for ns in model.namespaces.iter().rev() {
        out.push_str(&format!("}} // namespace {ns}\n"));
    }
    out.push('\n');
    out.push_str(&format!("#endif // {guard}\n"));

    Ok(Artifact::new(header_dir.join(format!("{stem}.hpp")), out))
}
