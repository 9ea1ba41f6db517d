//! apigen — JSON API description → C/C++ client API generator.
//!
//! Reads a declarative description of a class/method API and emits the
//! client-side wrapper code that delegates every call to an internal
//! implementation object: a C++ class-based client, a C struct-based
//! client, or the C++ client plus its listener/recorder instrumentation
//! surface.
//!
//! # Quick start
//!
//! Generate the C++ client from a description (suitable for a build step):
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! let opts = apigen::GenOptions {
//!     description: PathBuf::from("jitbuilder.api.json"),
//!     header_dir: PathBuf::from("client/include"),
//!     source_dir: PathBuf::from("client/src"),
//!     variant: apigen::Variant::Cpp,
//!     impl_namespace: "TR".to_string(),
//!     extras_dir: None,
//! };
//! apigen::run(&opts).unwrap();
//! ```
//!
//! Or get the artifacts in memory without writing to disk:
//!
//! ```no_run
//! let json = std::fs::read_to_string("jitbuilder.api.json").unwrap();
//! let model = apigen::build_model(&json).unwrap();
//! let artifacts = apigen::generate(
//!     &model,
//!     apigen::Variant::Cpp,
//!     "TR",
//!     std::path::Path::new("include"),
//!     std::path::Path::new("src"),
//! )
//! .unwrap();
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

pub mod cgen;
pub mod cppgen;
pub mod lisgen;
pub mod model;
pub mod naming;
pub mod output;
pub mod schema;
pub mod statements;
pub mod types;

pub use model::ApiDescription;
pub use output::Artifact;

/// Which client surface to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// C++ class-based client.
    Cpp,
    /// C struct-based client.
    C,
    /// C++ client plus the listener/recorder instrumentation surface.
    Listener,
}

/// Options for a full generation run.
#[derive(Debug)]
pub struct GenOptions {
    /// Path to the JSON API description.
    pub description: PathBuf,
    /// Destination directory for declaration artifacts (headers).
    pub header_dir: PathBuf,
    /// Destination directory for definition artifacts (sources).
    pub source_dir: PathBuf,
    pub variant: Variant,
    /// Namespace prefix for implementation-side type spellings.
    pub impl_namespace: String,
    /// Directory of verbatim extras headers to stage into `header_dir`.
    pub extras_dir: Option<PathBuf>,
}

/// Run the full pipeline: load the description, build the model, generate
/// the selected variant's artifacts, and write them out.
pub fn run(opts: &GenOptions) -> Result<()> {
    let api = schema::load_description(&opts.description)?;
    let model = model::ApiDescription::from_file(api)
        .with_context(|| format!("invalid API description {}", opts.description.display()))?;

    let artifacts = generate(
        &model,
        opts.variant,
        &opts.impl_namespace,
        &opts.header_dir,
        &opts.source_dir,
    )?;
    output::write_artifacts(&artifacts)?;

    if let Some(extras_dir) = &opts.extras_dir {
        output::copy_extras(extras_dir, &opts.header_dir)?;
    }

    info!(
        project = %model.project,
        variant = ?opts.variant,
        artifacts = artifacts.len(),
        headers = %opts.header_dir.display(),
        sources = %opts.source_dir.display(),
        "generation complete"
    );
    Ok(())
}

/// Parse a description document and build the queryable model.
pub fn build_model(json: &str) -> Result<ApiDescription> {
    let api = schema::parse_description(json)?;
    model::ApiDescription::from_file(api)
}

/// Generate all artifacts for one variant, in memory.
///
/// `header_dir`/`source_dir` only shape the artifact paths; nothing is
/// written until [`output::write_artifacts`] runs.
pub fn generate(
    model: &ApiDescription,
    variant: Variant,
    impl_namespace: &str,
    header_dir: &Path,
    source_dir: &Path,
) -> Result<Vec<Artifact>> {
    let types = types::TypeMap::new(model, impl_namespace);

    let artifacts = match variant {
        Variant::Cpp => cppgen::CppGenerator::new(model, &types).generate(header_dir, source_dir)?,
        Variant::C => cgen::CGenerator::new(model, &types).generate(header_dir, source_dir)?,
        Variant::Listener => {
            let mut artifacts =
                cppgen::CppGenerator::new(model, &types).generate(header_dir, source_dir)?;
            artifacts.extend(
                lisgen::ListenerGenerator::new(model, &types).generate(header_dir, source_dir)?,
            );
            artifacts.push(statements::generate(model, header_dir)?);
            artifacts
        }
    };

    info!(
        variant = ?variant,
        artifacts = artifacts.len(),
        "generated artifacts"
    );
    Ok(artifacts)
}
