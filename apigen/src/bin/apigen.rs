//! CLI entry point for apigen.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use apigen::{GenOptions, Variant};

/// apigen — generate C/C++ client APIs from a JSON API description.
#[derive(Parser, Debug)]
#[command(name = "apigen", version, about)]
struct Cli {
    /// Path to the API description file.
    description: PathBuf,

    /// Destination directory for the generated header files.
    #[arg(long, default_value = "client")]
    headerdir: PathBuf,

    /// Destination directory for the generated source files.
    #[arg(long, default_value = "client")]
    sourcedir: PathBuf,

    /// Which client surface to emit.
    #[arg(long, value_enum, default_value = "cpp")]
    variant: Variant,

    /// Namespace prefix for implementation-side type spellings.
    #[arg(long, default_value = "TR")]
    impl_namespace: String,

    /// Directory of verbatim extras headers to stage into the header
    /// directory after generation.
    #[arg(long)]
    extrasdir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("apigen=info")),
        )
        .init();

    let cli = Cli::parse();
    apigen::run(&GenOptions {
        description: cli.description,
        header_dir: cli.headerdir,
        source_dir: cli.sourcedir,
        variant: cli.variant,
        impl_namespace: cli.impl_namespace,
        extras_dir: cli.extrasdir,
    })?;
    Ok(())
}
