//! Command-line inspection of resolved configuration.
//!
//! # Responsibility
//! - Print the core version when run without arguments.
//! - Resolve one group from a config directory and print it as JSON.

use bedrock_core::{core_version, init_logging_from, layered_resolver};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Print a merged configuration group as JSON.
#[derive(Parser, Debug)]
#[command(name = "bedrock_cli", version)]
struct Cli {
    /// Environment overlay directory under `config_dir`.
    #[arg(long, env = "BEDROCK_ENV")]
    env: Option<String>,

    /// Directory holding `<group>.toml` / `<group>.json` files.
    #[arg(requires = "group")]
    config_dir: Option<PathBuf>,

    /// Configuration group to resolve.
    #[arg(requires = "config_dir")]
    group: Option<String>,
}

fn run(env: Option<&str>, config_dir: &Path, group: &str) -> Result<String, String> {
    let resolver = layered_resolver(config_dir, env);
    // Logging stays off without a `log.dir`; a bad `log` group still fails loudly.
    init_logging_from(&resolver).map_err(|err| err.to_string())?;

    let merged = resolver.load(group).map_err(|err| err.to_string())?;
    serde_json::to_string_pretty(&Value::Object(merged.as_ref().clone()))
        .map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (Some(config_dir), Some(group)) = (cli.config_dir.as_deref(), cli.group.as_deref()) else {
        println!("bedrock_core version={}", core_version());
        return ExitCode::SUCCESS;
    };

    match run(cli.env.as_deref(), config_dir, group) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
