//! CLI command definitions.
//!
//! Each subcommand works on one template file or on every template found
//! under a directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use walkdir::WalkDir;

use pangea_aws::ResourceRegistry;
use pangea_core::template::is_template_file;
use pangea_core::{PangeaConfig, Synthesizer, Template};

pub mod cost;
pub mod resources;
pub mod synth;
pub mod validate;

/// Pangea - typed Terraform resources for AWS
#[derive(Parser)]
#[command(name = "pangea")]
#[command(version, about = "Pangea - typed Terraform resources for AWS")]
#[command(long_about = r#"
Pangea turns declaration files into Terraform JSON. Every resource is checked
against its typed attribute rules before anything is written.

COMMANDS:
  synth      → Synthesize templates into .tf.json files
  validate   → Check templates without writing output
  resources  → List supported resource types and their outputs
  cost       → Estimate monthly cost of the declared resources

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Validation failure
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to a pangea.toml (defaults to the one in the current directory)
    #[arg(short, long, global = true, env = "PANGEA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize templates into Terraform JSON
    Synth(synth::SynthArgs),

    /// Validate templates without writing output
    Validate(validate::ValidateArgs),

    /// List supported resource types
    Resources(resources::ResourcesArgs),

    /// Estimate monthly cost of declared resources
    Cost(cost::CostArgs),
}

/// Load configuration from an explicit file or from the working directory,
/// then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<PangeaConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            PangeaConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => PangeaConfig::discover(&std::env::current_dir()?)?,
    };
    Ok(config.with_env()?)
}

/// Template files at `path`: the file itself, or every template below a
/// directory in sorted order.
pub fn collect_templates(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Template path not found: {}", path.display());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut templates: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| is_template_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    templates.sort();

    debug!("Found {} template(s) under {}", templates.len(), path.display());
    if templates.is_empty() {
        anyhow::bail!("No templates found under {}", path.display());
    }
    Ok(templates)
}

/// Parse one template and synthesize it against the registry.
pub fn synthesize_file(
    registry: &ResourceRegistry,
    path: &Path,
    config: &PangeaConfig,
) -> Result<(Template, Synthesizer)> {
    let template = Template::from_file(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;
    let synth = registry
        .synthesize_template(&template, config)
        .with_context(|| format!("Failed to synthesize {}", path.display()))?;
    Ok((template, synth))
}
