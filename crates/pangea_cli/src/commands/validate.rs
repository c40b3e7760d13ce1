//! Validate command - Check templates without writing anything.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use pangea_aws::ResourceRegistry;

use super::{collect_templates, load_config, synthesize_file, Cli};

#[derive(Args)]
pub struct ValidateArgs {
    /// Template file or directory of templates
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub fn execute(cli: &Cli, args: &ValidateArgs) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let templates = collect_templates(&args.path)?;
    let registry = ResourceRegistry::aws();

    info!("Validating {} template(s)", templates.len());
    let mut failed = 0;

    for path in &templates {
        match synthesize_file(&registry, path, &config) {
            Ok((_, synth)) => {
                if !cli.quiet {
                    println!(
                        "   ✅ {} ({} resource(s))",
                        path.display(),
                        synth.resource_count()
                    );
                }
            }
            Err(e) => {
                failed += 1;
                println!("   ❌ {}:", path.display());
                for line in format!("{:#}", e).lines() {
                    println!("      {}", line);
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} template(s) failed validation", failed, templates.len());
    }

    if !cli.quiet {
        println!("\n✅ All templates valid");
    }
    Ok(())
}
