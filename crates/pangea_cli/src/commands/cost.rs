//! Cost command - Estimate the monthly cost of declared resources.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use pangea_aws::ResourceRegistry;

use super::{collect_templates, load_config, synthesize_file, Cli};

#[derive(Args)]
pub struct CostArgs {
    /// Template file or directory of templates
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub fn execute(cli: &Cli, args: &CostArgs) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let templates = collect_templates(&args.path)?;
    let registry = ResourceRegistry::aws();

    let mut total = 0.0;
    for path in &templates {
        let (template, synth) = synthesize_file(&registry, path, &config)?;

        println!("💰 {}", template.name);
        for resource in synth.declared() {
            match resource.estimated_monthly_cost {
                Some(cost) => println!("   {:<48} ${:>9.2}", resource.address(), cost),
                None if !cli.quiet => println!("   {:<48} {:>10}", resource.address(), "-"),
                None => {}
            }
        }

        let subtotal = synth.estimated_monthly_cost();
        println!("   {:<48} ${:>9.2}", "subtotal", subtotal);
        total += subtotal;
    }

    println!("\nEstimated monthly total: ${:.2}", total);
    Ok(())
}
