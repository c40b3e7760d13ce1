//! Resources command - List the supported resource types.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use pangea_aws::ResourceRegistry;

use super::Cli;

#[derive(Args)]
pub struct ResourcesArgs {
    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ResourceListing<'a> {
    resource_type: &'a str,
    outputs: &'a [&'a str],
}

pub fn execute(_cli: &Cli, args: &ResourcesArgs) -> Result<()> {
    let registry = ResourceRegistry::aws();
    let listing: Vec<ResourceListing> = registry
        .types()
        .into_iter()
        .map(|t| ResourceListing {
            resource_type: t.name,
            outputs: t.outputs,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("📦 Supported resource types ({}):", listing.len());
    for entry in &listing {
        println!("   {:<32} {}", entry.resource_type, entry.outputs.join(", "));
    }
    Ok(())
}
