//! Synth command - Write Terraform JSON for each template.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};
use tracing::info;

use pangea_aws::ResourceRegistry;
use pangea_core::{Synthesizer, Template};

use super::{collect_templates, load_config, synthesize_file, Cli};

#[derive(Args)]
pub struct SynthArgs {
    /// Template file or directory of templates
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output directory (overrides the configured one)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print to stdout instead of writing files. A directory prints one
    /// object keyed by template name.
    #[arg(long)]
    pub stdout: bool,
}

pub fn execute(cli: &Cli, args: &SynthArgs) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    let templates = collect_templates(&args.path)?;
    let registry = ResourceRegistry::aws();

    // Everything is synthesized before anything is written.
    let mut rendered: Vec<(PathBuf, Template, Synthesizer)> = Vec::new();
    let mut sources: HashMap<String, PathBuf> = HashMap::new();
    for path in &templates {
        let (template, synth) = synthesize_file(&registry, path, &config)?;
        if let Some(previous) = sources.insert(template.name.clone(), path.clone()) {
            anyhow::bail!(
                "Templates {} and {} are both named '{}' and would write the same output file",
                previous.display(),
                path.display(),
                template.name
            );
        }
        rendered.push((path.clone(), template, synth));
    }

    if args.stdout {
        let document = if args.path.is_file() {
            rendered
                .first()
                .map(|(_, _, synth)| synth.synthesize())
                .unwrap_or(Value::Null)
        } else {
            let by_name: Map<String, Value> = rendered
                .iter()
                .map(|(_, template, synth)| (template.name.clone(), synth.synthesize()))
                .collect();
            Value::Object(by_name)
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    for (path, template, synth) in &rendered {
        let target = config.output_dir.join(template.output_file_name());
        let written = synth.write(&target)?;
        info!("Wrote {} ({} resource(s))", written.display(), synth.resource_count());
        if !cli.quiet {
            println!(
                "✅ {} → {} ({} resource(s))",
                path.display(),
                written.display(),
                synth.resource_count()
            );
        }
    }

    Ok(())
}
