//! `versioner publish`: phase 2.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use versioner_sync::publish_phase;

use crate::RunEnv;

/// Arguments for `versioner publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Emit the created version as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PublishedJson<'a> {
    dataset: &'a str,
    version_id: &'a str,
    name: &'a str,
    uri: &'a str,
}

impl PublishArgs {
    pub fn run(self, env: &RunEnv) -> Result<()> {
        let client = env.client()?;
        let (manifest, version_id) = publish_phase(&client, &env.inputs_dir).with_context(|| {
            format!(
                "failed to publish from manifest in '{}'",
                env.inputs_dir.display()
            )
        })?;

        if self.json {
            let payload = PublishedJson {
                dataset: manifest.dataset_id.as_str(),
                version_id: version_id.as_str(),
                name: &manifest.new_version_name,
                uri: &manifest.new_version_uri,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize result")?
            );
            return Ok(());
        }

        println!(
            "Created dataset version {} ({})",
            version_id.to_string().green().bold(),
            manifest.new_version_uri
        );
        Ok(())
    }
}
