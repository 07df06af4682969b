//! `versioner reconcile`: phase 1.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use versioner_core::{ExecutionId, Parameters};
use versioner_sync::{
    generate_content, reconcile_phase, Composition, Decision, ManifestHandoff,
    Phase1Report, ReconcileRequest, SidecarComposer, UploadCause, VersionComposer,
};

use crate::RunEnv;

/// How the reconciliation decision reaches the storage service.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Write a manifest for a later `versioner publish`.
    Manifest,
    /// Write sidecar instructions next to each output.
    Sidecar,
}

/// Arguments for `versioner reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Reconcile this directory instead of generating content from parameters.
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Strategy::Manifest)]
    pub strategy: Strategy,

    /// Print the plan without moving files or writing any artifact.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the manifest as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

impl ReconcileArgs {
    pub fn run(self, env: &RunEnv) -> Result<()> {
        let params = Parameters::load_at(&env.config_dir).context("failed to load parameters")?;
        let dataset_id = params
            .dataset_id()
            .context("cannot reconcile without a dataset")?;
        let client = env.client()?;

        let execution_id = env.execution_id.as_deref().map(ExecutionId::from);
        if execution_id.is_none() && self.strategy == Strategy::Manifest && !self.dry_run {
            tracing::warn!("no execution id; the manifest cannot be published");
        }

        let generated;
        let content_dir: &Path = match &self.content_dir {
            Some(dir) => dir,
            None => {
                generated = generate_content(&params).context("failed to generate content")?;
                generated.path()
            }
        };

        let now = Utc::now();
        let composer: Box<dyn VersionComposer> = match self.strategy {
            Strategy::Manifest => Box::new(ManifestHandoff::new(&env.outputs_dir)),
            Strategy::Sidecar => Box::new(SidecarComposer::new(&env.outputs_dir, now)),
        };
        let request = ReconcileRequest {
            dataset_id,
            content_dir,
            outputs_dir: &env.outputs_dir,
            execution_id,
            now,
            dry_run: self.dry_run,
        };
        let report = reconcile_phase(&client, &request, composer.as_ref())
            .with_context(|| format!("reconciliation of '{}' failed", content_dir.display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report.manifest)
                    .context("failed to serialize manifest")?
            );
        } else {
            print_plan(&report, &env.outputs_dir, self.dry_run);
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "file")]
    name: String,
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_plan(report: &Phase1Report, outputs_dir: &Path, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let from = report
        .target
        .old_version_uri
        .as_deref()
        .unwrap_or("(no previous version)");
    println!(
        "{prefix}{} {} → {}",
        "Plan".bold(),
        from,
        report.target.new_version_uri.bold()
    );

    let rows: Vec<PlanRow> = report
        .result
        .decisions()
        .iter()
        .map(|(name, decision)| {
            let (action, detail) = describe(decision);
            PlanRow {
                name: name.clone(),
                action,
                detail,
            }
        })
        .collect();
    if rows.is_empty() {
        println!("No files locally or in the previous version.");
    } else {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    match &report.composition {
        None => println!("{prefix}Nothing moved or written."),
        Some(Composition::Published { version_id }) => {
            println!("Created dataset version {}", version_id.to_string().green());
        }
        Some(Composition::Deferred { artifacts }) => {
            println!(
                "Moved {} file(s) to {}",
                report.moved.len(),
                outputs_dir.display()
            );
            for artifact in artifacts {
                println!("  wrote {}", artifact.display());
            }
        }
    }
}

fn describe(decision: &Decision) -> (String, String) {
    match decision {
        Decision::Keep { datum } => ("keep".green().to_string(), format!("datum {datum}")),
        Decision::Drop => ("drop".red().to_string(), "not present locally".to_string()),
        Decision::Upload { cause, .. } => {
            let detail = match cause {
                UploadCause::New => "new file".to_string(),
                UploadCause::Changed(reason) => reason.to_string(),
                UploadCause::Unverifiable => "no remote hash to verify".to_string(),
            };
            let action = match cause {
                UploadCause::Unverifiable => "upload".yellow(),
                _ => "upload".cyan(),
            };
            (action.to_string(), detail)
        }
    }
}
