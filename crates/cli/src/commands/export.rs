//! Export Command
//!
//! Regenerates the report bundle from a saved `report.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;
use wdrecorder::{RecorderConfig, ReportExporter};
use wdrecorder_common::Report;

use super::SummaryDisplay;
use crate::output::{print_item, print_success, OutputFormat};

#[derive(Args)]
pub struct ExportArgs {
    /// Report snapshot to render
    #[arg(short, long)]
    pub input_json: PathBuf,

    /// Where to write the bundle (defaults to the snapshot's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub fn execute(args: ExportArgs, config: &RecorderConfig, format: OutputFormat) -> Result<()> {
    let report = Report::load(&args.input_json)
        .with_context(|| format!("Failed to load report from {}", args.input_json.display()))?;

    let output_dir = args.output_dir.unwrap_or_else(|| {
        args.input_json
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    });

    let exporter: ReportExporter = config.exporter()?;
    info!(
        "Exporting {} result(s) with template {}",
        report.len(),
        exporter.template().name()
    );

    let summary = exporter
        .export_all(&report, &output_dir)
        .with_context(|| format!("Failed to export report to {}", output_dir.display()))?;

    print_item(&SummaryDisplay(&summary), format);
    print_success(&format!("Report written to {}", summary.html_path.display()));
    Ok(())
}
