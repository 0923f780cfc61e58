//! Aggregate Command
//!
//! Merges persisted worker results by hand, for report directories whose last
//! worker never finished.

use anyhow::{bail, Result};
use clap::Args;
use tracing::warn;
use wdrecorder::coordinator::remove_consumed;
use wdrecorder::{aggregate_pending, RecorderConfig, WorkerCoordinator};

use super::SummaryDisplay;
use crate::output::{print_error, print_item, print_success, print_warning, OutputFormat};

#[derive(Args)]
pub struct AggregateArgs {
    /// Aggregate even if worker sentinels are present
    #[arg(long)]
    pub force: bool,

    /// Keep the consumed worker result files
    #[arg(long)]
    pub keep: bool,
}

pub fn execute(args: AggregateArgs, config: &RecorderConfig, format: OutputFormat) -> Result<()> {
    let dir = config.ensure_report_dir()?;

    let active = WorkerCoordinator::active_workers(dir)?;
    if !active.is_empty() {
        if !args.force {
            print_error(&format!(
                "{} worker sentinel(s) present in {}; rerun with --force if they are stale",
                active.len(),
                dir.display()
            ));
            bail!("workers still active");
        }
        warn!("Aggregating with {} sentinel(s) present", active.len());
    }

    let (report, consumed) = aggregate_pending(dir, config.title.clone(), config.arguments.clone(), None)?;
    if consumed.is_empty() {
        print_warning(&format!("No worker results pending in {}", dir.display()));
        return Ok(());
    }

    let summary = config.exporter()?.export_all(&report, dir)?;
    if !args.keep {
        remove_consumed(&consumed)?;
    }

    print_item(&SummaryDisplay(&summary), format);
    print_success(&format!(
        "Aggregated {} worker result file(s) into {}",
        consumed.len(),
        summary.html_path.display()
    ));
    Ok(())
}
