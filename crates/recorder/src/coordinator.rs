//! Cross-process worker coordination through the report directory
//!
//! Every worker registers a `worker.<suffix>` sentinel when its session
//! starts. At session end it removes its own sentinel and looks for others:
//!
//! ```text
//!   other sentinels remain  -> save own report as <suffix>.result.json
//!   none remain             -> load every *.result.json (sorted by name),
//!                              append own results, export, delete the
//!                              consumed result files
//! ```
//!
//! A worker that sees other sentinels before releasing its own saves its
//! result file first. Any worker that later finds the directory empty is
//! then guaranteed to see that file. If the rescan after release finds
//! nobody, the worker aggregates its own file along with the rest. A lone
//! worker never writes a result file.
//!
//! Two workers finishing at the same instant may both see an empty
//! directory and both export; that race is accepted.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use wdrecorder_common::{Report, RESULT_SUFFIX, SCREENSHOTS_DIR, SENTINEL_PREFIX};

use crate::error::{RecorderError, RecorderResult};
use crate::exporter::{ExportSummary, ReportExporter};

/// How a worker's session ended
#[derive(Debug, Clone)]
pub enum Completion {
    /// Other workers were still running; the report waits on disk
    Persisted { path: PathBuf },

    /// This worker was last and exported the aggregate
    Exported {
        summary: ExportSummary,
        /// Worker result files merged into the aggregate and deleted
        merged: Vec<PathBuf>,
    },
}

impl Completion {
    pub fn is_exported(&self) -> bool {
        matches!(self, Completion::Exported { .. })
    }
}

/// A registered worker in a shared report directory
#[derive(Debug)]
pub struct WorkerCoordinator {
    report_dir: PathBuf,
    sentinel: Option<PathBuf>,
    suffix: String,
}

impl WorkerCoordinator {
    /// Announce a new worker.
    ///
    /// The first worker of a session (no other sentinel present) also clears
    /// screenshots left behind by a previous run.
    pub fn register(report_dir: impl Into<PathBuf>) -> RecorderResult<Self> {
        let report_dir = report_dir.into();
        std::fs::create_dir_all(&report_dir)?;

        if Self::active_workers(&report_dir)?.is_empty() {
            let screenshots = report_dir.join(SCREENSHOTS_DIR);
            if screenshots.is_dir() {
                info!("Removing stale screenshots from {:?}", screenshots);
                std::fs::remove_dir_all(&screenshots)?;
            }
        }

        let (_, sentinel) = tempfile::Builder::new()
            .prefix(SENTINEL_PREFIX)
            .rand_bytes(10)
            .tempfile_in(&report_dir)?
            .keep()
            .map_err(|e| e.error)?;

        let suffix = sentinel
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(SENTINEL_PREFIX))
            .map(str::to_string)
            .ok_or_else(|| RecorderError::InvalidConfig(format!("unusable sentinel name {:?}", sentinel)))?;

        info!("Registered worker {} in {:?}", suffix, report_dir);

        Ok(Self {
            report_dir,
            sentinel: Some(sentinel),
            suffix,
        })
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Unique part of this worker's sentinel name
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// `None` once released
    pub fn sentinel_path(&self) -> Option<&Path> {
        self.sentinel.as_deref()
    }

    /// Where this worker's report goes if it is not last
    pub fn result_path(&self) -> PathBuf {
        self.report_dir.join(format!("{}{}", self.suffix, RESULT_SUFFIX))
    }

    /// Sentinel files currently present, sorted by name
    pub fn active_workers(report_dir: &Path) -> RecorderResult<Vec<PathBuf>> {
        list_files(report_dir, |name| name.starts_with(SENTINEL_PREFIX))
    }

    /// Persisted worker results waiting for aggregation, sorted by name
    pub fn pending_results(report_dir: &Path) -> RecorderResult<Vec<PathBuf>> {
        list_files(report_dir, |name| name.ends_with(RESULT_SUFFIX))
    }

    /// Remove this worker's sentinel. Failures are logged and ignored.
    pub fn release(&mut self) {
        if let Some(sentinel) = self.sentinel.take() {
            match std::fs::remove_file(&sentinel) {
                Ok(()) => debug!("Removed sentinel {:?}", sentinel),
                Err(e) => warn!("Failed to remove sentinel {:?}: {}", sentinel, e),
            }
        }
    }

    /// End this worker's session with its finished report
    pub fn finish(mut self, mut report: Report, exporter: &ReportExporter) -> RecorderResult<Completion> {
        report.finalize();
        let persisted = self.persist_if_shared(&report)?;
        self.release();
        self.complete(report, persisted, exporter)
    }

    /// Save the report while this worker's sentinel is still present, if
    /// any other worker is registered
    fn persist_if_shared(&self, report: &Report) -> RecorderResult<Option<PathBuf>> {
        let others = Self::active_workers(&self.report_dir)?
            .into_iter()
            .filter(|path| Some(path.as_path()) != self.sentinel_path())
            .count();
        if others == 0 {
            return Ok(None);
        }

        let path = self.result_path();
        report.save(&path)?;
        debug!("Saved {} result(s) to {:?} before release", report.len(), path);
        Ok(Some(path))
    }

    /// Decide, after release, whether to leave the report on disk or export
    fn complete(
        &self,
        report: Report,
        persisted: Option<PathBuf>,
        exporter: &ReportExporter,
    ) -> RecorderResult<Completion> {
        let others = Self::active_workers(&self.report_dir)?;
        if !others.is_empty() {
            let path = match persisted {
                Some(path) => path,
                None => {
                    let path = self.result_path();
                    report.save(&path)?;
                    path
                }
            };
            info!(
                "{} worker(s) still running; saved {} result(s) to {:?}",
                others.len(),
                report.len(),
                path
            );
            return Ok(Completion::Persisted { path });
        }

        info!("Last worker finished; aggregating results in {:?}", self.report_dir);
        let title = report.title().to_string();
        let arguments = report.arguments().map(str::to_string);
        // A persisted report is picked up from disk with the other results
        let own = if persisted.is_some() { None } else { Some(report) };
        let (aggregate, merged) = aggregate_pending(&self.report_dir, title, arguments, own)?;

        let summary = exporter.export_all(&aggregate, &self.report_dir)?;
        remove_consumed(&merged)?;

        info!(
            "Exported {} result(s), {} failure(s) to {:?}",
            summary.num_results, summary.num_failures, summary.html_path
        );
        Ok(Completion::Exported { summary, merged })
    }
}

impl Drop for WorkerCoordinator {
    fn drop(&mut self) {
        self.release();
    }
}

/// Merge every pending worker result in `report_dir`, followed by `own`.
///
/// Returns the finalized aggregate and the result files it consumed. The
/// files are left in place; delete them only once the aggregate is safely
/// exported.
pub fn aggregate_pending(
    report_dir: &Path,
    title: impl Into<String>,
    arguments: Option<String>,
    own: Option<Report>,
) -> RecorderResult<(Report, Vec<PathBuf>)> {
    let mut parts = Vec::new();
    let mut consumed = Vec::new();

    for path in WorkerCoordinator::pending_results(report_dir)? {
        match Report::load(&path) {
            Ok(part) => {
                debug!("Loaded {} result(s) from {:?}", part.len(), path);
                parts.push(part);
                consumed.push(path);
            }
            Err(wdrecorder_common::Error::NotFound { .. }) => {
                warn!("Worker result {:?} disappeared before it could be read", path);
            }
            Err(e) => {
                return Err(RecorderError::CorruptWorkerResult {
                    path,
                    reason: e.to_string(),
                })
            }
        }
    }

    parts.extend(own);
    let mut aggregate = Report::aggregate(title, arguments, parts);
    aggregate.finalize();
    Ok((aggregate, consumed))
}

/// Delete worker result files that made it into an exported aggregate
pub fn remove_consumed(paths: &[PathBuf]) -> RecorderResult<()> {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed consumed result {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> RecorderResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(&keep) {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}
