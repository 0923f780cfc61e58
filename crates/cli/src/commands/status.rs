//! Status Command
//!
//! Lists worker sentinels and persisted worker results in a report directory.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use wdrecorder::{RecorderConfig, WorkerCoordinator};
use wdrecorder_common::{Report, REPORT_JSON};

use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

/// Report directory entry for display
#[derive(Serialize)]
pub struct WorkerFileDisplay {
    pub kind: &'static str,
    pub name: String,
    pub modified: String,
    pub results: Option<usize>,
    pub note: String,
}

impl WorkerFileDisplay {
    fn new(kind: &'static str, path: &Path) -> Self {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        Self {
            kind,
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            modified,
            results: None,
            note: String::new(),
        }
    }
}

impl TableDisplay for WorkerFileDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Kind", "File", "Modified", "Results", "Note"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.kind.to_string(),
            self.name.clone(),
            self.modified.clone(),
            self.results.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            self.note.clone(),
        ]
    }
}

pub fn execute(config: &RecorderConfig, format: OutputFormat) -> Result<()> {
    let dir = config.ensure_report_dir()?;
    let mut entries = Vec::new();

    for sentinel in WorkerCoordinator::active_workers(dir)? {
        entries.push(WorkerFileDisplay::new("worker", &sentinel));
    }

    for path in WorkerCoordinator::pending_results(dir)? {
        let mut entry = WorkerFileDisplay::new("result", &path);
        match Report::load(&path) {
            Ok(report) => {
                entry.results = Some(report.len());
                entry.note = format!("{} failure(s)", report.num_failures());
            }
            Err(e) => entry.note = format!("unreadable: {}", e),
        }
        entries.push(entry);
    }

    print_list(&entries, format);

    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        let report_json = dir.join(REPORT_JSON);
        if report_json.exists() {
            print_info(&format!("Last exported report: {}", report_json.display()));
        } else {
            print_info(&format!("No exported report in {}", dir.display()));
        }
    }
    Ok(())
}
