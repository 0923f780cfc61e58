//! CLI Commands

pub mod aggregate;
pub mod config;
pub mod export;
pub mod status;

use serde::Serialize;
use wdrecorder::ExportSummary;

use crate::output::{outcome_label, TableDisplay};

/// Export summary display wrapper for serialization
#[derive(Serialize)]
pub struct SummaryDisplay<'a>(pub &'a ExportSummary);

impl TableDisplay for SummaryDisplay<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Outcome", "Results", "Failures", "Images", "Assets", "Page"]
    }

    fn row(&self) -> Vec<String> {
        let summary = self.0;
        vec![
            outcome_label(summary.outcome),
            summary.num_results.to_string(),
            summary.num_failures.to_string(),
            summary.images_written.to_string(),
            summary.assets_copied.to_string(),
            summary.html_path.display().to_string(),
        ]
    }
}
