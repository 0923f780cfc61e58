//! One worker's recording session
//!
//! Ties the pieces together for a test-runner integration: register with the
//! coordinator, hand out the capture buffer, bracket each test with a
//! [`TestScope`] and finish through the coordinator.

use tracing::info;
use wdrecorder_common::Report;

use crate::capture::{CaptureBuffer, TestScope};
use crate::config::RecorderConfig;
use crate::coordinator::{Completion, WorkerCoordinator};
use crate::error::RecorderResult;
use crate::exporter::ReportExporter;

pub struct WorkerSession {
    coordinator: WorkerCoordinator,
    exporter: ReportExporter,
    report: Report,
    captures: CaptureBuffer,
}

impl WorkerSession {
    /// Start a session using the configured template.
    ///
    /// A missing template fails here, before the worker registers.
    pub fn start(config: &RecorderConfig) -> RecorderResult<Self> {
        let exporter = config.exporter()?;
        Self::with_exporter(config, exporter)
    }

    pub fn with_exporter(config: &RecorderConfig, exporter: ReportExporter) -> RecorderResult<Self> {
        let coordinator = WorkerCoordinator::register(&config.report_dir)?;

        let mut report = Report::new(config.title.clone());
        if let Some(arguments) = &config.arguments {
            report = report.with_arguments(arguments.clone());
        }

        info!("Recording session started (worker {})", coordinator.suffix());
        Ok(Self {
            coordinator,
            exporter,
            report,
            captures: CaptureBuffer::new(),
        })
    }

    pub fn worker_id(&self) -> &str {
        self.coordinator.suffix()
    }

    /// Handle for screenshot capture sites
    pub fn captures(&self) -> CaptureBuffer {
        self.captures.clone()
    }

    /// Start a test identified by the runner's node id
    pub fn begin_test(&mut self, node_id: impl Into<String>) -> TestScope<'_> {
        TestScope::new(&mut self.report, self.captures.clone(), node_id)
    }

    /// Results recorded so far
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Persist or export, depending on whether other workers are still running
    pub fn finish(self) -> RecorderResult<Completion> {
        let Self {
            coordinator,
            exporter,
            report,
            ..
        } = self;
        coordinator.finish(report, &exporter)
    }
}
