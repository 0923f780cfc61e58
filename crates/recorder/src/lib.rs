//! WebDriver Recorder
//!
//! Collects screenshots and outcomes for every test a worker runs, and lets
//! the last of several parallel workers merge everything into one report.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 WorkerSession (one per process)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CaptureBuffer  <- screenshots from the browser driver      │
//! │  TestScope      -> drains buffer into one TestResult        │
//! │  Report         <- TestResult per test, execution order     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  WorkerCoordinator (report directory)                       │
//! │    ├── worker.<suffix>        sentinel while running        │
//! │    ├── <suffix>.result.json   report of a non-last worker   │
//! │    └── last worker: aggregate + export                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ReportExporter                                             │
//! │    ├── report.json            (image payloads stripped)     │
//! │    ├── screenshots/<sha256>.png                             │
//! │    ├── static/*                                             │
//! │    └── index.html             (ReportTemplate)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod capture;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod exporter;
pub mod failure;
pub mod session;
pub mod template;

pub use capture::{build_result, CaptureBuffer, TestScope};
pub use config::RecorderConfig;
pub use coordinator::{aggregate_pending, Completion, WorkerCoordinator};
pub use error::{RecorderError, RecorderResult};
pub use exporter::{ExportSummary, ReportExporter};
pub use failure::{CallRecord, InteractionFailure, LogEntry, TestFailure};
pub use session::WorkerSession;
pub use template::ReportTemplate;
