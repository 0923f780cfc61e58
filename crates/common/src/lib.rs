//! WDRecorder Common Library
//!
//! Report data model shared by the recorder and the CLI: timing, screenshots,
//! per-test results and the report aggregate, plus the on-disk layout of a
//! report directory.

pub mod error;
pub mod image;
pub mod timed;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use image::Image;
pub use timed::{format_duration, Timed};
pub use types::{derive_test_id, Outcome, Report, TestResult};

/// WDRecorder version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of the zero-byte marker each active worker leaves in the report directory
pub const SENTINEL_PREFIX: &str = "worker.";

/// Suffix of a non-final worker's persisted report
pub const RESULT_SUFFIX: &str = ".result.json";

/// Subdirectory holding materialized screenshots
pub const SCREENSHOTS_DIR: &str = "screenshots";

/// Subdirectory holding copied static assets
pub const STATIC_DIR: &str = "static";

/// Final aggregate report snapshot
pub const REPORT_JSON: &str = "report.json";

/// Final rendered page
pub const INDEX_HTML: &str = "index.html";

/// Default report title
pub const DEFAULT_TITLE: &str = "Webdriver Recorder Summary";

/// Default report directory, relative to the working directory
pub fn default_report_dir() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("webdriver-report")
}
