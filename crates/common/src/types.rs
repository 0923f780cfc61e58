//! Core report types
//!
//! A [`Report`] is an ordered list of [`TestResult`]s plus run metadata. Both
//! carry a [`Timed`] section that is flattened into their JSON form, so a
//! serialized result looks like:
//!
//! ```json
//! {
//!     "start_time": "...",
//!     "end_time": "...",
//!     "duration": "1m 15s",
//!     "test_name": "test_login.py::test_totp[chrome]",
//!     "test_id": "test_login-py-test_totp-chrome",
//!     "pngs": [],
//!     "console_errors": [],
//!     "traceback": null,
//!     "test_description": null,
//!     "outcome": "success"
//! }
//! ```

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Image, Result, Timed};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// Outcome of a single test, or of a whole report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failure")]
    Failure,
    /// No call outcome was recorded, typically because setup failed
    #[default]
    #[serde(rename = "never started")]
    NeverStarted,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::NeverStarted => "never started",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Id used when a name has no word characters at all
const FALLBACK_TEST_ID: &str = "test";

/// Derive a stable anchor id from a raw test name.
///
/// Every run of non-word characters becomes a single `-`, with no leading or
/// trailing `-`: `test_foo.py::test_bar[a-b]` becomes `test_foo-py-test_bar-a-b`.
/// A name with no word characters maps to `test`.
pub fn derive_test_id(test_name: &str) -> String {
    let id = NON_WORD.replace_all(test_name, "-");
    match id.trim_matches('-') {
        "" => FALLBACK_TEST_ID.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// First non-blank line of a doc string
fn first_line(doc: &str) -> Option<String> {
    doc.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// The recorded outcome of one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TestResultRecord")]
pub struct TestResult {
    #[serde(flatten)]
    timer: Timed,
    test_name: String,
    test_id: String,
    pngs: Vec<Image>,
    console_errors: Vec<String>,
    traceback: Option<String>,
    test_description: Option<String>,
    outcome: Outcome,
}

impl TestResult {
    pub fn new(test_name: impl Into<String>, outcome: Outcome) -> Self {
        let test_name = test_name.into();
        Self {
            timer: Timed::new(),
            test_id: derive_test_id(&test_name),
            test_name,
            pngs: Vec::new(),
            console_errors: Vec::new(),
            traceback: None,
            test_description: None,
            outcome,
        }
    }

    pub fn with_timer(mut self, timer: Timed) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_images(mut self, pngs: Vec<Image>) -> Self {
        self.pngs = pngs;
        self
    }

    pub fn with_console_errors(mut self, console_errors: Vec<String>) -> Self {
        self.console_errors = console_errors;
        self
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }

    /// Keep the first line of a doc string as the description
    pub fn with_description(mut self, doc: &str) -> Self {
        self.test_description = first_line(doc);
        self
    }

    pub fn timer(&self) -> &Timed {
        &self.timer
    }

    pub fn duration(&self) -> String {
        self.timer.duration()
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn pngs(&self) -> &[Image] {
        &self.pngs
    }

    pub fn console_errors(&self) -> &[String] {
        &self.console_errors
    }

    pub fn traceback(&self) -> Option<&str> {
        self.traceback.as_deref()
    }

    pub fn test_description(&self) -> Option<&str> {
        self.test_description.as_deref()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

/// Wire form of a [`TestResult`]; `test_id` is always re-derived on load
#[derive(Deserialize)]
struct TestResultRecord {
    #[serde(flatten)]
    timer: Timed,
    test_name: String,
    #[serde(default)]
    pngs: Vec<Image>,
    #[serde(default)]
    console_errors: Vec<String>,
    #[serde(default)]
    traceback: Option<String>,
    #[serde(default)]
    test_description: Option<String>,
    #[serde(default)]
    outcome: Outcome,
}

impl From<TestResultRecord> for TestResult {
    fn from(record: TestResultRecord) -> Self {
        Self {
            timer: record.timer,
            test_id: derive_test_id(&record.test_name),
            test_name: record.test_name,
            pngs: record.pngs,
            console_errors: record.console_errors,
            traceback: record.traceback,
            test_description: record.test_description,
            outcome: record.outcome,
        }
    }
}

/// A collection of test results with an overall outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReportRecord")]
pub struct Report {
    #[serde(flatten)]
    timer: Timed,
    title: String,
    arguments: Option<String>,
    outcome: Outcome,
    results: Vec<TestResult>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            timer: Timed::new(),
            title: title.into(),
            arguments: None,
            outcome: Outcome::Success,
            results: Vec::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    pub fn with_timer(mut self, timer: Timed) -> Self {
        self.timer = timer;
        self
    }

    /// Build an aggregate from several reports.
    ///
    /// Results are concatenated in the order the reports are given, each
    /// report's internal order preserved. The aggregate timer starts at the
    /// earliest start among the parts and is left running.
    pub fn aggregate(
        title: impl Into<String>,
        arguments: Option<String>,
        parts: impl IntoIterator<Item = Report>,
    ) -> Self {
        let mut aggregate = Self::new(title);
        aggregate.arguments = arguments;

        let mut earliest: Option<DateTime<Utc>> = None;
        for part in parts {
            let start = part.timer.start_time();
            earliest = Some(earliest.map_or(start, |e| e.min(start)));
            aggregate.results.extend(part.results);
        }
        if let Some(start) = earliest {
            aggregate.timer = Timed::started_at(start);
        }

        aggregate.refresh_outcome();
        aggregate
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    pub fn timer(&self) -> &Timed {
        &self.timer
    }

    pub fn duration(&self) -> String {
        self.timer.duration()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results whose outcome is anything but success
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results
            .iter()
            .filter(|result| !result.outcome().is_success())
            .collect()
    }

    pub fn num_failures(&self) -> usize {
        self.results
            .iter()
            .filter(|result| !result.outcome().is_success())
            .count()
    }

    /// Append a result in execution order
    pub fn push(&mut self, result: TestResult) {
        if !result.outcome().is_success() {
            self.outcome = Outcome::Failure;
        }
        self.results.push(result);
    }

    /// Stop the timer and recompute the outcome
    pub fn finalize(&mut self) {
        self.timer.stop();
        self.refresh_outcome();
    }

    fn refresh_outcome(&mut self) {
        self.outcome = if self.num_failures() > 0 {
            Outcome::Failure
        } else {
            Outcome::Success
        };
    }

    /// Total number of captured images across all results
    pub fn num_images(&self) -> usize {
        self.results.iter().map(|r| r.pngs().len()).sum()
    }

    /// A copy with every image payload removed
    pub fn without_image_data(&self) -> Self {
        let mut report = self.clone();
        for result in &mut report.results {
            for image in &mut result.pngs {
                image.strip_payload();
            }
        }
        report
    }

    /// Serialize with the 4-space indentation used for report snapshots
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits valid UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a report snapshot from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                kind: "report".to_string(),
                id: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        let report = Self::from_json(&json)?;
        debug!("Loaded report {:?} ({} results)", path, report.len());
        Ok(report)
    }

    /// Write a report snapshot, atomically replacing any previous file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write atomically via temp file
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = std::path::PathBuf::from(tmp_name);
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;

        debug!("Saved report {:?} ({} results)", path, self.len());
        Ok(())
    }
}

/// Wire form of a [`Report`]; the outcome is recomputed on load
#[derive(Deserialize)]
struct ReportRecord {
    #[serde(flatten)]
    timer: Timed,
    title: String,
    #[serde(default)]
    arguments: Option<String>,
    #[serde(default)]
    results: Vec<TestResult>,
}

impl From<ReportRecord> for Report {
    fn from(record: ReportRecord) -> Self {
        let mut report = Self {
            timer: record.timer,
            title: record.title,
            arguments: record.arguments,
            outcome: Outcome::Success,
            results: record.results,
        };
        report.refresh_outcome();
        report
    }
}
