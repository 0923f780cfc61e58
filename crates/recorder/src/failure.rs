//! Classification of test failures
//!
//! The test runner hands teardown a [`CallRecord`] describing the test body's
//! outcome. A failure is either an [`InteractionFailure`] raised by the
//! browser driver (which carries the page URL and the browser's console log)
//! or any other error, kept only as rendered text. A test with no call record
//! at all never started.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry from the browser's console log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// A browser interaction that did not complete
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} (url: {url})")]
pub struct InteractionFailure {
    /// What the driver was trying to do
    pub message: String,

    /// Page URL when the interaction failed
    pub url: String,

    /// Browser console log collected at failure time
    #[serde(default)]
    pub logs: Vec<LogEntry>,

    /// Rendered text of the underlying driver error
    #[serde(default)]
    pub cause: Option<String>,
}

impl InteractionFailure {
    pub fn new(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            url: url.into(),
            logs: Vec::new(),
            cause: None,
        }
    }

    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Non-empty console log messages, in order
    pub fn log_lines(&self) -> Vec<String> {
        self.logs
            .iter()
            .filter(|entry| !entry.message.is_empty())
            .map(|entry| entry.message.clone())
            .collect()
    }
}

/// Why a test body failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestFailure {
    Interaction(InteractionFailure),
    Generic { text: String },
}

impl TestFailure {
    pub fn generic(text: impl Into<String>) -> Self {
        TestFailure::Generic { text: text.into() }
    }

    /// Text recorded as the result's traceback
    pub fn traceback(&self) -> String {
        match self {
            TestFailure::Interaction(failure) => {
                let mut text = format!("InteractionFailure: {}\nurl: {}", failure.message, failure.url);
                if let Some(cause) = &failure.cause {
                    text.push_str("\ncaused by: ");
                    text.push_str(cause);
                }
                text
            }
            TestFailure::Generic { text } => text.clone(),
        }
    }

    /// Diagnostic lines recorded as the result's console errors
    pub fn console_errors(&self) -> Vec<String> {
        match self {
            TestFailure::Interaction(failure) => failure.log_lines(),
            TestFailure::Generic { .. } => Vec::new(),
        }
    }
}

impl From<InteractionFailure> for TestFailure {
    fn from(failure: InteractionFailure) -> Self {
        TestFailure::Interaction(failure)
    }
}

/// What the runner recorded for a test's call phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRecord {
    /// Doc string of the test function
    pub doc: Option<String>,

    /// `None` when the call passed
    pub failure: Option<TestFailure>,
}

impl CallRecord {
    pub fn passed() -> Self {
        Self::default()
    }

    pub fn failed(failure: impl Into<TestFailure>) -> Self {
        Self {
            doc: None,
            failure: Some(failure.into()),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_traceback_carries_message_and_url() {
        let failure = TestFailure::from(
            InteractionFailure::new("oh no!", "file:///tmp/index.html").with_cause("TimeoutException"),
        );
        let traceback = failure.traceback();

        assert!(traceback.contains("oh no!"));
        assert!(traceback.contains("file:///tmp/index.html"));
        assert!(traceback.contains("TimeoutException"));
    }

    #[test]
    fn test_interaction_console_errors_skip_empty_messages() {
        let failure = TestFailure::from(InteractionFailure::new("click", "about:blank").with_logs(vec![
            LogEntry::new("Uncaught TypeError: x is undefined"),
            LogEntry::default(),
            LogEntry::new("404 /favicon.ico"),
        ]));

        assert_eq!(
            failure.console_errors(),
            vec!["Uncaught TypeError: x is undefined", "404 /favicon.ico"]
        );
    }

    #[test]
    fn test_generic_failure_has_no_console_errors() {
        let failure = TestFailure::generic("RuntimeError: ????");
        assert_eq!(failure.traceback(), "RuntimeError: ????");
        assert!(failure.console_errors().is_empty());
    }

    #[test]
    fn test_log_entry_parses_browser_log_dict() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"level": "SEVERE", "message": "boom", "source": "console-api"}"#).unwrap();
        assert_eq!(entry.message, "boom");
        assert_eq!(entry.level.as_deref(), Some("SEVERE"));

        let bare: LogEntry = serde_json::from_str("{}").unwrap();
        assert_eq!(bare.message, "");
    }
}
