//! Per-test capture scenarios through a full worker session

use std::path::Path;

use tempfile::TempDir;
use wdrecorder::{
    CallRecord, Completion, InteractionFailure, LogEntry, RecorderConfig, TestFailure, WorkerSession,
};
use wdrecorder_common::{Outcome, Report};

fn run_single(dir: &Path, node_id: &str, call: Option<CallRecord>) -> Report {
    let config = RecorderConfig {
        report_dir: dir.to_path_buf(),
        ..Default::default()
    };
    let mut session = WorkerSession::start(&config).unwrap();
    let captures = session.captures();

    let scope = session.begin_test(node_id);
    captures.capture_png(b"screen", Some("during test"));
    scope.finish(call);

    assert!(matches!(session.finish().unwrap(), Completion::Exported { .. }));
    Report::load(&dir.join("report.json")).unwrap()
}

#[test]
fn test_setup_failure_is_never_started() {
    let tmp = TempDir::new().unwrap();
    let report = run_single(tmp.path(), "test_never_started.py::test_a_thing", None);

    let result = &report.results()[0];
    assert_eq!(result.outcome(), Outcome::NeverStarted);
    assert_eq!(result.test_name(), "test_never_started.py::test_a_thing");
    assert!(result.pngs().is_empty());
    assert!(result.traceback().is_none());
    assert_eq!(report.outcome(), Outcome::Failure);
    assert_eq!(report.num_failures(), 1);
}

#[test]
fn test_interaction_failure_without_logs() {
    let tmp = TempDir::new().unwrap();
    let failure = InteractionFailure::new("oh no!", "file:///tmp/index.html");
    let report = run_single(tmp.path(), "test_fail", Some(CallRecord::failed(failure)));

    let result = &report.results()[0];
    assert_eq!(result.outcome(), Outcome::Failure);
    assert!(result.traceback().unwrap().contains("oh no!"));
    assert!(result.console_errors().is_empty());
    assert_eq!(result.pngs().len(), 1);
}

#[test]
fn test_interaction_failure_with_console_log() {
    let tmp = TempDir::new().unwrap();
    let failure = InteractionFailure::new("click failed", "https://example.com/")
        .with_logs(vec![LogEntry::new("Uncaught ReferenceError: foo is not defined")]);
    let report = run_single(tmp.path(), "test_console", Some(CallRecord::failed(failure)));

    assert_eq!(
        report.results()[0].console_errors(),
        ["Uncaught ReferenceError: foo is not defined"]
    );
}

#[test]
fn test_generic_failure_keeps_text() {
    let tmp = TempDir::new().unwrap();
    let call = CallRecord::failed(TestFailure::generic("RuntimeError: ????"));
    let report = run_single(tmp.path(), "test_runtime_error", Some(call));

    let result = &report.results()[0];
    assert_eq!(result.outcome(), Outcome::Failure);
    assert!(result.traceback().unwrap().contains("RuntimeError"));
}

#[test]
fn test_docstring_becomes_description() {
    let tmp = TempDir::new().unwrap();
    let call = CallRecord::passed().with_doc("\n    Checks the login banner.\n\n    Longer notes.\n");
    let report = run_single(tmp.path(), "test_documented", Some(call));

    let result = &report.results()[0];
    assert_eq!(result.outcome(), Outcome::Success);
    assert_eq!(result.test_description(), Some("Checks the login banner."));
    assert_eq!(report.outcome(), Outcome::Success);
}
