//! Screenshot capture buffer and per-test result capture
//!
//! A [`CaptureBuffer`] is owned by the worker session and handed to every
//! capture site as a cheap clone. A [`TestScope`] brackets one test: it starts
//! the test's timer, and when it is finished (or dropped) it drains the buffer
//! into a single [`TestResult`] appended to the worker's report.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use wdrecorder_common::{Image, Outcome, Report, TestResult, Timed};

use crate::failure::CallRecord;

/// Screenshots captured since the last test teardown
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    images: Arc<Mutex<Vec<Image>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a screenshot
    pub fn capture(&self, image: Image) {
        debug!("Captured {}", image.url);
        self.images.lock().push(image);
    }

    /// Record raw PNG bytes, returning the image's url
    pub fn capture_png(&self, png: &[u8], caption: Option<&str>) -> String {
        self.capture_page(png, caption, None)
    }

    /// Record raw PNG bytes along with the page URL shown at capture time
    pub fn capture_page(&self, png: &[u8], caption: Option<&str>, source_url: Option<&str>) -> String {
        let mut image = Image::from_png(png);
        if let Some(caption) = caption {
            image = image.with_caption(caption);
        }
        if let Some(source_url) = source_url {
            image = image.with_source_url(source_url);
        }
        let url = image.url.clone();
        self.capture(image);
        url
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    /// Take everything captured so far and leave the buffer empty
    fn drain(&self) -> Vec<Image> {
        std::mem::take(&mut *self.images.lock())
    }
}

/// Turn a test's accumulated state into its result.
///
/// Without a call record the test never started: its images are discarded
/// and no traceback is kept.
pub fn build_result(
    test_name: &str,
    mut timer: Timed,
    images: Vec<Image>,
    call: Option<CallRecord>,
) -> TestResult {
    timer.stop();

    let Some(call) = call else {
        return TestResult::new(test_name, Outcome::NeverStarted).with_timer(timer);
    };

    let mut result = match &call.failure {
        None => TestResult::new(test_name, Outcome::Success),
        Some(failure) => {
            let console_errors = failure.console_errors();
            for line in &console_errors {
                warn!("[{}] console: {}", test_name, line);
            }
            TestResult::new(test_name, Outcome::Failure)
                .with_traceback(failure.traceback())
                .with_console_errors(console_errors)
        }
    };
    if let Some(doc) = &call.doc {
        result = result.with_description(doc);
    }

    result.with_timer(timer).with_images(images)
}

/// One running test.
///
/// The capture buffer is cleared exactly once when the scope ends, whether
/// through [`TestScope::finish`] or by being dropped (setup failure, panic).
/// A dropped scope still records a `never started` result so that no test is
/// silently missing from the report.
pub struct TestScope<'a> {
    report: Option<&'a mut Report>,
    captures: CaptureBuffer,
    test_name: String,
    timer: Timed,
}

impl<'a> TestScope<'a> {
    pub fn new(report: &'a mut Report, captures: CaptureBuffer, test_name: impl Into<String>) -> Self {
        let test_name = test_name.into();
        debug!("Starting test {}", test_name);
        Self {
            report: Some(report),
            captures,
            test_name,
            timer: Timed::new(),
        }
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Handle for capture sites running inside this test
    pub fn captures(&self) -> &CaptureBuffer {
        &self.captures
    }

    /// Record the test's result. `None` means the runner saw no call outcome.
    pub fn finish(mut self, call: Option<CallRecord>) -> Outcome {
        self.record(call)
    }

    fn record(&mut self, call: Option<CallRecord>) -> Outcome {
        let images = self.captures.drain();
        let Some(report) = self.report.take() else {
            return Outcome::NeverStarted;
        };

        let timer = std::mem::take(&mut self.timer);
        let result = build_result(&self.test_name, timer, images, call);
        let outcome = result.outcome();
        debug!(
            "Finished test {} ({}, {} screenshots)",
            self.test_name,
            outcome,
            result.pngs().len()
        );
        report.push(result);
        outcome
    }
}

impl Drop for TestScope<'_> {
    fn drop(&mut self) {
        if self.report.is_some() {
            warn!("Test {} ended without a recorded call outcome", self.test_name);
            self.record(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{InteractionFailure, TestFailure};

    #[test]
    fn test_build_result_success_keeps_images_and_description() {
        let images = vec![Image::from_png(b"a"), Image::from_png(b"b")];
        let call = CallRecord::passed().with_doc("Logs in with TOTP\n\nmore");

        let result = build_result("test_login", Timed::new(), images, Some(call));

        assert_eq!(result.outcome(), Outcome::Success);
        assert_eq!(result.pngs().len(), 2);
        assert_eq!(result.test_description(), Some("Logs in with TOTP"));
        assert!(result.traceback().is_none());
        assert!(result.timer().is_stopped());
    }

    #[test]
    fn test_build_result_never_started_discards_images() {
        let images = vec![Image::from_png(b"setup")];

        let result = build_result("test_a_thing", Timed::new(), images, None);

        assert_eq!(result.outcome(), Outcome::NeverStarted);
        assert_eq!(result.test_name(), "test_a_thing");
        assert!(result.pngs().is_empty());
        assert!(result.traceback().is_none());
    }

    #[test]
    fn test_build_result_interaction_failure() {
        let failure = InteractionFailure::new("oh no!", "https://example.com/");
        let result = build_result("t", Timed::new(), Vec::new(), Some(CallRecord::failed(failure)));

        assert_eq!(result.outcome(), Outcome::Failure);
        assert!(result.traceback().unwrap().contains("oh no!"));
        assert!(result.console_errors().is_empty());
    }

    #[test]
    fn test_build_result_generic_failure() {
        let call = CallRecord::failed(TestFailure::generic("AssertionError: assert False"));
        let result = build_result("t", Timed::new(), Vec::new(), Some(call));

        assert!(result.traceback().unwrap().contains("AssertionError"));
    }

    #[test]
    fn test_scope_finish_drains_buffer() {
        let mut report = Report::new("scope");
        let captures = CaptureBuffer::new();

        let scope = TestScope::new(&mut report, captures.clone(), "test_one");
        captures.capture_png(b"one", Some("first"));
        captures.capture_png(b"two", None);
        assert_eq!(scope.finish(Some(CallRecord::passed())), Outcome::Success);

        assert!(captures.is_empty());
        assert_eq!(report.results()[0].pngs().len(), 2);
        assert_eq!(report.results()[0].pngs()[0].caption.as_deref(), Some("first"));
    }

    #[test]
    fn test_capture_page_keeps_source_url() {
        let mut report = Report::new("scope");
        let captures = CaptureBuffer::new();

        let scope = TestScope::new(&mut report, captures.clone(), "test_login");
        captures.capture_page(b"login", Some("login form"), Some("https://example.com/login"));
        scope.finish(Some(CallRecord::passed()));

        let image = &report.results()[0].pngs()[0];
        assert_eq!(image.caption.as_deref(), Some("login form"));
        assert_eq!(image.source_url.as_deref(), Some("https://example.com/login"));
    }

    #[test]
    fn test_dropped_scope_records_never_started_and_clears() {
        let mut report = Report::new("scope");
        let captures = CaptureBuffer::new();

        {
            let _scope = TestScope::new(&mut report, captures.clone(), "test_setup_fails");
            captures.capture_png(b"leaky", None);
        }

        assert!(captures.is_empty());
        assert_eq!(report.len(), 1);
        assert_eq!(report.results()[0].outcome(), Outcome::NeverStarted);
        assert_eq!(report.outcome(), Outcome::Failure);
    }

    #[test]
    fn test_images_do_not_leak_between_tests() {
        let mut report = Report::new("scope");
        let captures = CaptureBuffer::new();

        let first = TestScope::new(&mut report, captures.clone(), "first");
        captures.capture_png(b"1", None);
        first.finish(Some(CallRecord::passed()));

        let second = TestScope::new(&mut report, captures.clone(), "second");
        captures.capture_png(b"2", None);
        second.finish(Some(CallRecord::passed()));

        assert_eq!(report.results()[0].pngs().len(), 1);
        assert_eq!(report.results()[1].pngs().len(), 1);
        assert_ne!(report.results()[0].pngs()[0].url, report.results()[1].pngs()[0].url);
    }
}
