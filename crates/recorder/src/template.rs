//! HTML rendering of a report
//!
//! Templates are plain HTML with `{{ name }}` placeholders. Scalar
//! placeholders are HTML-escaped; `results` and `failures` expand to
//! pre-rendered fragments built from the report's public shape.
//!
//! | placeholder     | value                                      |
//! |-----------------|--------------------------------------------|
//! | `title`         | report title                               |
//! | `arguments`     | invocation arguments (empty if none)       |
//! | `outcome`       | `success` / `failure`                      |
//! | `outcome_class` | CSS-friendly outcome                       |
//! | `start_time`    | `%Y-%m-%d %H:%M:%S`                        |
//! | `end_time`      | same format, empty while running           |
//! | `duration`      | e.g. `2m 5s`                               |
//! | `generated_at`  | render time                                |
//! | `num_results`   | number of results                          |
//! | `num_failures`  | number of non-successful results           |
//! | `failures`      | list of links to failing results           |
//! | `results`       | one section per result                     |

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::warn;
use wdrecorder_common::{Outcome, Report, TestResult, VERSION};

use crate::error::{RecorderError, RecorderResult};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").expect("static regex"));

const BUILTIN_TEMPLATE: &str = include_str!("../templates/report.html");

/// A loaded report template
#[derive(Debug, Clone)]
pub struct ReportTemplate {
    name: String,
    source: String,
}

impl ReportTemplate {
    /// The template shipped with the crate
    pub fn builtin() -> Self {
        Self::parse("report.html", BUILTIN_TEMPLATE)
    }

    pub fn parse(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Load a template file
    pub fn from_file(path: &Path) -> RecorderResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RecorderError::TemplateNotFound(path.to_path_buf()),
            _ => RecorderError::Io(e),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::parse(name, source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the report into a string
    pub fn render(&self, report: &Report) -> String {
        let generated_at = Utc::now();
        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures<'_>| {
                match render_placeholder(&caps[1], report, generated_at) {
                    Some(value) => value,
                    None => {
                        warn!("Unknown placeholder '{}' in template {}", &caps[1], self.name);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Render the report into a writer
    pub fn render_to<W: Write>(&self, report: &Report, mut writer: W) -> std::io::Result<()> {
        writer.write_all(self.render(report).as_bytes())?;
        writer.flush()
    }
}

impl Default for ReportTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

fn render_placeholder(name: &str, report: &Report, generated_at: DateTime<Utc>) -> Option<String> {
    let value = match name {
        "title" => escape_html(report.title()),
        "arguments" => escape_html(report.arguments().unwrap_or_default()),
        "outcome" => report.outcome().to_string(),
        "outcome_class" => outcome_class(report.outcome()).to_string(),
        "start_time" => pretty_datetime(report.timer().start_time()),
        "end_time" => report.timer().end_time().map(pretty_datetime).unwrap_or_default(),
        "duration" => report.duration(),
        "generated_at" => pretty_datetime(generated_at),
        "num_results" => report.len().to_string(),
        "num_failures" => report.num_failures().to_string(),
        "failures" => render_failures(report),
        "results" => render_results(report),
        "version" => VERSION.to_string(),
        _ => return None,
    };
    Some(value)
}

fn render_failures(report: &Report) -> String {
    let failures = report.failures();
    if failures.is_empty() {
        return String::new();
    }

    let mut html = String::from("<ul class=\"failure-index\">\n");
    for result in failures {
        let _ = writeln!(
            html,
            "  <li class=\"outcome-{}\"><a href=\"#{}\">{}</a> ({})</li>",
            outcome_class(result.outcome()),
            escape_html(result.test_id()),
            escape_html(result.test_name()),
            result.outcome(),
        );
    }
    html.push_str("</ul>\n");
    html
}

fn render_results(report: &Report) -> String {
    let mut html = String::new();
    for result in report.results() {
        render_result(&mut html, result);
    }
    html
}

fn render_result(html: &mut String, result: &TestResult) {
    let id = escape_html(result.test_id());
    let _ = writeln!(
        html,
        "<section class=\"test-result outcome-{}\" id=\"{}\">",
        outcome_class(result.outcome()),
        id
    );
    let _ = writeln!(
        html,
        "  <h2><a href=\"#{}\">{}</a> <span class=\"outcome\">{}</span> <span class=\"duration\">{}</span></h2>",
        id,
        escape_html(result.test_name()),
        result.outcome(),
        result.duration(),
    );

    if let Some(description) = result.test_description() {
        let _ = writeln!(html, "  <p class=\"description\">{}</p>", escape_html(description));
    }

    if let Some(traceback) = result.traceback() {
        let _ = writeln!(html, "  <pre class=\"traceback\">{}</pre>", escape_html(traceback));
    }

    if !result.console_errors().is_empty() {
        html.push_str("  <ul class=\"console-errors\">\n");
        for line in result.console_errors() {
            let _ = writeln!(html, "    <li>{}</li>", escape_html(line));
        }
        html.push_str("  </ul>\n");
    }

    if !result.pngs().is_empty() {
        html.push_str("  <div class=\"screenshots\">\n");
        for (index, image) in result.pngs().iter().enumerate() {
            let label = letter_label(index);
            let class = if image.is_error { "screenshot error" } else { "screenshot" };
            let caption = image.caption.as_deref().unwrap_or_default();
            let _ = writeln!(html, "    <figure class=\"{}\" id=\"{}-{}\">", class, id, label);
            let _ = writeln!(
                html,
                "      <a href=\"{url}\"><img src=\"{url}\" alt=\"{label}\" loading=\"lazy\"></a>",
                url = escape_html(&image.url),
                label = label,
            );
            let source = image
                .source_url
                .as_deref()
                .map(|url| {
                    format!(
                        " <a class=\"source-url\" href=\"{url}\">{url}</a>",
                        url = escape_html(url)
                    )
                })
                .unwrap_or_default();
            let _ = writeln!(
                html,
                "      <figcaption><b>{}</b> {}{}</figcaption>",
                label,
                escape_html(caption),
                source
            );
            html.push_str("    </figure>\n");
        }
        html.push_str("  </div>\n");
    }

    html.push_str("</section>\n");
}

fn outcome_class(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "success",
        Outcome::Failure => "failure",
        Outcome::NeverStarted => "never-started",
    }
}

/// Escape special HTML characters for text and attribute content.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `A, B, ..., Z, AA, AB, ...` for zero-based positions
pub fn letter_label(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

pub fn pretty_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use wdrecorder_common::Image;

    #[test_case(0, "A")]
    #[test_case(25, "Z")]
    #[test_case(26, "AA")]
    #[test_case(27, "AB")]
    #[test_case(52, "BA")]
    #[test_case(701, "ZZ")]
    #[test_case(702, "AAA")]
    fn test_letter_label(index: usize, expected: &str) {
        assert_eq!(letter_label(index), expected);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_scalars_and_unknown_placeholders() {
        let template = ReportTemplate::parse(
            "t.html",
            "<h1>{{ title }}</h1><p>{{outcome}} {{ num_results }}</p>{{ nope }}",
        );
        let report = Report::new("Smoke <suite>");

        let html = template.render(&report);

        assert_eq!(html, "<h1>Smoke &lt;suite&gt;</h1><p>success 0</p>{{ nope }}");
    }

    #[test]
    fn test_render_results_and_failure_index() {
        let mut report = Report::new("suite");
        report.push(
            TestResult::new("test_ok", Outcome::Success).with_images(vec![
                Image::from_png(b"1").with_caption("before"),
                Image::from_png(b"2")
                    .with_caption("after")
                    .with_error(true)
                    .with_source_url("https://example.com/login?next=a&b"),
            ]),
        );
        report.push(
            TestResult::new("test_bad[x]", Outcome::Failure)
                .with_traceback("AssertionError: <oops>")
                .with_console_errors(vec!["boom".to_string()]),
        );

        let html = ReportTemplate::parse("t", "{{ failures }}{{ results }}").render(&report);

        assert!(html.contains("<a href=\"#test_bad-x\">test_bad[x]</a> (failure)"));
        assert!(html.contains("id=\"test_ok\""));
        assert!(html.contains("<b>A</b> before</figcaption>"));
        assert!(html.contains(
            "<b>B</b> after <a class=\"source-url\" href=\"https://example.com/login?next=a&amp;b\">"
        ));
        assert!(html.contains("class=\"screenshot error\" id=\"test_ok-B\""));
        assert!(html.contains("AssertionError: &lt;oops&gt;"));
        assert!(html.contains("<li>boom</li>"));
        assert!(!html.contains("base64"));
    }

    #[test]
    fn test_builtin_template_renders() {
        let mut report = Report::new("Builtin").with_arguments("-n 2");
        report.push(TestResult::new("test_a", Outcome::NeverStarted));
        report.finalize();

        let html = ReportTemplate::builtin().render(&report);

        assert!(html.contains("<title>Builtin</title>"));
        assert!(html.contains("never started"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ReportTemplate::from_file(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(err, RecorderError::TemplateNotFound(_)));
    }
}
