//! Recorder configuration
//!
//! Values come from defaults, then `WDRECORDER_*` environment variables, then
//! whatever the caller (usually the CLI) overrides.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use wdrecorder_common::{default_report_dir, DEFAULT_TITLE};

use crate::error::{RecorderError, RecorderResult};
use crate::exporter::ReportExporter;

pub const ENV_REPORT_DIR: &str = "WDRECORDER_REPORT_DIR";
pub const ENV_TEMPLATE: &str = "WDRECORDER_TEMPLATE";
pub const ENV_REPORT_TITLE: &str = "WDRECORDER_REPORT_TITLE";
pub const ENV_SELENIUM_SERVER: &str = "WDRECORDER_SELENIUM_SERVER";
pub const ENV_DISABLE_SESSION_BROWSER: &str = "WDRECORDER_DISABLE_SESSION_BROWSER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecorderConfig {
    /// Shared directory for sentinels, worker results and the final report
    pub report_dir: PathBuf,

    /// Custom page template; `None` uses the built-in one
    pub template_path: Option<PathBuf>,

    pub title: String,

    /// Invocation arguments shown in the report header
    pub arguments: Option<String>,

    /// Remote automation host, e.g. `selenium:4444`
    pub selenium_server: Option<String>,

    /// Start a fresh browser per test instead of one per session
    pub disable_session_browser: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            report_dir: default_report_dir(),
            template_path: None,
            title: DEFAULT_TITLE.to_string(),
            arguments: None,
            selenium_server: None,
            disable_session_browser: false,
        }
    }
}

impl RecorderConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> RecorderResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RecorderResult<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(ENV_REPORT_DIR) {
            config.report_dir = PathBuf::from(dir);
        }
        if let Some(template) = get(ENV_TEMPLATE) {
            config.template_path = Some(PathBuf::from(template));
        }
        if let Some(title) = get(ENV_REPORT_TITLE) {
            config.title = title;
        }
        config.selenium_server = get(ENV_SELENIUM_SERVER);
        if let Some(flag) = get(ENV_DISABLE_SESSION_BROWSER) {
            config.disable_session_browser = parse_env_flag(ENV_DISABLE_SESSION_BROWSER, &flag)?.unwrap_or(false);
        }

        debug!("Resolved recorder config: {:?}", config);
        Ok(config)
    }

    /// Remote WebDriver endpoint, if a server is configured
    pub fn webdriver_url(&self) -> Option<String> {
        self.selenium_server
            .as_deref()
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .map(|server| format!("http://{}/wd/hub", server))
    }

    /// Exporter for the configured template
    pub fn exporter(&self) -> RecorderResult<ReportExporter> {
        match &self.template_path {
            Some(path) => ReportExporter::from_template_file(path),
            None => Ok(ReportExporter::new()),
        }
    }

    /// Create the report directory if needed
    pub fn ensure_report_dir(&self) -> RecorderResult<&Path> {
        std::fs::create_dir_all(&self.report_dir)?;
        Ok(&self.report_dir)
    }
}

/// Parse a boolean environment value.
///
/// Blank is unset, `1`/`true` is true and `0`/`false` is false, ignoring
/// case. Anything else is rejected.
pub fn parse_env_flag(key: &str, value: &str) -> RecorderResult<Option<bool>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" => Ok(Some(true)),
        "0" | "false" => Ok(Some(false)),
        other => Err(RecorderError::InvalidConfig(format!(
            "{} must be one of 1, 0, true, false (got '{}')",
            key, other
        ))),
    }
}
