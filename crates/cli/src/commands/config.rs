//! Config Command
//!
//! Shows the configuration after flags and environment are applied.

use anyhow::Result;
use serde::Serialize;
use wdrecorder::RecorderConfig;

use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Serialize)]
pub struct ConfigDisplay<'a> {
    #[serde(flatten)]
    pub config: &'a RecorderConfig,
    pub webdriver_url: Option<String>,
}

impl TableDisplay for ConfigDisplay<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Report Dir", "Template", "Title", "WebDriver URL", "Session Browser"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.config.report_dir.display().to_string(),
            self.config
                .template_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string()),
            self.config.title.clone(),
            self.webdriver_url.clone().unwrap_or_else(|| "(local)".to_string()),
            if self.config.disable_session_browser { "per test" } else { "shared" }.to_string(),
        ]
    }
}

pub fn execute(config: &RecorderConfig, format: OutputFormat) -> Result<()> {
    let display = ConfigDisplay {
        config,
        webdriver_url: config.webdriver_url(),
    };
    print_item(&display, format);
    Ok(())
}
