//! WebDriver Recorder CLI - Main Entry Point
//!
//! Operator tooling for report directories: regenerate a report from its
//! JSON snapshot, inspect worker state, and merge results left behind by
//! workers that never finished.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wdrecorder::config::{ENV_REPORT_DIR, ENV_REPORT_TITLE, ENV_SELENIUM_SERVER, ENV_TEMPLATE};
use wdrecorder::RecorderConfig;

mod commands;
mod output;

use commands::{aggregate, config, export, status};

/// WebDriver Recorder - screenshot reports for browser test runs
#[derive(Parser)]
#[command(name = "wdrecorder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Report directory
    #[arg(long, env = ENV_REPORT_DIR, global = true)]
    report_dir: Option<PathBuf>,

    /// Report page template
    #[arg(long, env = ENV_TEMPLATE, global = true)]
    template: Option<PathBuf>,

    /// Report title
    #[arg(long, env = ENV_REPORT_TITLE, global = true)]
    title: Option<String>,

    /// Remote automation server (host[:port])
    #[arg(long, env = ENV_SELENIUM_SERVER, global = true)]
    selenium_server: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate a report bundle from report.json
    Export(export::ExportArgs),

    /// Merge pending worker results and export them
    Aggregate(aggregate::AggregateArgs),

    /// List worker sentinels and pending results
    Status,

    /// Show the resolved configuration
    Config,
}

impl Cli {
    /// Environment defaults with flags applied on top
    fn resolve_config(&self) -> anyhow::Result<RecorderConfig> {
        let mut config = RecorderConfig::from_env()?;
        if let Some(dir) = &self.report_dir {
            config.report_dir = dir.clone();
        }
        if let Some(template) = &self.template {
            config.template_path = Some(template.clone());
        }
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        if let Some(server) = &self.selenium_server {
            config.selenium_server = Some(server.clone());
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.resolve_config()?;

    match cli.command {
        Commands::Export(args) => export::execute(args, &config, cli.format)?,
        Commands::Aggregate(args) => aggregate::execute(args, &config, cli.format)?,
        Commands::Status => status::execute(&config, cli.format)?,
        Commands::Config => config::execute(&config, cli.format)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "wdrecorder",
            "--report-dir",
            "/tmp/wd",
            "--selenium-server",
            "foo",
            "config",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.report_dir, PathBuf::from("/tmp/wd"));
        assert_eq!(config.webdriver_url().as_deref(), Some("http://foo/wd/hub"));
    }

    #[test]
    fn test_export_args() {
        let cli = Cli::try_parse_from(["wdrecorder", "export", "--input-json", "out/report.json"]).unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.input_json, PathBuf::from("out/report.json"));
                assert!(args.output_dir.is_none());
            }
            _ => panic!("expected export"),
        }
    }
}
