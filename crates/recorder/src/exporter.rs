//! Report export: JSON snapshot, screenshots, static assets and HTML page
//!
//! Every operation is a pure function of a [`Report`] and a destination
//! directory; re-running an export overwrites the same file names.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use wdrecorder_common::{Outcome, Report, INDEX_HTML, REPORT_JSON, STATIC_DIR};

use crate::error::RecorderResult;
use crate::template::ReportTemplate;

const BUILTIN_ASSETS: &[(&str, &str)] = &[
    ("report.css", include_str!("../templates/static/report.css")),
    ("report.js", include_str!("../templates/static/report.js")),
];

/// Where static assets come from
#[derive(Debug, Clone, PartialEq, Eq)]
enum StaticAssets {
    Builtin,
    Directory(PathBuf),
    Disabled,
}

/// What an [`ReportExporter::export_all`] run produced
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub json_path: PathBuf,
    pub html_path: PathBuf,
    pub images_written: usize,
    pub assets_copied: usize,
    pub num_results: usize,
    pub num_failures: usize,
    pub outcome: Outcome,
}

/// Turns a finished report into an artifact bundle
#[derive(Debug, Clone)]
pub struct ReportExporter {
    template: ReportTemplate,
    assets: StaticAssets,
}

impl ReportExporter {
    /// Exporter using the built-in template and assets
    pub fn new() -> Self {
        Self::with_template(ReportTemplate::builtin())
    }

    /// Exporter using a custom template and the built-in assets
    pub fn with_template(template: ReportTemplate) -> Self {
        Self {
            template,
            assets: StaticAssets::Builtin,
        }
    }

    /// Load a template file. A `static/` directory next to it supplies the
    /// assets; without one the built-in assets are used.
    pub fn from_template_file(path: &Path) -> RecorderResult<Self> {
        let template = ReportTemplate::from_file(path)?;
        let static_dir = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(STATIC_DIR);

        let assets = if static_dir.is_dir() {
            StaticAssets::Directory(static_dir)
        } else {
            debug!("No {:?}; using built-in static assets", static_dir);
            StaticAssets::Builtin
        };

        Ok(Self { template, assets })
    }

    /// Copy assets from `dir` instead. A missing directory disables asset copying.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.assets = if dir.is_dir() {
            StaticAssets::Directory(dir)
        } else {
            warn!(
                "Expected {:?} to exist, but it does not. Skipping static asset copying.",
                dir
            );
            StaticAssets::Disabled
        };
        self
    }

    pub fn template(&self) -> &ReportTemplate {
        &self.template
    }

    /// Write the report snapshot.
    ///
    /// With `exclude_image_data` every image keeps its url, caption, error
    /// flag and source URL but loses its payload.
    pub fn export_json(
        &self,
        report: &Report,
        dest_dir: &Path,
        dest_filename: &str,
        exclude_image_data: bool,
    ) -> RecorderResult<PathBuf> {
        let path = dest_dir.join(dest_filename);
        if exclude_image_data {
            debug!("Stripping base64 image data from {}", dest_filename);
            report.without_image_data().save(&path)?;
        } else {
            report.save(&path)?;
        }
        info!("Report JSON saved to {:?}", path);
        Ok(path)
    }

    /// Write every payload-bearing image to `dest_dir/url`.
    ///
    /// Images without a payload are skipped; a url shared by several images
    /// is written once.
    pub fn export_images(&self, report: &Report, dest_dir: &Path) -> RecorderResult<usize> {
        let mut written: HashSet<&str> = HashSet::new();

        for result in report.results() {
            for image in result.pngs().iter().filter(|i| i.has_payload()) {
                if !written.insert(image.url.as_str()) {
                    debug!("Image {} already written", image.url);
                    continue;
                }
                image.save(dest_dir)?;
            }
        }

        info!("Saved {} image(s) under {:?}", written.len(), dest_dir);
        Ok(written.len())
    }

    /// Copy static assets into `dest_dir/static`, preserving relative paths
    pub fn export_static(&self, dest_dir: &Path) -> RecorderResult<usize> {
        let dest_static = dest_dir.join(STATIC_DIR);
        let mut copied = 0;

        match &self.assets {
            StaticAssets::Disabled => return Ok(0),
            StaticAssets::Builtin => {
                std::fs::create_dir_all(&dest_static)?;
                for (name, content) in BUILTIN_ASSETS {
                    std::fs::write(dest_static.join(name), content)?;
                    copied += 1;
                }
            }
            StaticAssets::Directory(source) => {
                for entry in WalkDir::new(source) {
                    let entry = entry?;
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
                    let destination = dest_static.join(relative);
                    if let Some(parent) = destination.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::copy(entry.path(), &destination)?;
                    debug!("Copied static asset {:?} to {:?}", entry.path(), destination);
                    copied += 1;
                }
            }
        }

        info!("Copied {} static asset(s) to {:?}", copied, dest_static);
        Ok(copied)
    }

    /// Render the report page
    pub fn export_html(&self, report: &Report, dest_dir: &Path, dest_filename: &str) -> RecorderResult<PathBuf> {
        std::fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(dest_filename);
        let writer = BufWriter::new(File::create(&path)?);
        self.template.render_to(report, writer)?;
        info!("Exported report HTML to {:?}", path);
        Ok(path)
    }

    /// JSON without image data, then the images themselves, then static
    /// assets, then the page.
    pub fn export_all(&self, report: &Report, dest_dir: &Path) -> RecorderResult<ExportSummary> {
        let json_path = self.export_json(report, dest_dir, REPORT_JSON, true)?;
        let images_written = self.export_images(report, dest_dir)?;
        let assets_copied = self.export_static(dest_dir)?;
        let html_path = self.export_html(report, dest_dir, INDEX_HTML)?;

        Ok(ExportSummary {
            json_path,
            html_path,
            images_written,
            assets_copied,
            num_results: report.len(),
            num_failures: report.num_failures(),
            outcome: report.outcome(),
        })
    }
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wdrecorder_common::{Image, TestResult};

    fn report_with_images() -> Report {
        let shared = Image::from_png(b"same screen");
        let mut report = Report::new("export");
        report.push(
            TestResult::new("test_one", Outcome::Success)
                .with_images(vec![shared.clone().with_caption("one"), Image::from_png(b"unique")]),
        );
        report.push(TestResult::new("test_two", Outcome::Success).with_images(vec![shared.with_caption("two")]));
        report.finalize();
        report
    }

    #[test]
    fn test_export_images_deduplicates() {
        let tmp = TempDir::new().unwrap();
        let report = report_with_images();

        let written = ReportExporter::new().export_images(&report, tmp.path()).unwrap();

        assert_eq!(written, 2);
        let files = std::fs::read_dir(tmp.path().join("screenshots")).unwrap().count();
        assert_eq!(files, 2);
    }

    #[test]
    fn test_export_images_skips_blank() {
        let tmp = TempDir::new().unwrap();
        let report = report_with_images().without_image_data();

        let written = ReportExporter::new().export_images(&report, tmp.path()).unwrap();

        assert_eq!(written, 0);
        assert!(!tmp.path().join("screenshots").exists());
    }

    #[test]
    fn test_export_json_excluding_image_data() {
        let tmp = TempDir::new().unwrap();
        let report = report_with_images();

        let path = ReportExporter::new()
            .export_json(&report, tmp.path(), "report.json", true)
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"base64\""));
        let loaded = Report::load(&path).unwrap();
        assert_eq!(loaded.num_images(), 3);
        assert_eq!(loaded.results()[0].pngs()[0].caption.as_deref(), Some("one"));
    }

    #[test]
    fn test_export_static_builtin() {
        let tmp = TempDir::new().unwrap();
        let copied = ReportExporter::new().export_static(tmp.path()).unwrap();

        assert_eq!(copied, BUILTIN_ASSETS.len());
        assert!(tmp.path().join("static/report.css").exists());
    }

    #[test]
    fn test_export_static_disabled_when_dir_missing() {
        let tmp = TempDir::new().unwrap();
        let exporter = ReportExporter::new().with_static_dir(tmp.path().join("missing"));

        assert_eq!(exporter.export_static(tmp.path()).unwrap(), 0);
        assert!(!tmp.path().join("static").exists());
    }
}
