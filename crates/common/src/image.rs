//! Captured screenshots and their content-addressed identity
//!
//! An image's `url` is derived from a SHA-256 digest of its encoded payload,
//! so identical screenshots taken by different tests (or workers) map to the
//! same file under `screenshots/`.

use std::path::{Component, Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{Error, Result, SCREENSHOTS_DIR};

/// One captured screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Path of the materialized file, relative to the report directory
    pub url: String,

    /// Base64-encoded PNG; dropped once the file has been written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,

    #[serde(default)]
    pub caption: Option<String>,

    /// Set when the capture was taken because an interaction failed
    #[serde(default)]
    pub is_error: bool,

    /// Page URL at capture time
    #[serde(default)]
    pub source_url: Option<String>,
}

impl Image {
    /// Build an image from an already base64-encoded PNG
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        let encoded = encoded.into();
        Self {
            url: Self::url_for(&encoded),
            base64: Some(encoded),
            caption: None,
            is_error: false,
            source_url: None,
        }
    }

    /// Build an image from raw PNG bytes
    pub fn from_png(bytes: &[u8]) -> Self {
        Self::from_base64(STANDARD.encode(bytes))
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = Some(source_url.into());
        self
    }

    pub fn with_error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    /// Compute SHA-256 hash of data
    pub fn hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Content-addressed relative path for an encoded payload
    pub fn url_for(encoded: &str) -> String {
        format!("{}/{}.png", SCREENSHOTS_DIR, Self::hash(encoded.as_bytes()))
    }

    pub fn has_payload(&self) -> bool {
        self.base64.as_deref().map_or(false, |b| !b.is_empty())
    }

    /// Decode the payload, if any
    pub fn decode(&self) -> Result<Option<Vec<u8>>> {
        match self.base64.as_deref() {
            Some(encoded) if !encoded.is_empty() => Ok(Some(STANDARD.decode(encoded)?)),
            _ => Ok(None),
        }
    }

    /// Drop the embedded payload, keeping the metadata
    pub fn strip_payload(&mut self) {
        self.base64 = None;
    }

    /// Destination of this image under `root`.
    ///
    /// Only plain relative paths are accepted.
    pub fn path_in(&self, root: &Path) -> Result<PathBuf> {
        let relative = Path::new(&self.url);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if self.url.is_empty() || !is_plain {
            return Err(Error::UnsafePath(self.url.clone()));
        }
        Ok(root.join(relative))
    }

    /// Write the decoded payload to `root/url`, creating parent directories.
    ///
    /// Returns `None` without touching the filesystem when there is no payload.
    pub fn save(&self, root: &Path) -> Result<Option<PathBuf>> {
        let Some(bytes) = self.decode()? else {
            return Ok(None);
        };

        let path = self.path_in(root)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &bytes)?;

        debug!("Saved image {} ({} bytes)", self.url, bytes.len());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

    #[test]
    fn test_identical_payloads_share_url() {
        let a = Image::from_png(PNG_BYTES).with_caption("first");
        let b = Image::from_png(PNG_BYTES).with_caption("second");
        let c = Image::from_png(b"something else");

        assert_eq!(a.url, b.url);
        assert_ne!(a.url, c.url);
        assert!(a.url.starts_with("screenshots/"));
        assert!(a.url.ends_with(".png"));
    }

    #[test]
    fn test_save_writes_decoded_bytes() {
        let tmp = TempDir::new().unwrap();
        let image = Image::from_png(PNG_BYTES);

        let path = image.save(tmp.path()).unwrap().unwrap();

        assert_eq!(path, tmp.path().join(&image.url));
        assert_eq!(std::fs::read(&path).unwrap(), PNG_BYTES);
    }

    #[test]
    fn test_save_blank_image_is_noop() {
        let tmp = TempDir::new().unwrap();
        let mut image = Image::from_png(PNG_BYTES);
        image.strip_payload();

        assert!(image.save(tmp.path()).unwrap().is_none());
        assert!(!tmp.path().join(&image.url).exists());
    }

    #[test]
    fn test_save_rejects_escaping_url() {
        let tmp = TempDir::new().unwrap();
        let mut image = Image::from_png(PNG_BYTES);
        image.url = "../outside.png".to_string();

        assert!(matches!(image.save(tmp.path()), Err(Error::UnsafePath(_))));
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        let image = Image::from_base64("***not base64***");
        assert!(matches!(image.decode(), Err(Error::Decode(_))));
    }

    #[test]
    fn test_stripped_payload_is_omitted_from_json() {
        let mut image = Image::from_png(PNG_BYTES).with_caption("login form");
        image.strip_payload();

        let value = serde_json::to_value(&image).unwrap();
        assert!(value.get("base64").is_none());
        assert_eq!(value["caption"], "login form");
        assert_eq!(value["url"], image.url.as_str());
    }
}
