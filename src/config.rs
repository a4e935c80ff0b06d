use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::preview::PreviewQuality;

/// Images above this many pixels are graded at reduced size for preview.
pub const DEFAULT_LARGE_IMAGE_THRESHOLD: usize = 2_000_000;

/// Hard ceiling on input size. Anything larger fails fast.
pub const DEFAULT_MAX_IMAGE_PIXELS: usize = 100_000_000;

/// Which execution backend a [`Grader`](crate::Grader) should use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// GPU when it initializes, CPU otherwise.
    #[default]
    Auto,
    /// Same as `Auto`, but logs the fallback as unexpected.
    Gpu,
    /// Never touch the GPU.
    Cpu,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraderConfig {
    pub backend: BackendPreference,
    pub preview_quality: PreviewQuality,
    pub large_image_threshold: usize,
    pub max_history: usize,
    pub max_image_pixels: usize,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            preview_quality: PreviewQuality::High,
            large_image_threshold: DEFAULT_LARGE_IMAGE_THRESHOLD,
            max_history: grada_core::history::DEFAULT_MAX_HISTORY,
            max_image_pixels: DEFAULT_MAX_IMAGE_PIXELS,
        }
    }
}

impl GraderConfig {
    /// Read a JSON config. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GraderConfig =
            serde_json::from_str(r#"{"backend":"cpu","previewQuality":"low"}"#).unwrap();
        assert_eq!(config.backend, BackendPreference::Cpu);
        assert_eq!(config.preview_quality, PreviewQuality::Low);
        assert_eq!(config.max_history, 50);
        assert_eq!(config.large_image_threshold, DEFAULT_LARGE_IMAGE_THRESHOLD);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"maxHistory": 5, "maxImagePixels": 1000}}"#).unwrap();
        let config = GraderConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.max_image_pixels, 1000);
        assert_eq!(config.backend, BackendPreference::Auto);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = GraderConfig::from_json_file("/nonexistent/grada.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/grada.json"));
    }
}
