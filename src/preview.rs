//! Adaptive preview resolution.
//!
//! Large images are graded at a fraction of their size while the user is
//! dragging controls, then scaled back up so callers always receive a
//! buffer with the source's dimensions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use grada_core::ImageBuf;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl PreviewQuality {
    /// Linear scale applied to oversized images.
    pub fn scale(self) -> f32 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 1.0,
        }
    }
}

impl FromStr for PreviewQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown preview quality {other:?}")),
        }
    }
}

/// Scale to grade `pixels` at. Only images strictly above `threshold` are
/// reduced, and `High` never is.
pub fn preview_scale(pixels: usize, quality: PreviewQuality, threshold: usize) -> f32 {
    if pixels > threshold {
        quality.scale()
    } else {
        1.0
    }
}

/// Downsample `src` for grading. `None` means grade at full size.
pub fn downsample(src: &ImageBuf, scale: f32) -> Option<ImageBuf> {
    (scale < 1.0).then(|| src.scaled(scale))
}

/// Bring a reduced render back to the source's dimensions.
pub fn upsample(graded: ImageBuf, width: u32, height: u32) -> ImageBuf {
    if graded.width == width && graded.height == height {
        graded
    } else {
        graded.resize_bilinear(width, height)
    }
}
