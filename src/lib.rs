//! Interactive color grading on a GPU backend with a CPU fallback.
//!
//! [`Grader`] is the entry point: it owns the settings history, presets
//! and LUT registry for one editing session and renders images on
//! whichever backend is available.

pub mod config;
pub mod error;
pub mod events;
pub mod grader;
pub mod metrics;
pub mod preview;

pub use config::{BackendPreference, GraderConfig};
pub use error::GradeError;
pub use events::{GradingEvent, GradingObserver};
pub use grader::{Grader, ProcessedImage};
pub use metrics::PerformanceMetrics;
pub use preview::PreviewQuality;

pub use grada_core::{
    ColorGradingHistory, ColorGradingPreset, ColorGradingSettings, ImageBuf, Lut3d,
    PresetCategory, SettingsPatch,
};
