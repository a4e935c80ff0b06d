use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and memory figures for one `process_image` call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Wall time of the render, in milliseconds.
    #[serde(rename = "processingTime")]
    pub processing_time_ms: f64,
    /// `1000 / processing_time_ms`, 0 when the time rounds to zero.
    pub fps: f64,
    /// Pixel buffers held while rendering, in megabytes.
    #[serde(rename = "memoryUsage")]
    pub memory_usage_mb: f64,
}

impl PerformanceMetrics {
    pub fn new(elapsed: Duration, buffer_bytes: usize) -> Self {
        let processing_time_ms = elapsed.as_secs_f64() * 1000.0;
        let fps = if processing_time_ms > 0.0 {
            1000.0 / processing_time_ms
        } else {
            0.0
        };
        Self {
            processing_time_ms,
            fps,
            memory_usage_mb: buffer_bytes as f64 / (1024.0 * 1024.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_derived_from_time() {
        let m = PerformanceMetrics::new(Duration::from_millis(20), 2 * 1024 * 1024);
        assert!((m.processing_time_ms - 20.0).abs() < 1e-9);
        assert!((m.fps - 50.0).abs() < 1e-9);
        assert!((m.memory_usage_mb - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_time_has_zero_fps() {
        assert_eq!(PerformanceMetrics::new(Duration::ZERO, 0).fps, 0.0);
    }

    #[test]
    fn serializes_with_wire_names() {
        let m = PerformanceMetrics::new(Duration::from_millis(10), 0);
        let json = serde_json::to_value(m).unwrap();
        assert!(json.get("processingTime").is_some());
        assert!(json.get("fps").is_some());
        assert!(json.get("memoryUsage").is_some());
    }
}
