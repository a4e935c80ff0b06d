use crate::color::Rgb;
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// Saturation that scales with how colorful the pixel already is: each
/// channel moves away from the mean by a factor of
/// `1 + (max - mean) * vibrance`.
pub struct Vibrance;

impl PixelStage for Vibrance {
    fn name(&self) -> &'static str {
        "vibrance"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.vibrance != 0.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let avg = (c[0] + c[1] + c[2]) / 3.0;
        let max = c[0].max(c[1]).max(c[2]);
        let k = 1.0 + (max - avg) * params.vibrance;
        c.map(|v| avg + (v - avg) * k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ColorGradingSettings;

    fn params(vibrance: f32) -> KernelParams {
        let s = ColorGradingSettings {
            vibrance,
            ..Default::default()
        };
        KernelParams::new(&s, 1, 1, None)
    }

    #[test]
    fn gray_is_unchanged() {
        let out = Vibrance.apply([0.4, 0.4, 0.4], Fragment::CENTER, &params(1.0));
        assert_eq!(out, [0.4, 0.4, 0.4]);
    }

    #[test]
    fn positive_spreads_channels() {
        let c = [0.6, 0.4, 0.2];
        let out = Vibrance.apply(c, Fragment::CENTER, &params(1.0));
        assert!(out[0] > c[0]);
        assert!((out[1] - 0.4).abs() < 1e-6);
        assert!(out[2] < c[2]);
    }

    #[test]
    fn negative_pulls_toward_mean() {
        let c = [0.6, 0.4, 0.2];
        let out = Vibrance.apply(c, Fragment::CENTER, &params(-1.0));
        assert!(out[0] < c[0] && out[0] > 0.4);
    }
}
