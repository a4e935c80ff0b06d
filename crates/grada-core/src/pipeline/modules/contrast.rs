use crate::color::Rgb;
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// Linear contrast around mid-gray: `c = (c - 0.5) * (1 + contrast) + 0.5`.
pub struct Contrast;

impl PixelStage for Contrast {
    fn name(&self) -> &'static str {
        "contrast"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.contrast != 0.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let k = 1.0 + params.contrast;
        c.map(|v| (v - 0.5) * k + 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ColorGradingSettings;

    fn params(contrast: f32) -> KernelParams {
        let s = ColorGradingSettings {
            contrast,
            ..Default::default()
        };
        KernelParams::new(&s, 1, 1, None)
    }

    #[test]
    fn pivot_is_fixed() {
        let out = Contrast.apply([0.5, 0.5, 0.5], Fragment::CENTER, &params(0.8));
        assert_eq!(out, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn positive_spreads_negative_flattens() {
        let up = Contrast.apply([0.25, 0.75, 0.5], Fragment::CENTER, &params(1.0));
        assert!((up[0] - 0.0).abs() < 1e-6);
        assert!((up[1] - 1.0).abs() < 1e-6);

        let flat = Contrast.apply([0.25, 0.75, 0.5], Fragment::CENTER, &params(-1.0));
        assert_eq!(flat, [0.5, 0.5, 0.5]);
    }
}
