use crate::color::{Rgb, hsl_to_rgb, rgb_to_hsl};
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// Hue rotation, saturation scale and lightness offset in HSL space.
///
/// Saturation is held inside [0,1] after scaling since HSL has no meaning
/// outside it; lightness is left unclamped for the final clamp to handle.
pub struct Hsl;

impl PixelStage for Hsl {
    fn name(&self) -> &'static str {
        "hsl"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.hue_shift != 0.0 || params.saturation != 0.0 || params.lightness != 0.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let [h, s, l] = rgb_to_hsl(c);
        let h = (h + params.hue_shift).rem_euclid(1.0);
        let s = (s * (1.0 + params.saturation)).clamp(0.0, 1.0);
        let l = l + params.lightness;
        hsl_to_rgb([h, s, l])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ColorGradingSettings;

    fn params(hue: f32, saturation: f32, lightness: f32) -> KernelParams {
        let s = ColorGradingSettings {
            hue,
            saturation,
            lightness,
            ..Default::default()
        };
        KernelParams::new(&s, 1, 1, None)
    }

    fn close(a: Rgb, b: Rgb) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn hue_rotates_red_to_green() {
        let out = Hsl.apply([1.0, 0.0, 0.0], Fragment::CENTER, &params(120.0, 0.0, 0.0));
        assert!(close(out, [0.0, 1.0, 0.0]), "got {out:?}");
    }

    #[test]
    fn negative_hue_wraps() {
        let out = Hsl.apply([1.0, 0.0, 0.0], Fragment::CENTER, &params(-120.0, 0.0, 0.0));
        assert!(close(out, [0.0, 0.0, 1.0]), "got {out:?}");
    }

    #[test]
    fn full_desaturation_gives_gray() {
        let out = Hsl.apply([0.8, 0.2, 0.4], Fragment::CENTER, &params(0.0, -1.0, 0.0));
        assert!((out[0] - out[1]).abs() < 1e-6 && (out[1] - out[2]).abs() < 1e-6);
        assert!((out[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn lightness_is_an_offset() {
        let out = Hsl.apply([0.3, 0.3, 0.3], Fragment::CENTER, &params(0.0, 0.0, 0.2));
        assert!(close(out, [0.5, 0.5, 0.5]));
    }
}
