use crate::color::{Rgb, band_weights, hsl_to_rgb, luma};
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};
use crate::settings;

/// How far a fully saturated wheel, or full luminance, moves a channel.
const WHEEL_STRENGTH: f32 = 0.2;

/// Precompute the RGB offset each band's wheel contributes.
///
/// The hue color is taken at full saturation and half lightness, then its
/// own luma is removed so a tint shifts chroma without changing brightness.
pub fn wheel_offsets(wheels: &settings::ColorWheels) -> [Rgb; 3] {
    wheels.bands().map(|w| {
        if w.is_neutral() {
            return [0.0; 3];
        }
        let hue = hsl_to_rgb([w.hue / 360.0, 1.0, 0.5]);
        let y = luma(hue);
        let lum = w.luminance * WHEEL_STRENGTH;
        hue.map(|v| (v - y) * w.saturation * WHEEL_STRENGTH + lum)
    })
}

/// Shadows/midtones/highlights color balance.
pub struct ColorWheels;

impl PixelStage for ColorWheels {
    fn name(&self) -> &'static str {
        "color_wheels"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.wheels_active()
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let w = band_weights(luma(c));
        let o = &params.wheel_offsets;
        [
            c[0] + w[0] * o[0][0] + w[1] * o[1][0] + w[2] * o[2][0],
            c[1] + w[0] * o[0][1] + w[1] * o[1][1] + w[2] * o[2][1],
            c[2] + w[0] * o[0][2] + w[1] * o[1][2] + w[2] * o[2][2],
        ]
    }
}
