use crate::color::Rgb;
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};
use crate::settings::NEUTRAL_TEMPERATURE;

/// Channel shift per unit of normalized temperature or tint.
const SHIFT_SCALE: f32 = 0.1;

/// Kelvin span mapped to a full-strength shift above and below neutral.
const WARM_SPAN: f32 = 4500.0;
const COOL_SPAN: f32 = 3500.0;

/// Approximate black-body correction followed by a green/magenta tint.
///
/// A warm setting adds to red and takes from blue; a cool setting does the
/// reverse. Tint adds to green and takes half as much from red and blue.
pub struct WhiteBalance;

/// `(temperature_shift, tint_shift)` for a Kelvin value and a tint in
/// [-100, 100]. Both are zero at neutral.
pub fn white_balance_shifts(temperature: f32, tint: f32) -> (f32, f32) {
    let delta = temperature - NEUTRAL_TEMPERATURE;
    let k = if delta >= 0.0 {
        delta / WARM_SPAN
    } else {
        delta / COOL_SPAN
    };
    (k * SHIFT_SCALE, tint / 100.0 * SHIFT_SCALE)
}

impl PixelStage for WhiteBalance {
    fn name(&self) -> &'static str {
        "white_balance"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.temperature_shift != 0.0 || params.tint_shift != 0.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let k = params.temperature_shift;
        let t = params.tint_shift;
        [c[0] + k - t * 0.5, c[1] + t, c[2] - k - t * 0.5]
    }
}
