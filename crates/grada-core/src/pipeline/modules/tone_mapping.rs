use crate::color::Rgb;
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};
use crate::settings::ToneMapAlgorithm;

// ACES filmic fit (Narkowicz).
const ACES_A: f32 = 2.51;
const ACES_B: f32 = 0.03;
const ACES_C: f32 = 2.43;
const ACES_D: f32 = 0.59;
const ACES_E: f32 = 0.14;

// Uncharted 2 filmic curve (Hable).
const U2_A: f32 = 0.15;
const U2_B: f32 = 0.50;
const U2_C: f32 = 0.10;
const U2_D: f32 = 0.20;
const U2_E: f32 = 0.02;
const U2_F: f32 = 0.30;

/// Hable's partial curve. Evaluated at the white point to normalize.
pub fn uncharted2_curve(x: f32) -> f32 {
    ((x * (U2_A * x + U2_C * U2_B) + U2_D * U2_E) / (x * (U2_A * x + U2_B) + U2_D * U2_F))
        - U2_E / U2_F
}

fn reinhard(c: f32, white_point: f32) -> f32 {
    c / (1.0 + c / (white_point * white_point))
}

fn aces(c: f32) -> f32 {
    ((c * (ACES_A * c + ACES_B)) / (c * (ACES_C * c + ACES_D) + ACES_E)).clamp(0.0, 1.0)
}

/// Pre-gain by `2^exposure`, then the selected operator. Linear only
/// applies the gain.
pub struct ToneMap;

impl PixelStage for ToneMap {
    fn name(&self) -> &'static str {
        "tone_map"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.tone_map.algorithm != ToneMapAlgorithm::Linear || params.tone_map.gain != 1.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let tm = &params.tone_map;
        c.map(|v| {
            let v = v * tm.gain;
            match tm.algorithm {
                ToneMapAlgorithm::Linear => v,
                ToneMapAlgorithm::Reinhard => reinhard(v.max(0.0), tm.white_point),
                ToneMapAlgorithm::Aces => aces(v.max(0.0)),
                ToneMapAlgorithm::Uncharted2 => uncharted2_curve(v.max(0.0)) * tm.white_scale,
            }
        })
    }
}
