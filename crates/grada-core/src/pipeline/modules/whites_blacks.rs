use crate::color::Rgb;
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

const WHITES_FROM: f32 = 0.8;
const BLACKS_BELOW: f32 = 0.2;

/// End-point adjustment: channels above 0.8 move within their headroom by
/// `whites`, channels below 0.2 are scaled by `1 + blacks`.
pub struct WhitesBlacks;

impl PixelStage for WhitesBlacks {
    fn name(&self) -> &'static str {
        "whites_blacks"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.whites != 0.0 || params.blacks != 0.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        c.map(|v| {
            if v > WHITES_FROM {
                v + (1.0 - v) * params.whites
            } else if v < BLACKS_BELOW {
                v * (1.0 + params.blacks)
            } else {
                v
            }
        })
    }
}
