use crate::color::Rgb;
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// Per-channel recovery: channels below 0.5 are scaled by `1 + shadows`,
/// the rest move toward 1 by `highlights` of their remaining headroom.
pub struct ShadowsHighlights;

impl PixelStage for ShadowsHighlights {
    fn name(&self) -> &'static str {
        "shadows_highlights"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.shadows != 0.0 || params.highlights != 0.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        c.map(|v| {
            if v < 0.5 {
                v * (1.0 + params.shadows)
            } else {
                v + (1.0 - v) * params.highlights
            }
        })
    }
}
