use crate::color::Rgb;
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// `c *= 2^exposure`. The gain is precomputed in [`KernelParams`].
pub struct Exposure;

impl PixelStage for Exposure {
    fn name(&self) -> &'static str {
        "exposure"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.exposure_gain != 1.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let g = params.exposure_gain;
        [c[0] * g, c[1] * g, c[2] * g]
    }
}
