use crate::color::{Rgb, mix};
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// Trilinear 3-D LUT lookup blended with the input by `intensity`.
pub struct LutBlend;

impl PixelStage for LutBlend {
    fn name(&self) -> &'static str {
        "lut"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.lut.is_some()
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let Some(lut) = &params.lut else {
            return c;
        };
        let graded = lut.sample(c);
        let t = params.lut_intensity;
        [
            mix(c[0], graded[0], t),
            mix(c[1], graded[1], t),
            mix(c[2], graded[2], t),
        ]
    }
}
