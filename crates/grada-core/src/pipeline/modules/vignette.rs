use crate::color::{Rgb, mix, smoothstep};
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// Vertical scale for the centered coordinate. At roundness 0 the falloff
/// is a circle in pixels; at 1 it stretches to the frame's aspect.
pub fn vignette_squash(roundness: f32, width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    mix(height as f32 / width as f32, 1.0, roundness)
}

/// Radial darkening: a smoothstep from `midpoint` to `midpoint + feather`
/// over the distance from the frame center (1.0 at the edge midpoints).
pub struct Vignette;

impl PixelStage for Vignette {
    fn name(&self) -> &'static str {
        "vignette"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.vignette.amount != 0.0
    }

    fn apply(&self, c: Rgb, frag: Fragment, params: &KernelParams) -> Rgb {
        let v = &params.vignette;
        let dx = frag.u - 0.5;
        let dy = (frag.v - 0.5) * v.squash;
        let d = 2.0 * (dx * dx + dy * dy).sqrt();
        let factor = 1.0 - smoothstep(v.midpoint, v.midpoint + v.feather, d) * v.amount;
        c.map(|ch| ch * factor)
    }
}
