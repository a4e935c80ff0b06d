use crate::color::{Rgb, luma};
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};

/// Clarity followed by dehaze.
///
/// Clarity pushes midtones away from 0.5 with a weight that peaks at
/// mid-gray and falls to zero at black and white. Dehaze is a gain and
/// lift on every channel plus a saturation boost weighted toward shadows.
pub struct Presence;

impl PixelStage for Presence {
    fn name(&self) -> &'static str {
        "presence"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.clarity != 0.0 || params.dehaze != 0.0
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let c = clarity(c, params.clarity);
        dehaze(c, params.dehaze)
    }
}

fn clarity(c: Rgb, amount: f32) -> Rgb {
    if amount == 0.0 {
        return c;
    }
    let lum = luma(c);
    let mid = 1.0 - (2.0 * (lum - 0.5)).abs().min(1.0);
    let adj = (lum - 0.5) * amount * mid * 0.3;
    c.map(|v| v + adj)
}

fn dehaze(c: Rgb, amount: f32) -> Rgb {
    if amount == 0.0 {
        return c;
    }
    let lum = luma(c);
    let gain = 1.0 + 0.15 * amount;
    let lift = -0.02 * amount;
    let c = c.map(|v| (v * gain + lift).max(0.0));
    let boost = 1.0 + 0.3 * amount * (1.0 - lum).max(0.0);
    let y = luma(c);
    c.map(|v| y + (v - y) * boost)
}
