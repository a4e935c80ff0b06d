use bytemuck::{Pod, Zeroable};
use grada_core::pipeline::KernelParams;

/// Uniform block for `grade.wgsl`. Every member is a 16-byte vector so the
/// Rust and WGSL layouts agree without manual padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct KernelUniforms {
    /// exposure gain, temperature shift, tint shift, contrast
    pub basic0: [f32; 4],
    /// hue shift (turns), saturation, lightness, shadows
    pub basic1: [f32; 4],
    /// highlights, whites, blacks, vibrance
    pub basic2: [f32; 4],
    /// clarity, dehaze, LUT intensity, unused
    pub presence: [f32; 4],
    /// amount, midpoint, feather, vertical squash
    pub vignette: [f32; 4],
    /// gain, white point, Uncharted2 white scale, unused
    pub tone_map: [f32; 4],
    pub wheel_shadows: [f32; 4],
    pub wheel_midtones: [f32; 4],
    pub wheel_highlights: [f32; 4],
    /// width, height, unused, unused
    pub size: [f32; 4],
    /// active stage mask, tone-map algorithm, LUT edge length, unused
    pub flags: [u32; 4],
}

impl KernelUniforms {
    pub fn from_params(p: &KernelParams, stage_mask: u32) -> Self {
        let wheel = |i: usize| {
            let o = p.wheel_offsets[i];
            [o[0], o[1], o[2], 0.0]
        };
        let lut_size = p.lut.as_ref().map_or(0, |l| l.size() as u32);
        Self {
            basic0: [p.exposure_gain, p.temperature_shift, p.tint_shift, p.contrast],
            basic1: [p.hue_shift, p.saturation, p.lightness, p.shadows],
            basic2: [p.highlights, p.whites, p.blacks, p.vibrance],
            presence: [p.clarity, p.dehaze, p.lut_intensity, 0.0],
            vignette: [
                p.vignette.amount,
                p.vignette.midpoint,
                p.vignette.feather,
                p.vignette.squash,
            ],
            tone_map: [
                p.tone_map.gain,
                p.tone_map.white_point,
                p.tone_map.white_scale,
                0.0,
            ],
            wheel_shadows: wheel(0),
            wheel_midtones: wheel(1),
            wheel_highlights: wheel(2),
            size: [p.width as f32, p.height as f32, 0.0, 0.0],
            flags: [stage_mask, p.tone_map.algorithm.code(), lut_size, 0],
        }
    }
}
