use crate::color::Rgb;
use crate::pipeline::KernelParams;

/// Normalized position of the pixel being shaded, at the pixel center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    pub u: f32,
    pub v: f32,
}

impl Fragment {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            u: (x as f32 + 0.5) / width.max(1) as f32,
            v: (y as f32 + 0.5) / height.max(1) as f32,
        }
    }

    pub const CENTER: Self = Self { u: 0.5, v: 0.5 };
}

/// A single per-pixel step of the grading kernel.
///
/// Stages see the previous stage's output and must not clamp; the kernel
/// clamps once after the last stage.
pub trait PixelStage: Send + Sync {
    fn name(&self) -> &'static str;
    /// False when the stage is the identity for these parameters. Inactive
    /// stages are skipped entirely.
    fn is_active(&self, params: &KernelParams) -> bool;
    fn apply(&self, c: Rgb, frag: Fragment, params: &KernelParams) -> Rgb;
}
