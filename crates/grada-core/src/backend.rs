use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::image_buf::ImageBuf;
use crate::pipeline::KernelParams;

/// Something that can run the grading kernel over a whole image.
///
/// Implementations own whatever resources they need between calls and
/// release them in [`dispose`](RenderBackend::dispose). Renders take
/// `&mut self` because a backend is driven by one caller at a time.
pub trait RenderBackend: Send {
    fn name(&self) -> &'static str;

    /// Grade `src` with `params`, which must have been built for `src`'s
    /// dimensions. Returns a new buffer of the same size. Fails with
    /// [`Cancelled`] if `cancel` fires before the image is complete.
    fn render(&mut self, src: &ImageBuf, params: &KernelParams, cancel: &CancelToken)
    -> Result<ImageBuf>;

    /// Release held resources. Rendering after this is an error.
    fn dispose(&mut self) {}
}

/// Returned (inside `anyhow::Error`) when a render stops early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("render cancelled")]
pub struct Cancelled;

/// Shared flag a caller flips to stop an in-flight render.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fail unless `params` was prepared for `src`.
pub fn check_dimensions(src: &ImageBuf, params: &KernelParams) -> Result<()> {
    anyhow::ensure!(
        params.width == src.width && params.height == src.height,
        "kernel prepared for {}x{} but image is {}x{}",
        params.width,
        params.height,
        src.width,
        src.height
    );
    anyhow::ensure!(src.is_consistent(), "image buffer length does not match dimensions");
    Ok(())
}
