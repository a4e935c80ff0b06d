use anyhow::Result;
use rayon::prelude::*;
use tracing::debug;

use crate::backend::{CancelToken, Cancelled, RenderBackend, check_dimensions};
use crate::image_buf::ImageBuf;
use crate::pipeline::{KernelParams, Pipeline};

/// Rows handed to one rayon task. Cancellation is checked per band.
const BAND_ROWS: usize = 16;

/// Scalar kernel on the host, parallel over row bands.
///
/// Every pixel is a pure function of its input and position, so the
/// output is bit-identical to a sequential loop.
pub struct CpuBackend {
    pipeline: Pipeline,
    disposed: bool,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            pipeline: Pipeline::new(),
            disposed: false,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn render(
        &mut self,
        src: &ImageBuf,
        params: &KernelParams,
        cancel: &CancelToken,
    ) -> Result<ImageBuf> {
        anyhow::ensure!(!self.disposed, "cpu backend has been disposed");
        check_dimensions(src, params)?;

        let kernel = self.pipeline.kernel(params);
        if kernel.is_identity() {
            debug!("neutral settings, copying source");
            return Ok(src.clone());
        }

        let width = src.width as usize;
        let stride = width * 4;
        let mut out = src.data.clone();
        if stride == 0 || out.is_empty() {
            return Ok(src.clone());
        }

        out.par_chunks_mut(stride * BAND_ROWS)
            .enumerate()
            .try_for_each(|(band, rows)| {
                if cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                for (row_in_band, row) in rows.chunks_exact_mut(stride).enumerate() {
                    let y = (band * BAND_ROWS + row_in_band) as u32;
                    for (x, px) in row.chunks_exact_mut(4).enumerate() {
                        let shaded = kernel.shade_rgba8([px[0], px[1], px[2], px[3]], x as u32, y);
                        px.copy_from_slice(&shaded);
                    }
                }
                Ok(())
            })?;

        ImageBuf::from_data(src.width, src.height, out)
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
