/// 8-bit RGBA image buffer.
///
/// Pixel data is interleaved RGBARGBA... in gamma-encoded (display) space,
/// the same layout browsers and most decoders hand out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBuf {
    pub width: u32,
    pub height: u32,
    /// Flat pixel data: [R, G, B, A, R, G, B, A, ...].
    pub data: Vec<u8>,
}

impl ImageBuf {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(
            data.len() == expected,
            "expected {expected} bytes for {width}x{height} RGBA, got {}",
            data.len()
        );
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A uniformly filled image.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer length agrees with the dimensions.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.pixel_count() * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Bilinear resample to exactly `new_w` x `new_h`. All four channels
    /// are filtered. Returns a clone when the size is unchanged.
    pub fn resize_bilinear(&self, new_w: u32, new_h: u32) -> Self {
        let new_w = new_w.max(1);
        let new_h = new_h.max(1);
        if new_w == self.width && new_h == self.height {
            return self.clone();
        }
        if self.width == 0 || self.height == 0 {
            return Self::new(new_w, new_h);
        }

        let sx = self.width as f32 / new_w as f32;
        let sy = self.height as f32 / new_h as f32;
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let stride = self.width as usize * 4;

        let mut data = Vec::with_capacity(new_w as usize * new_h as usize * 4);
        for dst_y in 0..new_h {
            // Pixel-center alignment, same convention as texture sampling.
            let fy = ((dst_y as f32 + 0.5) * sy - 0.5).clamp(0.0, max_y);
            let y0 = fy.floor() as usize;
            let y1 = (y0 + 1).min(self.height as usize - 1);
            let ty = fy - y0 as f32;

            for dst_x in 0..new_w {
                let fx = ((dst_x as f32 + 0.5) * sx - 0.5).clamp(0.0, max_x);
                let x0 = fx.floor() as usize;
                let x1 = (x0 + 1).min(self.width as usize - 1);
                let tx = fx - x0 as f32;

                let i00 = y0 * stride + x0 * 4;
                let i10 = y0 * stride + x1 * 4;
                let i01 = y1 * stride + x0 * 4;
                let i11 = y1 * stride + x1 * 4;

                for ch in 0..4 {
                    let top = self.data[i00 + ch] as f32 * (1.0 - tx) + self.data[i10 + ch] as f32 * tx;
                    let bottom =
                        self.data[i01 + ch] as f32 * (1.0 - tx) + self.data[i11 + ch] as f32 * tx;
                    let v = top * (1.0 - ty) + bottom * ty;
                    data.push(v.round().clamp(0.0, 255.0) as u8);
                }
            }
        }

        Self {
            width: new_w,
            height: new_h,
            data,
        }
    }

    /// Bilinear rescale by a uniform factor, keeping at least one pixel per axis.
    pub fn scaled(&self, factor: f32) -> Self {
        let new_w = (self.width as f32 * factor).round().max(1.0) as u32;
        let new_h = (self.height as f32 * factor).round().max(1.0) as u32;
        self.resize_bilinear(new_w, new_h)
    }

    /// Mean absolute per-channel difference over RGB, in 8-bit units.
    /// Alpha is ignored. Returns `None` when the dimensions differ.
    pub fn mean_abs_diff(&self, other: &ImageBuf) -> Option<f64> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        if self.pixel_count() == 0 {
            return Some(0.0);
        }
        let mut sum = 0u64;
        for (a, b) in self.data.chunks_exact(4).zip(other.data.chunks_exact(4)) {
            for ch in 0..3 {
                sum += (a[ch] as i32 - b[ch] as i32).unsigned_abs() as u64;
            }
        }
        Some(sum as f64 / (self.pixel_count() * 3) as f64)
    }
}
