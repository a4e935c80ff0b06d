use anyhow::{Result, ensure};

use crate::color::Rgb;

/// Smallest and largest supported cube edge.
pub const MIN_LUT_SIZE: usize = 2;
pub const MAX_LUT_SIZE: usize = 128;

/// A 3-D color lookup table of `size^3` RGB entries.
///
/// Storage order is red-fastest, then green, then blue:
/// `index = b * size^2 + g * size + r`. Viewed as a 2-D strip, that is
/// `size` slices (one per blue level) of `size x size` (red across, green
/// down) laid side by side, which is exactly how the GPU backend uploads it.
#[derive(Clone, Debug, PartialEq)]
pub struct Lut3d {
    size: usize,
    data: Vec<Rgb>,
    fingerprint: [u8; 32],
}

impl Lut3d {
    pub fn from_data(size: usize, data: Vec<Rgb>) -> Result<Self> {
        ensure!(
            (MIN_LUT_SIZE..=MAX_LUT_SIZE).contains(&size),
            "LUT size {size} outside supported range {MIN_LUT_SIZE}..={MAX_LUT_SIZE}"
        );
        let expected = size * size * size;
        ensure!(
            data.len() == expected,
            "expected {expected} entries for a {size}^3 LUT, got {}",
            data.len()
        );
        ensure!(
            data.iter().flatten().all(|v| v.is_finite()),
            "LUT contains non-finite values"
        );
        let fingerprint = fingerprint(size, &data);
        Ok(Self {
            size,
            data,
            fingerprint,
        })
    }

    /// Build a table by evaluating `f` at every lattice point.
    pub fn from_fn(size: usize, f: impl Fn(Rgb) -> Rgb) -> Result<Self> {
        let scale = 1.0 / (size.max(2) - 1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    data.push(f([r as f32 * scale, g as f32 * scale, b as f32 * scale]));
                }
            }
        }
        Self::from_data(size, data)
    }

    pub fn identity(size: usize) -> Result<Self> {
        Self::from_fn(size, |c| c)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn data(&self) -> &[Rgb] {
        &self.data
    }

    /// Content hash, stable across processes. Lets a GPU backend skip
    /// re-uploading a table it already holds.
    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    fn at(&self, r: usize, g: usize, b: usize) -> Rgb {
        self.data[(b * self.size + g) * self.size + r]
    }

    /// Trilinear lookup. Input is clamped to [0,1].
    ///
    /// Interpolates bilinearly on red/green inside the two blue slices that
    /// bracket the input, then linearly between the slices.
    pub fn sample(&self, c: Rgb) -> Rgb {
        let max = (self.size - 1) as f32;
        let rf = c[0].clamp(0.0, 1.0) * max;
        let gf = c[1].clamp(0.0, 1.0) * max;
        let bf = c[2].clamp(0.0, 1.0) * max;

        let r0 = rf.floor() as usize;
        let g0 = gf.floor() as usize;
        let b0 = bf.floor() as usize;
        let r1 = (r0 + 1).min(self.size - 1);
        let g1 = (g0 + 1).min(self.size - 1);
        let b1 = (b0 + 1).min(self.size - 1);
        let tr = rf - r0 as f32;
        let tg = gf - g0 as f32;
        let tb = bf - b0 as f32;

        let slice = |b: usize| -> Rgb {
            let c00 = self.at(r0, g0, b);
            let c10 = self.at(r1, g0, b);
            let c01 = self.at(r0, g1, b);
            let c11 = self.at(r1, g1, b);
            let mut out = [0.0; 3];
            for ch in 0..3 {
                let top = c00[ch] + (c10[ch] - c00[ch]) * tr;
                let bottom = c01[ch] + (c11[ch] - c01[ch]) * tr;
                out[ch] = top + (bottom - top) * tg;
            }
            out
        };

        let lo = slice(b0);
        let hi = slice(b1);
        [
            lo[0] + (hi[0] - lo[0]) * tb,
            lo[1] + (hi[1] - lo[1]) * tb,
            lo[2] + (hi[2] - lo[2]) * tb,
        ]
    }

    /// Flatten into a `(size*size) x size` RGBA f32 strip, row-major.
    pub fn to_strip_rgba(&self) -> Vec<f32> {
        let n = self.size;
        let mut out = Vec::with_capacity(n * n * n * 4);
        for g in 0..n {
            for b in 0..n {
                for r in 0..n {
                    let c = self.at(r, g, b);
                    out.extend_from_slice(&[c[0], c[1], c[2], 1.0]);
                }
            }
        }
        out
    }
}

fn fingerprint(size: usize, data: &[Rgb]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(size as u64).to_le_bytes());
    for c in data {
        for v in c {
            hasher.update(&v.to_le_bytes());
        }
    }
    *hasher.finalize().as_bytes()
}
