use crate::color::{Rgb, band_weights, luma};
use crate::pipeline::KernelParams;
use crate::pipeline::module::{Fragment, PixelStage};
use crate::settings::{self, Curve};

/// Entries per baked band curve.
pub const CURVE_TABLE_SIZE: usize = 256;

/// The three band curves sampled at `CURVE_TABLE_SIZE` evenly spaced inputs.
///
/// Entry `i` holds (shadows, midtones, highlights) at `x = i / 255`. The
/// GPU uploads the same entries as a 256x1 texture, one band per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveTable {
    entries: Vec<[f32; 3]>,
}

impl CurveTable {
    pub fn bake(curve: &settings::ToneCurve) -> Self {
        let bands = curve.bands().map(bake_band);
        let entries = (0..CURVE_TABLE_SIZE)
            .map(|i| [bands[0][i], bands[1][i], bands[2][i]])
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[[f32; 3]] {
        &self.entries
    }

    /// Evaluate one band at `v`. Inputs outside [0,1] keep the offset the
    /// curve applies at the nearest end, so an identity band stays identity.
    pub fn eval(&self, band: usize, v: f32) -> f32 {
        let x = v.clamp(0.0, 1.0);
        let idx_f = x * (CURVE_TABLE_SIZE - 1) as f32;
        let i0 = (idx_f as usize).min(CURVE_TABLE_SIZE - 2);
        let frac = idx_f - i0 as f32;
        let y = self.entries[i0][band] * (1.0 - frac) + self.entries[i0 + 1][band] * frac;
        v + (y - x)
    }
}

// ── Monotone cubic ───────────────────────────────────────────────────────
//
// Fritsch-Carlson: secant slopes, averaged tangents zeroed at local
// extrema, then rescaled wherever alpha^2 + beta^2 > 9. The result never
// overshoots between control points.

fn tangents(xs: &[f32], ys: &[f32]) -> Vec<f32> {
    let n = xs.len();
    let secants: Vec<f32> = (0..n - 1)
        .map(|k| (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]))
        .collect();

    let mut m = vec![0.0_f32; n];
    m[0] = secants[0];
    m[n - 1] = secants[n - 2];
    for k in 1..n - 1 {
        let (a, b) = (secants[k - 1], secants[k]);
        m[k] = if a * b <= 0.0 { 0.0 } else { (a + b) * 0.5 };
    }

    for k in 0..n - 1 {
        let d = secants[k];
        if d == 0.0 {
            m[k] = 0.0;
            m[k + 1] = 0.0;
            continue;
        }
        let alpha = m[k] / d;
        let beta = m[k + 1] / d;
        let s = alpha * alpha + beta * beta;
        if s > 9.0 {
            let tau = 3.0 / s.sqrt();
            m[k] = tau * alpha * d;
            m[k + 1] = tau * beta * d;
        }
    }
    m
}

fn bake_band(curve: &Curve) -> Vec<f32> {
    let xs: Vec<f32> = curve.points().iter().map(|p| p.x).collect();
    let ys: Vec<f32> = curve.points().iter().map(|p| p.y).collect();
    let n = xs.len();
    if n < 2 {
        return (0..CURVE_TABLE_SIZE)
            .map(|i| i as f32 / (CURVE_TABLE_SIZE - 1) as f32)
            .collect();
    }
    let m = tangents(&xs, &ys);

    (0..CURVE_TABLE_SIZE)
        .map(|i| {
            let x = i as f32 / (CURVE_TABLE_SIZE - 1) as f32;
            if x <= xs[0] {
                return ys[0];
            }
            if x >= xs[n - 1] {
                return ys[n - 1];
            }
            let k = xs.partition_point(|&p| p <= x).saturating_sub(1).min(n - 2);
            let h = xs[k + 1] - xs[k];
            let t = (x - xs[k]) / h;
            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            let y = h00 * ys[k] + h10 * h * m[k] + h01 * ys[k + 1] + h11 * h * m[k + 1];
            y.clamp(0.0, 1.0)
        })
        .collect()
}

/// Per-channel band curves, blended by the pixel's luminance band weights.
pub struct ToneCurve;

impl PixelStage for ToneCurve {
    fn name(&self) -> &'static str {
        "tone_curve"
    }

    fn is_active(&self, params: &KernelParams) -> bool {
        params.curves.is_some()
    }

    fn apply(&self, c: Rgb, _frag: Fragment, params: &KernelParams) -> Rgb {
        let Some(table) = &params.curves else {
            return c;
        };
        let w = band_weights(luma(c));
        c.map(|v| {
            w[0] * table.eval(0, v) + w[1] * table.eval(1, v) + w[2] * table.eval(2, v)
        })
    }
}
