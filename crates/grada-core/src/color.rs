/// An RGB triple in normalized gamma space. Values may leave [0,1] between
/// stages; the kernel only clamps at the very end.
pub type Rgb = [f32; 3];

/// Rec.709 luma of a gamma-encoded triple.
pub fn luma(c: Rgb) -> f32 {
    0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2]
}

/// GLSL-style `mix`.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep between `edge0` and `edge1`.
///
/// Unlike the shading-language builtin this is defined for
/// `edge0 >= edge1` (it degrades to a hard step), so callers need not
/// guard degenerate ranges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span.abs() < 1e-6 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// RGB -> HSL using the 6-sector hue wheel. Hue is returned in turns [0,1).
pub fn rgb_to_hsl(c: Rgb) -> [f32; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    let l = (max + min) * 0.5;
    let delta = max - min;

    if delta < 1e-6 {
        return [0.0, 0.0, l];
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let h = if max == c[0] {
        (c[1] - c[2]) / delta + if c[1] < c[2] { 6.0 } else { 0.0 }
    } else if max == c[1] {
        (c[2] - c[0]) / delta + 2.0
    } else {
        (c[0] - c[1]) / delta + 4.0
    };

    [h / 6.0, s, l]
}

/// HSL -> RGB, inverse of [`rgb_to_hsl`]. Hue in turns.
pub fn hsl_to_rgb(hsl: [f32; 3]) -> Rgb {
    let [h, s, l] = hsl;
    if s <= 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Luminance band weights (shadows, midtones, highlights) for a luma value.
/// The three weights always sum to 1.
pub fn band_weights(y: f32) -> [f32; 3] {
    let y = y.clamp(0.0, 1.0);
    let shadows = 1.0 - smoothstep(0.0, 0.5, y);
    let highlights = smoothstep(0.5, 1.0, y);
    [shadows, 1.0 - shadows - highlights, highlights]
}

/// Quantize a normalized channel to 8 bits with round-to-nearest.
pub fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
