pub mod module;
pub mod modules;

use std::sync::Arc;

use tracing::debug;

use crate::color::{Rgb, to_u8};
use crate::lut::Lut3d;
use crate::settings::{ColorGradingSettings, ToneMapAlgorithm};
use module::{Fragment, PixelStage};
use modules::{CurveTable, uncharted2_curve, vignette_squash, wheel_offsets, white_balance_shifts};

/// Derived vignette constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VignetteParams {
    pub amount: f32,
    pub midpoint: f32,
    /// Falloff width, never below the degenerate-range guard.
    pub feather: f32,
    /// Vertical scale applied to the centered coordinate.
    pub squash: f32,
}

/// Derived tone-mapping constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneMapParams {
    pub algorithm: ToneMapAlgorithm,
    /// `2^exposure`, applied before the operator.
    pub gain: f32,
    pub white_point: f32,
    /// `1 / uncharted2(white_point)`.
    pub white_scale: f32,
}

/// Everything the kernel needs, precomputed once per render.
///
/// Built from sanitized settings, so every field is inside its declared
/// range. Both backends shade from this one value: the CPU reads it
/// directly and the GPU packs it into its uniform block.
#[derive(Clone, Debug)]
pub struct KernelParams {
    pub width: u32,
    pub height: u32,
    pub exposure_gain: f32,
    pub temperature_shift: f32,
    pub tint_shift: f32,
    pub contrast: f32,
    /// Hue rotation in turns.
    pub hue_shift: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub shadows: f32,
    pub highlights: f32,
    pub whites: f32,
    pub blacks: f32,
    /// Baked band curves; `None` when all three are the diagonal.
    pub curves: Option<CurveTable>,
    /// Per-band (shadows, midtones, highlights) RGB offsets.
    pub wheel_offsets: [Rgb; 3],
    pub vibrance: f32,
    pub clarity: f32,
    pub dehaze: f32,
    pub vignette: VignetteParams,
    pub tone_map: ToneMapParams,
    pub lut: Option<Arc<Lut3d>>,
    pub lut_intensity: f32,
}

const MIN_FEATHER: f32 = 1e-3;

impl KernelParams {
    /// Sanitize `settings` and derive the kernel constants for a
    /// `width` x `height` target. `lut` is the table the settings' LUT
    /// reference resolved to, if any.
    pub fn new(
        settings: &ColorGradingSettings,
        width: u32,
        height: u32,
        lut: Option<Arc<Lut3d>>,
    ) -> Self {
        let s = settings.sanitized();
        let (temperature_shift, tint_shift) = white_balance_shifts(s.temperature, s.tint);
        let lut_intensity = s.lut.as_ref().map_or(0.0, |l| l.intensity);
        let lut = lut.filter(|_| lut_intensity > 0.0);

        Self {
            width,
            height,
            exposure_gain: 2.0_f32.powf(s.exposure),
            temperature_shift,
            tint_shift,
            contrast: s.contrast,
            hue_shift: s.hue / 360.0,
            saturation: s.saturation,
            lightness: s.lightness,
            shadows: s.shadows,
            highlights: s.highlights,
            whites: s.whites,
            blacks: s.blacks,
            curves: (!s.tone_curve.is_identity()).then(|| CurveTable::bake(&s.tone_curve)),
            wheel_offsets: wheel_offsets(&s.color_wheels),
            vibrance: s.vibrance,
            clarity: s.clarity,
            dehaze: s.dehaze,
            vignette: VignetteParams {
                amount: s.vignette.amount,
                midpoint: s.vignette.midpoint,
                feather: s.vignette.feather.max(MIN_FEATHER),
                squash: vignette_squash(s.vignette.roundness, width, height),
            },
            tone_map: ToneMapParams {
                algorithm: s.tone_mapping.algorithm,
                gain: 2.0_f32.powf(s.tone_mapping.exposure),
                white_point: s.tone_mapping.white_point,
                white_scale: 1.0 / uncharted2_curve(s.tone_mapping.white_point),
            },
            lut,
            lut_intensity,
        }
    }

    pub fn wheels_active(&self) -> bool {
        self.wheel_offsets.iter().flatten().any(|v| *v != 0.0)
    }
}

/// The ordered list of kernel stages.
///
/// ```text
/// Exposure -> WB -> Contrast -> HSL -> Shadows/Highlights -> Whites/Blacks
///   -> Tone curve -> Color wheels -> Vibrance -> Presence -> Vignette
///   -> Tone map -> LUT -> clamp
/// ```
///
/// The GPU fragment shader runs the same steps in the same order.
pub struct Pipeline {
    stages: Vec<Box<dyn PixelStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            stages: vec![
                Box::new(modules::Exposure),
                Box::new(modules::WhiteBalance),
                Box::new(modules::Contrast),
                Box::new(modules::Hsl),
                Box::new(modules::ShadowsHighlights),
                Box::new(modules::WhitesBlacks),
                Box::new(modules::ToneCurve),
                Box::new(modules::ColorWheels),
                Box::new(modules::Vibrance),
                Box::new(modules::Presence),
                Box::new(modules::Vignette),
                Box::new(modules::ToneMap),
                Box::new(modules::LutBlend),
            ],
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Bit `i` is set when stage `i` (in [`stage_names`](Self::stage_names)
    /// order) is active for `params`. The GPU shader gates its steps on
    /// the same bits.
    pub fn stage_mask(&self, params: &KernelParams) -> u32 {
        self.stages
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active(params))
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }

    /// Select the stages that are active for `params`.
    pub fn kernel<'a>(&'a self, params: &'a KernelParams) -> Kernel<'a> {
        let active: Vec<&dyn PixelStage> = self
            .stages
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| s.is_active(params))
            .collect();
        debug!(
            stages = ?active.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "prepared kernel"
        );
        Kernel { params, active }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipeline bound to one set of parameters, ready to shade pixels.
pub struct Kernel<'a> {
    params: &'a KernelParams,
    active: Vec<&'a dyn PixelStage>,
}

impl Kernel<'_> {
    pub fn params(&self) -> &KernelParams {
        self.params
    }

    pub fn active_stages(&self) -> Vec<&'static str> {
        self.active.iter().map(|s| s.name()).collect()
    }

    pub fn is_identity(&self) -> bool {
        self.active.is_empty()
    }

    /// Run every active stage on one pixel. No clamping.
    pub fn shade(&self, c: Rgb, frag: Fragment) -> Rgb {
        self.active
            .iter()
            .fold(c, |acc, stage| stage.apply(acc, frag, self.params))
    }

    /// Shade an 8-bit RGBA pixel at (x, y): normalize, shade, clamp and
    /// quantize. Alpha passes through.
    pub fn shade_rgba8(&self, px: [u8; 4], x: u32, y: u32) -> [u8; 4] {
        let c = [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        ];
        let frag = Fragment::new(x, y, self.params.width, self.params.height);
        let out = self.shade(c, frag);
        [to_u8(out[0]), to_u8(out[1]), to_u8(out[2]), px[3]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ToneMapping, Vignette};

    fn params(settings: &ColorGradingSettings) -> KernelParams {
        KernelParams::new(settings, 4, 4, None)
    }

    #[test]
    fn module_ordering() {
        let pipeline = Pipeline::new();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "exposure",
                "white_balance",
                "contrast",
                "hsl",
                "shadows_highlights",
                "whites_blacks",
                "tone_curve",
                "color_wheels",
                "vibrance",
                "presence",
                "vignette",
                "tone_map",
                "lut",
            ]
        );
    }

    #[test]
    fn default_settings_activate_nothing() {
        let pipeline = Pipeline::new();
        let p = params(&ColorGradingSettings::default());
        let kernel = pipeline.kernel(&p);
        assert!(kernel.is_identity(), "active: {:?}", kernel.active_stages());
    }

    #[test]
    fn default_settings_are_identity_for_every_byte() {
        let pipeline = Pipeline::new();
        let p = params(&ColorGradingSettings::default());
        let kernel = pipeline.kernel(&p);
        for v in 0..=255u8 {
            let px = [v, 255 - v, v / 2, 77];
            assert_eq!(kernel.shade_rgba8(px, 1, 2), px);
        }
    }

    #[test]
    fn half_stop_down_halves_white() {
        let pipeline = Pipeline::new();
        let p = params(&ColorGradingSettings {
            exposure: -1.0,
            ..Default::default()
        });
        let kernel = pipeline.kernel(&p);
        assert_eq!(kernel.active_stages(), vec!["exposure"]);
        assert_eq!(kernel.shade_rgba8([255, 255, 255, 255], 0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn stage_mask_follows_order() {
        let pipeline = Pipeline::new();
        let p = params(&ColorGradingSettings::default());
        assert_eq!(pipeline.stage_mask(&p), 0);

        let p = params(&ColorGradingSettings {
            exposure: 1.0,
            contrast: 0.1,
            vignette: Vignette {
                amount: 0.5,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(pipeline.stage_mask(&p), (1 << 0) | (1 << 2) | (1 << 10));
    }

    #[test]
    fn out_of_range_settings_are_clamped_not_rejected() {
        let p = params(&ColorGradingSettings {
            exposure: 999.0,
            ..Default::default()
        });
        assert_eq!(p.exposure_gain, 32.0);
    }

    #[test]
    fn stages_run_in_order() {
        // Exposure before contrast: 0.25 * 2 = 0.5 sits on the contrast
        // pivot, so a huge contrast leaves it unchanged.
        let pipeline = Pipeline::new();
        let p = params(&ColorGradingSettings {
            exposure: 1.0,
            contrast: 1.0,
            ..Default::default()
        });
        let out = pipeline.kernel(&p).shade([0.25, 0.25, 0.25], Fragment::CENTER);
        for v in out {
            assert!((v - 0.5).abs() < 1e-6, "got {v}");
        }
    }

    #[test]
    fn alpha_passes_through() {
        let pipeline = Pipeline::new();
        let p = params(&ColorGradingSettings {
            exposure: 1.0,
            contrast: 0.4,
            vignette: Vignette {
                amount: 1.0,
                ..Default::default()
            },
            tone_mapping: ToneMapping {
                algorithm: ToneMapAlgorithm::Aces,
                ..Default::default()
            },
            ..Default::default()
        });
        let kernel = pipeline.kernel(&p);
        for a in [0u8, 1, 128, 255] {
            assert_eq!(kernel.shade_rgba8([90, 120, 200, a], 3, 0)[3], a);
        }
    }

    #[test]
    fn extreme_settings_stay_finite() {
        let pipeline = Pipeline::new();
        let p = params(&ColorGradingSettings {
            exposure: 5.0,
            contrast: 1.0,
            highlights: 1.0,
            shadows: -1.0,
            whites: 1.0,
            blacks: -1.0,
            temperature: 10000.0,
            tint: -100.0,
            vibrance: 1.0,
            saturation: 1.0,
            hue: 180.0,
            lightness: 1.0,
            clarity: 1.0,
            dehaze: 1.0,
            ..Default::default()
        });
        let kernel = pipeline.kernel(&p);
        for c in [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.9, 0.1, 0.4]] {
            let out = kernel.shade(c, Fragment::CENTER);
            assert!(out.iter().all(|v| v.is_finite()), "{c:?} -> {out:?}");
        }
    }

    #[test]
    fn lut_dropped_when_intensity_is_zero() {
        let lut = Arc::new(Lut3d::identity(4).unwrap());
        let settings = ColorGradingSettings {
            lut: Some(crate::settings::LutSettings::new("id", 0.0)),
            ..Default::default()
        };
        let p = KernelParams::new(&settings, 1, 1, Some(lut));
        assert!(p.lut.is_none());
    }
}
