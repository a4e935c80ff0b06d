use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, Serialize};

/// Declared ranges for every numeric setting. Values outside these are
/// clamped silently by [`ColorGradingSettings::sanitized`].
pub mod ranges {
    use std::ops::RangeInclusive;

    pub const EXPOSURE: RangeInclusive<f32> = -5.0..=5.0;
    pub const UNIT_SIGNED: RangeInclusive<f32> = -1.0..=1.0;
    pub const UNIT: RangeInclusive<f32> = 0.0..=1.0;
    pub const TEMPERATURE: RangeInclusive<f32> = 2000.0..=10000.0;
    pub const TINT: RangeInclusive<f32> = -100.0..=100.0;
    pub const HUE: RangeInclusive<f32> = -180.0..=180.0;
    pub const WHEEL_HUE: RangeInclusive<f32> = 0.0..=360.0;
    pub const TONE_MAP_EXPOSURE: RangeInclusive<f32> = -5.0..=5.0;
    pub const WHITE_POINT: RangeInclusive<f32> = 0.1..=20.0;
}

/// Neutral white balance, in Kelvin.
pub const NEUTRAL_TEMPERATURE: f32 = 5500.0;

fn clamp_to(v: f32, range: RangeInclusive<f32>, fallback: f32) -> f32 {
    if v.is_nan() {
        fallback
    } else {
        v.clamp(*range.start(), *range.end())
    }
}

// ── Tone curve ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Control points of one band curve, always sorted by ascending `x`.
///
/// The only ways to change the points are the order-preserving edits
/// below, so the ordering cannot be broken from outside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurvePoint>", into = "Vec<CurvePoint>")]
pub struct Curve {
    points: Vec<CurvePoint>,
}

/// Minimum horizontal gap kept between neighbouring points.
const MIN_POINT_GAP: f32 = 1e-3;

impl Curve {
    /// The identity diagonal: (0,0) -> (1,1).
    pub fn linear() -> Self {
        Self {
            points: vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(1.0, 1.0)],
        }
    }

    /// Build a curve from arbitrary points: clamps into [0,1], sorts by x,
    /// drops points that collapse onto a neighbour. Fewer than two usable
    /// points yields the identity diagonal.
    pub fn from_points(points: impl IntoIterator<Item = CurvePoint>) -> Self {
        let mut pts: Vec<CurvePoint> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| CurvePoint::new(p.x.clamp(0.0, 1.0), p.y.clamp(0.0, 1.0)))
            .collect();
        pts.sort_by(|a, b| a.x.total_cmp(&b.x));
        pts.dedup_by(|next, prev| next.x - prev.x < MIN_POINT_GAP);
        if pts.len() < 2 {
            return Self::linear();
        }
        Self { points: pts }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when every point lies on the diagonal.
    pub fn is_identity(&self) -> bool {
        self.points.iter().all(|p| (p.x - p.y).abs() < 1e-6)
    }

    /// Insert a point at its sorted position. Returns its index, or `None`
    /// if it would sit on top of an existing point.
    pub fn insert(&mut self, point: CurvePoint) -> Option<usize> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        let p = CurvePoint::new(point.x.clamp(0.0, 1.0), point.y.clamp(0.0, 1.0));
        let idx = self.points.partition_point(|q| q.x < p.x);
        let too_close = |i: usize| {
            self.points
                .get(i)
                .is_some_and(|q| (q.x - p.x).abs() < MIN_POINT_GAP)
        };
        if too_close(idx) || (idx > 0 && too_close(idx - 1)) {
            return None;
        }
        self.points.insert(idx, p);
        Some(idx)
    }

    /// Move a point. Its x is confined strictly between its neighbours and
    /// the two endpoints keep their x, so ordering is preserved.
    pub fn move_point(&mut self, index: usize, to: CurvePoint) -> bool {
        let len = self.points.len();
        if index >= len || !to.x.is_finite() || !to.y.is_finite() {
            return false;
        }
        let x = if index == 0 || index == len - 1 {
            self.points[index].x
        } else {
            let lo = self.points[index - 1].x + MIN_POINT_GAP;
            let hi = self.points[index + 1].x - MIN_POINT_GAP;
            to.x.clamp(lo, hi.max(lo))
        };
        self.points[index] = CurvePoint::new(x, to.y.clamp(0.0, 1.0));
        true
    }

    /// Remove an interior point. Endpoints cannot be removed.
    pub fn remove(&mut self, index: usize) -> Option<CurvePoint> {
        if index == 0 || index + 1 >= self.points.len() {
            return None;
        }
        Some(self.points.remove(index))
    }

    fn sanitized(&self) -> Self {
        Self::from_points(self.points.iter().copied())
    }
}

impl From<Vec<CurvePoint>> for Curve {
    fn from(points: Vec<CurvePoint>) -> Self {
        Self::from_points(points)
    }
}

impl From<Curve> for Vec<CurvePoint> {
    fn from(curve: Curve) -> Self {
        curve.points
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::linear()
    }
}

/// One curve per luminance band.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneCurve {
    pub shadows: Curve,
    pub midtones: Curve,
    pub highlights: Curve,
}

impl ToneCurve {
    /// Bands in (shadows, midtones, highlights) order.
    pub fn bands(&self) -> [&Curve; 3] {
        [&self.shadows, &self.midtones, &self.highlights]
    }

    pub fn is_identity(&self) -> bool {
        self.bands().iter().all(|c| c.is_identity())
    }
}

// ── Color wheels ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorWheelSettings {
    /// Tint direction in degrees.
    pub hue: f32,
    /// Tint strength, 0 disables the wheel.
    pub saturation: f32,
    /// Brightness offset for the band.
    pub luminance: f32,
}

impl ColorWheelSettings {
    pub fn is_neutral(&self) -> bool {
        self.saturation == 0.0 && self.luminance == 0.0
    }

    fn sanitized(&self) -> Self {
        Self {
            hue: clamp_to(self.hue, ranges::WHEEL_HUE, 0.0),
            saturation: clamp_to(self.saturation, ranges::UNIT, 0.0),
            luminance: clamp_to(self.luminance, ranges::UNIT_SIGNED, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorWheels {
    pub shadows: ColorWheelSettings,
    pub midtones: ColorWheelSettings,
    pub highlights: ColorWheelSettings,
}

impl ColorWheels {
    pub fn bands(&self) -> [&ColorWheelSettings; 3] {
        [&self.shadows, &self.midtones, &self.highlights]
    }

    pub fn is_neutral(&self) -> bool {
        self.bands().iter().all(|w| w.is_neutral())
    }
}

// ── Vignette ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vignette {
    /// Darkening strength at the periphery; 0 disables.
    pub amount: f32,
    /// Normalized distance from center where falloff begins.
    pub midpoint: f32,
    /// 1 follows the frame's aspect, 0 is a circle.
    pub roundness: f32,
    /// Width of the falloff band beyond `midpoint`.
    pub feather: f32,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            amount: 0.0,
            midpoint: 0.5,
            roundness: 0.5,
            feather: 0.5,
        }
    }
}

impl Vignette {
    fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            amount: clamp_to(self.amount, ranges::UNIT, d.amount),
            midpoint: clamp_to(self.midpoint, ranges::UNIT, d.midpoint),
            roundness: clamp_to(self.roundness, ranges::UNIT, d.roundness),
            feather: clamp_to(self.feather, ranges::UNIT, d.feather),
        }
    }
}

// ── Tone mapping ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMapAlgorithm {
    #[default]
    Linear,
    Reinhard,
    Aces,
    Uncharted2,
}

impl ToneMapAlgorithm {
    /// Numeric code shared with the shader.
    pub fn code(self) -> u32 {
        match self {
            Self::Linear => 0,
            Self::Reinhard => 1,
            Self::Aces => 2,
            Self::Uncharted2 => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToneMapping {
    pub algorithm: ToneMapAlgorithm,
    /// Pre-operator exposure in stops.
    pub exposure: f32,
    pub white_point: f32,
}

impl Default for ToneMapping {
    fn default() -> Self {
        Self {
            algorithm: ToneMapAlgorithm::Linear,
            exposure: 0.0,
            white_point: 11.2,
        }
    }
}

impl ToneMapping {
    fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            algorithm: self.algorithm,
            exposure: clamp_to(self.exposure, ranges::TONE_MAP_EXPOSURE, d.exposure),
            white_point: clamp_to(self.white_point, ranges::WHITE_POINT, d.white_point),
        }
    }
}

// ── LUT reference ────────────────────────────────────────────────────────

/// Reference to a registered 3-D LUT plus its blend strength.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LutSettings {
    /// Registry key of the table.
    pub name: String,
    #[serde(default = "default_lut_intensity")]
    pub intensity: f32,
}

fn default_lut_intensity() -> f32 {
    1.0
}

impl LutSettings {
    pub fn new(name: impl Into<String>, intensity: f32) -> Self {
        Self {
            name: name.into(),
            intensity,
        }
    }
}

// ── Settings ─────────────────────────────────────────────────────────────

/// Every adjustable parameter of one grading operation.
///
/// `Default` is the neutral grade: applying it to any image is the
/// identity transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorGradingSettings {
    /// Exposure compensation in stops.
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    /// White balance color temperature in Kelvin.
    pub temperature: f32,
    /// Green (+) / magenta (-) tint.
    pub tint: f32,
    pub vibrance: f32,
    pub saturation: f32,
    /// Hue rotation in degrees.
    pub hue: f32,
    pub lightness: f32,
    pub clarity: f32,
    pub dehaze: f32,
    pub tone_curve: ToneCurve,
    pub color_wheels: ColorWheels,
    pub vignette: Vignette,
    pub tone_mapping: ToneMapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lut: Option<LutSettings>,
}

impl Default for ColorGradingSettings {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            whites: 0.0,
            blacks: 0.0,
            temperature: NEUTRAL_TEMPERATURE,
            tint: 0.0,
            vibrance: 0.0,
            saturation: 0.0,
            hue: 0.0,
            lightness: 0.0,
            clarity: 0.0,
            dehaze: 0.0,
            tone_curve: ToneCurve::default(),
            color_wheels: ColorWheels::default(),
            vignette: Vignette::default(),
            tone_mapping: ToneMapping::default(),
            lut: None,
        }
    }
}

impl ColorGradingSettings {
    /// Copy with every value clamped into its declared range. NaN falls
    /// back to the neutral value; curve points are re-sorted.
    pub fn sanitized(&self) -> Self {
        let unit = |v: f32| clamp_to(v, ranges::UNIT_SIGNED, 0.0);
        Self {
            exposure: clamp_to(self.exposure, ranges::EXPOSURE, 0.0),
            contrast: unit(self.contrast),
            highlights: unit(self.highlights),
            shadows: unit(self.shadows),
            whites: unit(self.whites),
            blacks: unit(self.blacks),
            temperature: clamp_to(self.temperature, ranges::TEMPERATURE, NEUTRAL_TEMPERATURE),
            tint: clamp_to(self.tint, ranges::TINT, 0.0),
            vibrance: unit(self.vibrance),
            saturation: unit(self.saturation),
            hue: clamp_to(self.hue, ranges::HUE, 0.0),
            lightness: unit(self.lightness),
            clarity: unit(self.clarity),
            dehaze: unit(self.dehaze),
            tone_curve: ToneCurve {
                shadows: self.tone_curve.shadows.sanitized(),
                midtones: self.tone_curve.midtones.sanitized(),
                highlights: self.tone_curve.highlights.sanitized(),
            },
            color_wheels: ColorWheels {
                shadows: self.color_wheels.shadows.sanitized(),
                midtones: self.color_wheels.midtones.sanitized(),
                highlights: self.color_wheels.highlights.sanitized(),
            },
            vignette: self.vignette.sanitized(),
            tone_mapping: self.tone_mapping.sanitized(),
            lut: self.lut.as_ref().map(|l| LutSettings {
                name: l.name.clone(),
                intensity: clamp_to(l.intensity, ranges::UNIT, 1.0),
            }),
        }
    }

    /// Shallow merge: every field present in `patch` replaces the
    /// corresponding field (nested groups are replaced whole).
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut out = self.clone();
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &patch.$field { out.$field = v.clone(); })*
            };
        }
        take!(
            exposure,
            contrast,
            highlights,
            shadows,
            whites,
            blacks,
            temperature,
            tint,
            vibrance,
            saturation,
            hue,
            lightness,
            clarity,
            dehaze,
            tone_curve,
            color_wheels,
            vignette,
            tone_mapping,
        );
        if let Some(lut) = &patch.lut {
            out.lut = lut.clone();
        }
        out
    }
}

/// A partial settings update. Absent fields leave the current value alone.
///
/// `lut` distinguishes "not mentioned" (`None`) from "detach the LUT"
/// (`Some(None)`, JSON `"lut": null`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadows: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whites: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blacks: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lightness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dehaze: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone_curve: Option<ToneCurve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_wheels: Option<ColorWheels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignette: Option<Vignette>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone_mapping: Option<ToneMapping>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub lut: Option<Option<LutSettings>>,
}

/// Any value that was present in the input, including `null`, becomes `Some`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A patch that replaces every field, used when a whole snapshot (e.g. a
/// preset) becomes current.
impl From<ColorGradingSettings> for SettingsPatch {
    fn from(s: ColorGradingSettings) -> Self {
        Self {
            exposure: Some(s.exposure),
            contrast: Some(s.contrast),
            highlights: Some(s.highlights),
            shadows: Some(s.shadows),
            whites: Some(s.whites),
            blacks: Some(s.blacks),
            temperature: Some(s.temperature),
            tint: Some(s.tint),
            vibrance: Some(s.vibrance),
            saturation: Some(s.saturation),
            hue: Some(s.hue),
            lightness: Some(s.lightness),
            clarity: Some(s.clarity),
            dehaze: Some(s.dehaze),
            tone_curve: Some(s.tone_curve),
            color_wheels: Some(s.color_wheels),
            vignette: Some(s.vignette),
            tone_mapping: Some(s.tone_mapping),
            lut: Some(s.lut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let s = ColorGradingSettings::default();
        assert_eq!(s.exposure, 0.0);
        assert_eq!(s.temperature, 5500.0);
        assert_eq!(s.tone_mapping.algorithm, ToneMapAlgorithm::Linear);
        assert!(s.tone_curve.is_identity());
        assert!(s.color_wheels.is_neutral());
        assert_eq!(s.tone_curve.shadows.len(), 2);
        assert!(s.lut.is_none());
    }

    #[test]
    fn sanitized_clamps_out_of_range() {
        let s = ColorGradingSettings {
            exposure: 999.0,
            contrast: -3.0,
            temperature: 50.0,
            tint: 400.0,
            hue: 720.0,
            vignette: Vignette {
                amount: 2.0,
                ..Default::default()
            },
            tone_mapping: ToneMapping {
                white_point: 0.0,
                ..Default::default()
            },
            lut: Some(LutSettings::new("film", 3.0)),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.exposure, 5.0);
        assert_eq!(s.contrast, -1.0);
        assert_eq!(s.temperature, 2000.0);
        assert_eq!(s.tint, 100.0);
        assert_eq!(s.hue, 180.0);
        assert_eq!(s.vignette.amount, 1.0);
        assert_eq!(s.tone_mapping.white_point, 0.1);
        assert_eq!(s.lut.map(|l| l.intensity), Some(1.0));
    }

    #[test]
    fn sanitized_replaces_nan_with_neutral() {
        let s = ColorGradingSettings {
            exposure: f32::NAN,
            temperature: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.exposure, 0.0);
        assert_eq!(s.temperature, NEUTRAL_TEMPERATURE);
    }

    #[test]
    fn sanitized_is_idempotent_on_defaults() {
        let d = ColorGradingSettings::default();
        assert_eq!(d.sanitized(), d);
    }

    #[test]
    fn curve_from_points_sorts_and_clamps() {
        let c = Curve::from_points([
            CurvePoint::new(1.2, 1.0),
            CurvePoint::new(0.5, 0.7),
            CurvePoint::new(-0.1, 0.0),
        ]);
        let xs: Vec<f32> = c.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn curve_with_one_point_resets_to_linear() {
        let c = Curve::from_points([CurvePoint::new(0.3, 0.3)]);
        assert_eq!(c, Curve::linear());
    }

    #[test]
    fn curve_insert_keeps_order() {
        let mut c = Curve::linear();
        assert_eq!(c.insert(CurvePoint::new(0.7, 0.8)), Some(1));
        assert_eq!(c.insert(CurvePoint::new(0.3, 0.2)), Some(1));
        let xs: Vec<f32> = c.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.3, 0.7, 1.0]);
        // Duplicate x is rejected.
        assert_eq!(c.insert(CurvePoint::new(0.3, 0.9)), None);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn curve_move_cannot_cross_neighbours() {
        let mut c = Curve::linear();
        c.insert(CurvePoint::new(0.3, 0.3));
        c.insert(CurvePoint::new(0.6, 0.6));
        assert!(c.move_point(1, CurvePoint::new(0.9, 0.5)));
        let xs: Vec<f32> = c.points().iter().map(|p| p.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "order broken: {xs:?}");
        assert!(c.points()[1].x < 0.6);
        assert_eq!(c.points()[1].y, 0.5);
    }

    #[test]
    fn curve_endpoints_keep_x() {
        let mut c = Curve::linear();
        assert!(c.move_point(0, CurvePoint::new(0.4, 0.1)));
        assert_eq!(c.points()[0], CurvePoint::new(0.0, 0.1));
        assert!(!c.move_point(5, CurvePoint::new(0.5, 0.5)));
    }

    #[test]
    fn curve_remove_protects_endpoints() {
        let mut c = Curve::linear();
        c.insert(CurvePoint::new(0.5, 0.6));
        assert_eq!(c.remove(0), None);
        assert_eq!(c.remove(2), None);
        assert_eq!(c.remove(1), Some(CurvePoint::new(0.5, 0.6)));
        assert_eq!(c, Curve::linear());
    }

    #[test]
    fn merge_is_shallow() {
        let base = ColorGradingSettings {
            vignette: Vignette {
                amount: 0.4,
                feather: 0.2,
                ..Default::default()
            },
            ..Default::default()
        };
        let patch = SettingsPatch {
            exposure: Some(1.0),
            vignette: Some(Vignette {
                amount: 0.8,
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = base.merged(&patch);
        assert_eq!(merged.exposure, 1.0);
        assert_eq!(merged.vignette.amount, 0.8);
        // Whole group replaced, so feather is back to its default.
        assert_eq!(merged.vignette.feather, Vignette::default().feather);
        assert_eq!(merged.temperature, base.temperature);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let base = ColorGradingSettings {
            contrast: 0.3,
            ..Default::default()
        };
        let patch = SettingsPatch::default();
        assert!(patch.is_empty());
        assert_eq!(base.merged(&patch), base);
    }

    #[test]
    fn full_patch_replaces_everything() {
        let current = ColorGradingSettings {
            exposure: 1.5,
            lut: Some(LutSettings::new("a", 0.5)),
            ..Default::default()
        };
        let target = ColorGradingSettings {
            contrast: -0.2,
            ..Default::default()
        };
        let merged = current.merged(&SettingsPatch::from(target.clone()));
        assert_eq!(merged, target);
    }

    #[test]
    fn json_uses_camel_case_and_lowercase_algorithm() {
        let s = ColorGradingSettings {
            tone_mapping: ToneMapping {
                algorithm: ToneMapAlgorithm::Uncharted2,
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("toneCurve").is_some());
        assert!(json.get("colorWheels").is_some());
        assert_eq!(json["toneMapping"]["algorithm"], "uncharted2");
        assert!(json["toneMapping"].get("whitePoint").is_some());
        assert!(json.get("lut").is_none());
    }

    #[test]
    fn json_roundtrip_and_partial_input() {
        let s: ColorGradingSettings =
            serde_json::from_str(r#"{"exposure": -1, "toneCurve": {"shadows": [{"x":0,"y":0.1},{"x":1,"y":1}]}}"#)
                .unwrap();
        assert_eq!(s.exposure, -1.0);
        assert_eq!(s.temperature, 5500.0);
        assert_eq!(s.tone_curve.shadows.points()[0].y, 0.1);
        assert!(s.tone_curve.midtones.is_identity());

        let json = serde_json::to_string(&s).unwrap();
        let back: ColorGradingSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn patch_distinguishes_null_lut_from_absent() {
        let absent: SettingsPatch = serde_json::from_str(r#"{"exposure": 0.5}"#).unwrap();
        assert_eq!(absent.lut, None);

        let cleared: SettingsPatch = serde_json::from_str(r#"{"lut": null}"#).unwrap();
        assert_eq!(cleared.lut, Some(None));

        let base = ColorGradingSettings {
            lut: Some(LutSettings::new("film", 1.0)),
            ..Default::default()
        };
        assert!(base.merged(&cleared).lut.is_none());
        assert!(base.merged(&absent).lut.is_some());
    }
}
