use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::settings::{
    ColorGradingSettings, ColorWheelSettings, ColorWheels, Curve, CurvePoint, ToneCurve, Vignette,
};

const BUILTIN_PREFIX: &str = "builtin:";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetCategory {
    Portrait,
    Landscape,
    Film,
    BlackAndWhite,
    Cinematic,
    Creative,
    #[default]
    Custom,
}

/// A named settings snapshot. Timestamps are unix milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorGradingPreset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub settings: ColorGradingSettings,
    #[serde(default)]
    pub category: PresetCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

impl ColorGradingPreset {
    pub fn is_builtin(&self) -> bool {
        self.id.starts_with(BUILTIN_PREFIX)
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Ordered collection of presets for one session.
#[derive(Clone, Debug, Default)]
pub struct PresetLibrary {
    presets: Vec<ColorGradingPreset>,
    seq: u64,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        Self {
            presets: builtin_presets(),
            seq: 0,
        }
    }

    pub fn all(&self) -> &[ColorGradingPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ColorGradingPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// First preset whose name matches, ignoring ASCII case.
    pub fn find_by_name(&self, name: &str) -> Option<&ColorGradingPreset> {
        self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn by_category(&self, category: PresetCategory) -> Vec<&ColorGradingPreset> {
        self.presets.iter().filter(|p| p.category == category).collect()
    }

    /// Snapshot `settings` under a fresh id.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        category: PresetCategory,
        tags: Vec<String>,
        settings: &ColorGradingSettings,
    ) -> ColorGradingPreset {
        let name = name.into();
        let now = now_ms();
        self.seq += 1;
        let id = self.fresh_id(&name, now);
        let preset = ColorGradingPreset {
            id,
            name,
            description,
            settings: settings.sanitized(),
            category,
            tags,
            created_at: now,
            updated_at: now,
        };
        debug!(id = %preset.id, name = %preset.name, "saved preset");
        self.presets.push(preset.clone());
        preset
    }

    /// Replace a preset's settings, bumping `updated_at`.
    pub fn update_settings(&mut self, id: &str, settings: &ColorGradingSettings) -> bool {
        let Some(p) = self.presets.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        p.settings = settings.sanitized();
        p.updated_at = now_ms().max(p.created_at);
        true
    }

    /// Remove a user preset. Built-ins cannot be removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(pos) = self.presets.iter().position(|p| p.id == id) else {
            return false;
        };
        if self.presets[pos].is_builtin() {
            return false;
        }
        self.presets.remove(pos);
        true
    }

    /// User presets as a JSON array.
    pub fn export_json(&self) -> Result<String> {
        let user: Vec<&ColorGradingPreset> =
            self.presets.iter().filter(|p| !p.is_builtin()).collect();
        serde_json::to_string_pretty(&user).context("failed to serialize presets")
    }

    /// Merge presets from a JSON array. A preset whose id already exists
    /// replaces the stored one; built-in ids are skipped. Returns the
    /// number of presets taken.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let incoming: Vec<ColorGradingPreset> =
            serde_json::from_str(json).context("failed to parse preset JSON")?;
        let mut taken = 0;
        for mut preset in incoming {
            if preset.is_builtin() {
                continue;
            }
            if preset.id.is_empty() {
                self.seq += 1;
                preset.id = self.fresh_id(&preset.name, now_ms());
            }
            preset.settings = preset.settings.sanitized();
            preset.updated_at = preset.updated_at.max(preset.created_at);
            match self.presets.iter_mut().find(|p| p.id == preset.id) {
                Some(existing) => *existing = preset,
                None => self.presets.push(preset),
            }
            taken += 1;
        }
        info!(count = taken, "imported presets");
        Ok(taken)
    }

    fn fresh_id(&self, name: &str, now: u64) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(name.as_bytes());
        hasher.update(&now.to_le_bytes());
        hasher.update(&self.seq.to_le_bytes());
        hasher.update(&(self.presets.len() as u64).to_le_bytes());
        let hex = hasher.finalize().to_hex();
        format!("preset-{}", &hex[..16])
    }
}

// ── Built-ins ────────────────────────────────────────────────────────────

fn builtin(
    slug: &str,
    name: &str,
    description: &str,
    category: PresetCategory,
    tags: &[&str],
    settings: ColorGradingSettings,
) -> ColorGradingPreset {
    ColorGradingPreset {
        id: format!("{BUILTIN_PREFIX}{slug}"),
        name: name.to_string(),
        description: Some(description.to_string()),
        settings,
        category,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: 0,
        updated_at: 0,
    }
}

fn wheel(hue: f32, saturation: f32, luminance: f32) -> ColorWheelSettings {
    ColorWheelSettings {
        hue,
        saturation,
        luminance,
    }
}

fn builtin_presets() -> Vec<ColorGradingPreset> {
    vec![
        builtin(
            "neutral",
            "Neutral",
            "No adjustment",
            PresetCategory::Custom,
            &["reset"],
            ColorGradingSettings::default(),
        ),
        builtin(
            "warm-portrait",
            "Warm Portrait",
            "Warmer skin tones with softened detail",
            PresetCategory::Portrait,
            &["warm", "skin"],
            ColorGradingSettings {
                temperature: 6500.0,
                tint: 5.0,
                vibrance: 0.15,
                highlights: -0.1,
                shadows: 0.1,
                clarity: -0.1,
                ..Default::default()
            },
        ),
        builtin(
            "teal-orange",
            "Teal & Orange",
            "Cool shadows against warm highlights",
            PresetCategory::Cinematic,
            &["cinematic", "split-tone"],
            ColorGradingSettings {
                contrast: 0.15,
                vibrance: 0.2,
                color_wheels: ColorWheels {
                    shadows: wheel(190.0, 0.4, 0.0),
                    midtones: ColorWheelSettings::default(),
                    highlights: wheel(30.0, 0.35, 0.0),
                },
                ..Default::default()
            },
        ),
        builtin(
            "faded-film",
            "Faded Film",
            "Lifted blacks and muted color",
            PresetCategory::Film,
            &["film", "matte"],
            ColorGradingSettings {
                contrast: -0.15,
                saturation: -0.2,
                temperature: 5900.0,
                tone_curve: ToneCurve {
                    shadows: Curve::from_points([
                        CurvePoint::new(0.0, 0.08),
                        CurvePoint::new(1.0, 1.0),
                    ]),
                    ..Default::default()
                },
                ..Default::default()
            },
        ),
        builtin(
            "noir",
            "Noir",
            "High-contrast monochrome with a heavy vignette",
            PresetCategory::BlackAndWhite,
            &["monochrome"],
            ColorGradingSettings {
                saturation: -1.0,
                contrast: 0.35,
                blacks: -0.2,
                vignette: Vignette {
                    amount: 0.45,
                    ..Default::default()
                },
                ..Default::default()
            },
        ),
        builtin(
            "vivid-landscape",
            "Vivid Landscape",
            "Punchy color and recovered skies",
            PresetCategory::Landscape,
            &["vivid", "outdoor"],
            ColorGradingSettings {
                vibrance: 0.4,
                saturation: 0.15,
                dehaze: 0.2,
                clarity: 0.2,
                highlights: -0.2,
                ..Default::default()
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_present_and_unique() {
        let lib = PresetLibrary::with_builtins();
        assert_eq!(lib.len(), 6);
        let mut ids: Vec<&str> = lib.all().iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(lib.find_by_name("teal & orange").is_some());
        assert_eq!(lib.by_category(PresetCategory::BlackAndWhite).len(), 1);
    }

    #[test]
    fn builtin_settings_are_already_in_range() {
        for p in builtin_presets() {
            assert_eq!(p.settings.sanitized(), p.settings, "{}", p.name);
        }
    }

    #[test]
    fn created_ids_are_unique() {
        let mut lib = PresetLibrary::new();
        let s = ColorGradingSettings::default();
        let a = lib.create("Same", None, PresetCategory::Custom, vec![], &s);
        let b = lib.create("Same", None, PresetCategory::Custom, vec![], &s);
        assert_ne!(a.id, b.id);
        assert_eq!(lib.len(), 2);
        assert!(a.created_at <= a.updated_at);
    }

    #[test]
    fn create_snapshots_sanitized_settings() {
        let mut lib = PresetLibrary::new();
        let s = ColorGradingSettings {
            exposure: 42.0,
            ..Default::default()
        };
        let p = lib.create("Hot", None, PresetCategory::Creative, vec![], &s);
        assert_eq!(p.settings.exposure, 5.0);
    }

    #[test]
    fn builtins_cannot_be_deleted() {
        let mut lib = PresetLibrary::with_builtins();
        assert!(!lib.delete("builtin:noir"));
        let p = lib.create("Mine", None, PresetCategory::Custom, vec![], &Default::default());
        assert!(lib.delete(&p.id));
        assert!(!lib.delete(&p.id));
    }

    #[test]
    fn update_bumps_timestamp() {
        let mut lib = PresetLibrary::new();
        let p = lib.create("Mine", None, PresetCategory::Custom, vec![], &Default::default());
        let s = ColorGradingSettings {
            contrast: 0.5,
            ..Default::default()
        };
        assert!(lib.update_settings(&p.id, &s));
        let stored = lib.get(&p.id).unwrap();
        assert_eq!(stored.settings.contrast, 0.5);
        assert!(stored.updated_at >= p.updated_at);
        assert!(!lib.update_settings("missing", &s));
    }

    #[test]
    fn export_import_round_trip() {
        let mut lib = PresetLibrary::with_builtins();
        let s = ColorGradingSettings {
            hue: 30.0,
            ..Default::default()
        };
        let p = lib.create(
            "Shifted",
            Some("hue +30".into()),
            PresetCategory::Creative,
            vec!["hue".into()],
            &s,
        );
        let json = lib.export_json().unwrap();
        assert!(json.contains("createdAt"));
        assert!(!json.contains("builtin:"));

        let mut other = PresetLibrary::with_builtins();
        assert_eq!(other.import_json(&json).unwrap(), 1);
        assert_eq!(other.get(&p.id), Some(&p));

        // Importing again replaces rather than duplicates.
        assert_eq!(other.import_json(&json).unwrap(), 1);
        assert_eq!(other.len(), 7);
    }

    #[test]
    fn import_sanitizes_and_rejects_garbage() {
        let mut lib = PresetLibrary::new();
        let json = r#"[{"id":"x","name":"Loud","settings":{"contrast":9}}]"#;
        assert_eq!(lib.import_json(json).unwrap(), 1);
        assert_eq!(lib.get("x").unwrap().settings.contrast, 1.0);
        assert_eq!(lib.get("x").unwrap().category, PresetCategory::Custom);

        assert!(lib.import_json("not json").is_err());
    }
}
