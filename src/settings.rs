//! Backdrop settings
//!
//! Persisted in LocalStorage on the web; native builds always use defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Particle density presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DensityPreset {
    Sparse,
    #[default]
    Standard,
    Dense,
}

impl DensityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DensityPreset::Sparse => "Sparse",
            DensityPreset::Standard => "Standard",
            DensityPreset::Dense => "Dense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sparse" => Some(DensityPreset::Sparse),
            "standard" => Some(DensityPreset::Standard),
            "dense" => Some(DensityPreset::Dense),
            _ => None,
        }
    }

    /// Particle count for this preset
    pub fn particle_count(&self) -> usize {
        match self {
            DensityPreset::Sparse => PARTICLE_COUNT / 2,
            DensityPreset::Standard => PARTICLE_COUNT,
            DensityPreset::Dense => PARTICLE_COUNT * 3,
        }
    }
}

/// Tunables for the particle field and its rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    pub density: DensityPreset,
    /// Number of particles spawned at mount
    pub particle_count: usize,

    // === Links ===
    pub link_distance: f32,
    pub link_max_opacity: f32,
    pub link_width: f32,

    // === Glyphs ===
    pub pulse_amplitude: f32,
    pub phase_step: f32,
    /// Gradient alpha at the glyph centre (edge is always transparent)
    pub glyph_core_alpha: f32,
    pub radius_min: f32,
    pub radius_max: f32,

    // === Motion ===
    pub max_speed: f32,
    pub tick_hz: f32,
    pub max_substeps: u32,
    /// Render a still field (no advancing)
    pub reduced_motion: bool,

    pub color: [u8; 3],
    pub dpr_min: f32,
    pub dpr_max: f32,
    pub reveal_threshold: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            density: DensityPreset::Standard,
            particle_count: PARTICLE_COUNT,

            link_distance: LINK_DISTANCE,
            link_max_opacity: LINK_MAX_OPACITY,
            link_width: LINK_WIDTH,

            pulse_amplitude: PULSE_AMPLITUDE,
            phase_step: PHASE_STEP,
            glyph_core_alpha: 1.0,
            radius_min: RADIUS_MIN,
            radius_max: RADIUS_MAX,

            max_speed: MAX_SPEED,
            tick_hz: TICK_HZ,
            max_substeps: MAX_SUBSTEPS,
            reduced_motion: false,

            color: ACCENT_RGB,
            dpr_min: DPR_MIN,
            dpr_max: DPR_MAX,
            reveal_threshold: REVEAL_THRESHOLD,
        }
    }
}

impl FieldSettings {
    /// Create settings from a density preset
    pub fn from_preset(preset: DensityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a density preset (updates the particle count)
    pub fn apply_preset(&mut self, preset: DensityPreset) {
        self.density = preset;
        self.particle_count = preset.particle_count();
    }

    /// Whether particles move between frames
    pub fn effective_motion(&self) -> bool {
        !self.reduced_motion
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        }

        if self.particle_count == 0 {
            return invalid("particle_count", "must be at least 1");
        }
        if !(self.link_distance >= MIN_LINK_DISTANCE) {
            return invalid("link_distance", "must be at least 1 logical pixel");
        }
        if !(0.0..=1.0).contains(&self.link_max_opacity) {
            return invalid("link_max_opacity", "must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.glyph_core_alpha) {
            return invalid("glyph_core_alpha", "must be within [0, 1]");
        }
        if !(self.radius_min > 0.0 && self.radius_min < self.radius_max) {
            return invalid("radius_min", "must be positive and below radius_max");
        }
        if !(self.max_speed > 0.0) {
            return invalid("max_speed", "must be positive");
        }
        if !(self.tick_hz > 0.0) {
            return invalid("tick_hz", "must be positive");
        }
        if self.max_substeps == 0 {
            return invalid("max_substeps", "must be at least 1");
        }
        if !(self.dpr_min >= 1.0 && self.dpr_min <= self.dpr_max) {
            return invalid("dpr_min", "must be >= 1 and <= dpr_max");
        }
        if !(self.reveal_threshold > 0.0 && self.reveal_threshold <= 1.0) {
            return invalid("reveal_threshold", "must be within (0, 1]");
        }
        Ok(())
    }

    /// Parse and validate settings JSON. Missing fields take defaults; a
    /// missing `particle_count` follows `density`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let explicit_count = value.get("particle_count").is_some();
        let mut settings: Self = serde_json::from_value(value)?;
        if !explicit_count {
            settings.particle_count = settings.density.particle_count();
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "neural_backdrop_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded backdrop settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default backdrop settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Backdrop settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = FieldSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.particle_count, 32);
        assert_eq!(settings.link_distance, 120.0);
        assert_eq!(settings.link_max_opacity, 0.35);
        assert_eq!(settings.dpr_max, 2.0);
    }

    #[test]
    fn test_presets() {
        assert_eq!(FieldSettings::from_preset(DensityPreset::Sparse).particle_count, 16);
        assert_eq!(FieldSettings::from_preset(DensityPreset::Dense).particle_count, 96);
        assert_eq!(DensityPreset::from_str("DENSE"), Some(DensityPreset::Dense));
        assert_eq!(DensityPreset::from_str("high"), None);
        assert_eq!(DensityPreset::from_str("bogus"), None);
        assert_eq!(DensityPreset::Standard.as_str(), "Standard");
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let settings = FieldSettings::from_json(r#"{"particle_count": 10}"#).unwrap();
        assert_eq!(settings.particle_count, 10);
        assert_eq!(settings.link_distance, LINK_DISTANCE);
    }

    #[test]
    fn test_density_drives_count_unless_given() {
        let dense = FieldSettings::from_json(r#"{"density": "Dense"}"#).unwrap();
        assert_eq!(dense.particle_count, 96);

        let pinned = FieldSettings::from_json(r#"{"density": "Dense", "particle_count": 40}"#).unwrap();
        assert_eq!(pinned.particle_count, 40);

        let sparse = FieldSettings::from_preset(DensityPreset::Sparse);
        let back = FieldSettings::from_json(&sparse.to_json().unwrap()).unwrap();
        assert_eq!(back, sparse);
        assert_eq!(back.particle_count, 16);
    }

    #[test]
    fn test_link_distance_lower_bound() {
        let err = FieldSettings::from_json(r#"{"link_distance": 0.01}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "link_distance", .. }));
        assert!(FieldSettings::from_json(r#"{"link_distance": 1.0}"#).is_ok());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = FieldSettings::from_json(r#"{"particle_count": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "particle_count",
                ..
            }
        ));

        let err = FieldSettings::from_json(r#"{"dpr_min": 3.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "dpr_min", .. }));

        assert!(matches!(
            FieldSettings::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_reduced_motion() {
        let mut settings = FieldSettings::default();
        settings.reduced_motion = true;
        let json = settings.to_json().unwrap();
        let back = FieldSettings::from_json(&json).unwrap();
        assert!(!back.effective_motion());
        assert_eq!(back, settings);
    }
}
