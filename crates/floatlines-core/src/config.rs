//! Immutable per-mount configuration, loadable from TOML or JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use floatlines_platform::{Color, CompositeMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::sampler::Bend;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format for {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("unknown preset `{0}` (expected default, aurora or ember)")]
    UnknownPreset(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinesConfig {
    /// Palette cycled across lines by index.
    pub lines_gradient: Vec<Color>,
    /// Scales each line's random per-frame phase increment.
    pub animation_speed: f32,
    pub interactive: bool,
    /// Pointer influence radius in surface pixels.
    pub bend_radius: f32,
    pub bend_strength: f32,
    pub line_count: usize,
    /// Horizontal distance between sampled points in surface pixels.
    pub sample_stride: f32,
    pub glow_blur: f32,
    pub blend: CompositeMode,
    pub seed: Option<u64>,
}

impl Default for LinesConfig {
    fn default() -> Self {
        Self {
            lines_gradient: vec![
                Color::rgb(0xe9, 0x45, 0xf5),
                Color::rgb(0x2f, 0x4b, 0xa2),
                Color::rgb(0x38, 0xbd, 0xf8),
            ],
            animation_speed: 0.02,
            interactive: true,
            bend_radius: 400.0,
            bend_strength: 0.2,
            line_count: 5,
            sample_stride: 50.0,
            glow_blur: 30.0,
            blend: CompositeMode::Lighter,
            seed: None,
        }
    }
}

impl LinesConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load by file extension: `.toml` or `.json`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse(&source)?;
        debug!(path = %path.display(), lines = config.line_count, "config loaded");
        Ok(config)
    }

    /// Rejects values that leave the effect undefined. Out-of-range bend
    /// parameters are accepted and simply flatten or invert the deflection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lines_gradient.is_empty() {
            return Err(ConfigError::Invalid(
                "lines_gradient needs at least one color".into(),
            ));
        }
        if self.line_count == 0 {
            return Err(ConfigError::Invalid("line_count must be at least 1".into()));
        }
        if !(self.sample_stride.is_finite() && self.sample_stride > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sample_stride must be a positive number, got {}",
                self.sample_stride
            )));
        }
        if !(self.glow_blur.is_finite() && self.glow_blur >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "glow_blur must be zero or positive, got {}",
                self.glow_blur
            )));
        }
        if !self.animation_speed.is_finite() {
            return Err(ConfigError::Invalid("animation_speed must be finite".into()));
        }
        Ok(())
    }

    /// Pointer deflection parameters, `None` when interaction is off.
    pub fn bend(&self) -> Option<Bend> {
        self.interactive.then_some(Bend {
            radius: self.bend_radius,
            strength: self.bend_strength,
        })
    }
}

/// Built-in palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Default,
    Aurora,
    Ember,
}

impl Preset {
    pub fn config(self) -> LinesConfig {
        let palette = match self {
            Preset::Default => return LinesConfig::default(),
            Preset::Aurora => vec![
                Color::rgb(0x22, 0xd3, 0xee),
                Color::rgb(0x34, 0xd3, 0x99),
                Color::rgb(0xa7, 0x8b, 0xfa),
                Color::rgb(0x0e, 0xa5, 0xe9),
            ],
            Preset::Ember => vec![
                Color::rgb(0xf9, 0x73, 0x16),
                Color::rgb(0xef, 0x44, 0x44),
                Color::rgb(0xfa, 0xcc, 0x15),
            ],
        };
        LinesConfig {
            lines_gradient: palette,
            ..LinesConfig::default()
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Ok(Preset::Default),
            "aurora" => Ok(Preset::Aurora),
            "ember" => Ok(Preset::Ember),
            _ => Err(ConfigError::UnknownPreset(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = LinesConfig::default();
        config.validate().unwrap();
        assert_eq!(config.line_count, 5);
        assert_eq!(config.sample_stride, 50.0);
        assert_eq!(config.glow_blur, 30.0);
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = LinesConfig::from_toml_str(
            r##"
            lines_gradient = ["#ff0000", "#00ff00"]
            interactive = false
            bend_radius = 120.0
            blend = "screen"
            seed = 7
            "##,
        )
        .unwrap();
        assert_eq!(
            config.lines_gradient,
            vec![Color::rgb(255, 0, 0), Color::rgb(0, 255, 0)]
        );
        assert!(!config.interactive);
        assert_eq!(config.bend_radius, 120.0);
        assert_eq!(config.blend, CompositeMode::Screen);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.line_count, 5);
        assert_eq!(config.bend(), None);
    }

    #[rstest]
    #[case("lines_gradient = []")]
    #[case("line_count = 0")]
    #[case("sample_stride = 0.0")]
    #[case("sample_stride = -50.0")]
    #[case("glow_blur = -1.0")]
    fn rejects_undefined_values(#[case] source: &str) {
        assert!(matches!(
            LinesConfig::from_toml_str(source),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn negative_bend_is_accepted() {
        let config = LinesConfig::from_toml_str("bend_radius = -10.0\nbend_strength = -2.0").unwrap();
        assert_eq!(
            config.bend(),
            Some(Bend {
                radius: -10.0,
                strength: -2.0
            })
        );
    }

    #[test]
    fn bad_color_is_a_toml_error() {
        assert!(matches!(
            LinesConfig::from_toml_str(r#"lines_gradient = ["red"]"#),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("lines.json");
        let mut file = fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"line_count": 8, "animation_speed": 0.05}}"#).unwrap();
        let config = LinesConfig::load(&json_path).unwrap();
        assert_eq!(config.line_count, 8);
        assert_eq!(config.animation_speed, 0.05);

        let toml_path = dir.path().join("lines.TOML");
        fs::write(&toml_path, "glow_blur = 12.0").unwrap();
        assert_eq!(LinesConfig::load(&toml_path).unwrap().glow_blur, 12.0);

        let yaml_path = dir.path().join("lines.yaml");
        fs::write(&yaml_path, "line_count: 2").unwrap();
        assert!(matches!(
            LinesConfig::load(&yaml_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            LinesConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn presets_by_name() {
        assert_eq!("Aurora".parse::<Preset>().unwrap(), Preset::Aurora);
        assert!("neon".parse::<Preset>().is_err());
        let ember = Preset::Ember.config();
        assert_eq!(ember.lines_gradient.len(), 3);
        assert_eq!(ember.line_count, LinesConfig::default().line_count);
        assert_eq!(Preset::Default.config(), LinesConfig::default());
    }
}
