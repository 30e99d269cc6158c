//! Viewer configuration
//!
//! Supports JSON and TOML files; the format is chosen by extension.
//!
//! Configuration is organized into sections:
//! - Parse defaults (nozzle diameter)
//! - Render settings (circle subdivisions, tube thickness, model scale)
//! - Worker settings (mesh build threads)

use std::path::{Path, PathBuf};

use printview_core::constants::{
    DEFAULT_CIRCLE_SUBDIVISIONS, DEFAULT_NOZZLE_DIAMETER, MAX_CIRCLE_SUBDIVISIONS,
    MIN_CIRCLE_SUBDIVISIONS, MM_PER_SCENE_UNIT,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Parse defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSettings {
    /// Nozzle diameter in mm used until a slicer directive says otherwise
    pub default_nozzle_diameter: f64,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            default_nozzle_diameter: DEFAULT_NOZZLE_DIAMETER,
        }
    }
}

/// Mesh and scene settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Vertices per tube cross-section
    pub circle_subdivisions: usize,
    /// Tube diameter in mm; the document's nozzle diameter when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    /// Scene units per mm
    pub model_scale: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            circle_subdivisions: DEFAULT_CIRCLE_SUBDIVISIONS,
            thickness: None,
            model_scale: 1.0 / MM_PER_SCENE_UNIT,
        }
    }
}

impl RenderSettings {
    /// Tube thickness for a document printed with `nozzle_diameter`
    pub fn thickness_for(&self, nozzle_diameter: f64) -> f64 {
        self.thickness.unwrap_or(nozzle_diameter)
    }
}

/// Mesh build worker settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Worker thread count (0 = available parallelism)
    pub threads: usize,
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub parse: ParseSettings,
    pub render: RenderSettings,
    pub workers: WorkerSettings,
}

impl ViewerConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match Format::from_path(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let nozzle = self.parse.default_nozzle_diameter;
        if !(nozzle.is_finite() && nozzle > 0.0) {
            return Err(ConfigError::out_of_range("parse.default_nozzle_diameter", nozzle));
        }

        if !(MIN_CIRCLE_SUBDIVISIONS..=MAX_CIRCLE_SUBDIVISIONS)
            .contains(&self.render.circle_subdivisions)
        {
            return Err(ConfigError::out_of_range(
                "render.circle_subdivisions",
                self.render.circle_subdivisions,
            ));
        }

        if let Some(thickness) = self.render.thickness {
            if !(thickness.is_finite() && thickness > 0.0) {
                return Err(ConfigError::out_of_range("render.thickness", thickness));
            }
        }

        let scale = self.render.model_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::out_of_range("render.model_scale", scale));
        }

        Ok(())
    }
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("printview").join("config.toml"))
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}
