use std::f32::consts::FRAC_PI_6;
use std::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use serde::{Serialize, Deserialize};
use thiserror::Error;

const SETTINGS_FILE: &str = "display.toml";
const ENV_PREFIX: &str = "PET_COMPANION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Failed to parse definitions: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

// =============================================================================
// Display Settings
// =============================================================================

/// Vertical bob applied to every companion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BobSettings {
    pub amplitude: f64,
    /// Phase advance factor; the phase at tick `t` is `t / 2π * speed`.
    pub speed: f64,
}

impl Default for BobSettings {
    fn default() -> Self {
        Self {
            amplitude: 0.15,
            speed: 0.5,
        }
    }
}

/// Orientation of companions without an animated model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinSettings {
    /// Spin continuously instead of facing the owner's yaw.
    pub enabled: bool,
    pub speed: f64,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSettings {
    /// Minimum magnitude of each horizontal offset axis.
    pub floor: f32,
    /// Angular shift around the vertical axis, in radians.
    pub rotation_radians: f32,
}

impl Default for PoseSettings {
    fn default() -> Self {
        Self {
            floor: 0.5,
            rotation_radians: FRAC_PI_6,
        }
    }
}

/// Thresholds used to decide whether an owner is walking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementThresholds {
    /// Horizontal speed (blocks per tick) above which the owner counts as moving.
    pub walk_speed_epsilon: f32,
    /// Optional horizontal facing magnitude above which the owner counts as moving.
    pub facing_threshold: Option<f32>,
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            walk_speed_epsilon: 0.01,
            facing_threshold: None,
        }
    }
}

/// Parameters handed to the external animation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Ticks between forced re-sends of the current animation. Zero disables re-triggering.
    pub retrigger_interval_ticks: u64,
    pub blend_in: f64,
    pub blend_out: f64,
    pub speed: f64,
    /// Transition token passed for extra string parameters by the best-effort adapter.
    pub instant_token: String,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            retrigger_interval_ticks: 100,
            blend_in: 0.2,
            blend_out: 0.2,
            speed: 1.0,
            instant_token: "INSTANT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub enabled: bool,
    pub tick_interval_ms: u64,
    /// Label template; `%player%`, `%pet%` and `%level%` are substituted.
    pub name_template: String,
    pub bob: BobSettings,
    pub spin: SpinSettings,
    pub pose: PoseSettings,
    pub movement: MovementThresholds,
    pub animation: AnimationSettings,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: 50,
            name_template: "%player%'s %pet% (Lvl. %level%)".to_string(),
            bob: BobSettings::default(),
            spin: SpinSettings::default(),
            pose: PoseSettings::default(),
            movement: MovementThresholds::default(),
            animation: AnimationSettings::default(),
        }
    }
}

impl DisplaySettings {
    /// Render the companion label for an owner.
    pub fn format_label(&self, player: &str, pet: &str, level: u32) -> String {
        self.name_template
            .replace("%player%", player)
            .replace("%pet%", pet)
            .replace("%level%", &level.to_string())
    }
}

// =============================================================================
// Settings file management
// =============================================================================

pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "petcompanion", "pet-companion")
        .map(|proj| proj.config_dir().join(SETTINGS_FILE))
}

/// Directory for runtime data such as the skin selection store.
pub fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "petcompanion", "pet-companion")
        .map(|proj| proj.data_dir().to_path_buf())
}

/// Load settings from `path` (missing file allowed), then apply
/// `PET_COMPANION__SECTION__KEY` environment overrides.
pub fn load_display_settings_from(path: &Path) -> Result<DisplaySettings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(settings.try_deserialize()?)
}

pub fn load_display_settings() -> Result<DisplaySettings, ConfigError> {
    match settings_path() {
        Some(path) => load_display_settings_from(&path),
        None => Ok(DisplaySettings::default()),
    }
}

pub fn save_display_settings_to(path: &Path, settings: &DisplaySettings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let toml = toml::to_string_pretty(settings)?;
    fs::write(path, toml)?;
    Ok(())
}

pub fn save_display_settings(settings: &DisplaySettings) -> Result<(), ConfigError> {
    let path = settings_path().ok_or(ConfigError::NoConfigDir)?;
    save_display_settings_to(&path, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_substitution() {
        let settings = DisplaySettings::default();
        assert_eq!(settings.format_label("Alex", "Fox", 7), "Alex's Fox (Lvl. 7)");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: DisplaySettings = toml::from_str("[spin]\nenabled = true\n").unwrap();
        assert!(parsed.spin.enabled);
        assert_eq!(parsed.spin.speed, 20.0);
        assert_eq!(parsed.animation.retrigger_interval_ticks, 100);
        assert_eq!(parsed.pose.floor, 0.5);
    }
}
