use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_DEVICE_PATH: &str = "/dev/input/event0";

/// Settings for opening and polling a gamepad
///
/// Every field has a default, so a settings file only needs to name what it
/// changes:
///
/// ```toml
/// device_path = "/dev/input/by-id/usb-Sony_DualSense-event-joystick"
/// idle_wait_ms = 2
/// ```
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GamepadSettings {
    /// evdev node of the controller
    pub device_path: PathBuf,

    /// Sleep between reads while no event is pending
    pub idle_wait_ms: u64,

    /// How often the poll worker logs its throughput
    pub stats_interval_secs: i64,
}

impl Default for GamepadSettings {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            idle_wait_ms: 1,
            stats_interval_secs: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

impl GamepadSettings {
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    pub fn stats_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stats_interval_secs.max(1))
    }

    /// `<config dir>/padstate/settings.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("padstate").join("settings.toml"))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading gamepad settings from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Settings from the default location, falling back to defaults when the
    /// file is missing or broken
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory available, using default gamepad settings");
            return Self::default();
        };

        if !path.exists() {
            info!(
                "No settings file at {}, using default gamepad settings",
                path.display()
            );
            return Self::default();
        }

        match Self::load(&path) {
            Ok(settings) => {
                info!("Loaded gamepad settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("{}; using default gamepad settings", e);
                Self::default()
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = GamepadSettings::default();
        assert_eq!(settings.device_path, PathBuf::from("/dev/input/event0"));
        assert_eq!(settings.idle_wait(), Duration::from_millis(1));
        assert_eq!(settings.stats_interval(), chrono::Duration::seconds(10));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = GamepadSettings::from_toml_str(
            r#"device_path = "/dev/input/by-id/usb-pad-event-joystick""#,
        )
        .unwrap();
        assert_eq!(
            settings.device_path,
            PathBuf::from("/dev/input/by-id/usb-pad-event-joystick")
        );
        assert_eq!(settings.idle_wait_ms, 1);
        assert_eq!(settings.stats_interval_secs, 10);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(
            GamepadSettings::from_toml_str("").unwrap(),
            GamepadSettings::default()
        );
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = GamepadSettings::from_toml_str("idle_wait_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn survives_a_toml_round_trip() {
        let settings = GamepadSettings {
            device_path: PathBuf::from("/dev/input/event7"),
            idle_wait_ms: 3,
            stats_interval_secs: 30,
        };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(GamepadSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn stats_interval_is_at_least_one_second() {
        let settings = GamepadSettings {
            stats_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(settings.stats_interval(), chrono::Duration::seconds(1));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = GamepadSettings::load(Path::new("/nonexistent/padstate/settings.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
