//! Game settings
//!
//! Changes are applied by the world on the next tick. Nothing here is
//! persisted; the page hands settings over as JSON.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::random::RandomSourceKind;

/// Tunable game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Chance per tick that an enemy spawns (0.0 - 1.0)
    pub spawn_rate: f32,
    /// Hero approach factor per tick
    pub hero_speed: f32,
    /// Cap on live enemies
    pub max_shapes: usize,
    /// Pointer pull multiplier in manual mode
    pub mouse_sensitivity: f32,
    /// Randomness backend
    pub random_source: RandomSourceKind,
    /// Chance per tick that a modifier pickup spawns (0.0 - 1.0)
    pub pickup_spawn_rate: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spawn_rate: 0.03,
            hero_speed: 0.1,
            max_shapes: 20,
            mouse_sensitivity: 0.15,
            random_source: RandomSourceKind::Default,
            pickup_spawn_rate: 0.0,
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check every numeric field is inside its allowed range
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_unit("spawnRate", self.spawn_rate)?;
        check_unit("pickupSpawnRate", self.pickup_spawn_rate)?;
        check_non_negative("heroSpeed", self.hero_speed)?;
        check_non_negative("mouseSensitivity", self.mouse_sensitivity)?;
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value: value as f64,
        })
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value: value as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_shapes, 20);
        assert_eq!(settings.random_source, RandomSourceKind::Default);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            Settings::from_json(r#"{"spawnRate":0.5,"randomSource":"external"}"#).unwrap();
        assert_eq!(settings.spawn_rate, 0.5);
        assert_eq!(settings.random_source, RandomSourceKind::External);
        assert_eq!(settings.hero_speed, 0.1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = Settings::from_json(r#"{"spawnRate":1.5}"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::OutOfRange {
                field: "spawnRate",
                ..
            }
        ));
        assert!(Settings::from_json(r#"{"heroSpeed":-1}"#).is_err());
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip_uses_camel_case() {
        let json = Settings::default().to_json().unwrap();
        assert!(json.contains("\"mouseSensitivity\""));
        assert_eq!(Settings::from_json(&json).unwrap(), Settings::default());
    }
}
