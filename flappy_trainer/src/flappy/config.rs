// config.rs

use std::{collections::HashMap, fs, io, path::Path};

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingKey(String),
    #[error("Setting {key} has an unparsable value {value:?}")]
    Unparsable { key: String, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Couldn't read the settings file")]
    IOError(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// `KEY=VALUE` lines. Blank lines and lines starting with `#` are skipped and values may be
/// quoted.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    pub fn parse(contents: &str) -> Self {
        let values = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                (key.trim().to_string(), value.to_string())
            })
            .collect();
        Self { values }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.parse().map_err(|_| ConfigError::Unparsable {
            key: key.to_string(),
            value,
        })
    }

    pub fn get_float(&self, key: &str) -> Result<f32> {
        let value = self.get_string(key)?;
        value.parse().map_err(|_| ConfigError::Unparsable {
            key: key.to_string(),
            value,
        })
    }

    /// Comma separated integers, e.g. `BIRD_COLOR=255,200,0`.
    pub fn get_tuple(&self, key: &str) -> Result<Vec<i64>> {
        let value = self.get_string(key)?;
        value
            .split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| ConfigError::Unparsable {
                key: key.to_string(),
                value,
            })
    }

    fn get_u32(&self, key: &str) -> Result<u32> {
        let value = self.get_int(key)?;
        u32::try_from(value).map_err(|_| ConfigError::Unparsable {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn get_color(&self, key: &str) -> Result<[u8; 3]> {
        let values = self.get_tuple(key)?;
        let channels = values
            .iter()
            .map(|&channel| u8::try_from(channel))
            .collect::<std::result::Result<Vec<_>, _>>();
        match channels.as_deref() {
            Ok(&[r, g, b]) => Ok([r, g, b]),
            _ => Err(ConfigError::Unparsable {
                key: key.to_string(),
                value: format!("{values:?}"),
            }),
        }
    }
}

/// Everything the simulation needs. Built once at start up and passed by reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub background_color: [u8; 3],

    pub start_level: u32,
    pub start_score: u32,
    pub score_per_level_up: u32,

    pub pipe_speed: f32,
    pub pipe_speed_increase_per_level_up: f32,
    pub max_pipe_speed: f32,
    pub pipe_width: u32,
    pub pipe_min_height: u32,
    pub pipe_min_gap_height: u32,
    pub pipe_max_gap_height: u32,
    /// milliseconds
    pub min_time_between_pipes: u32,
    /// milliseconds
    pub max_time_between_pipes: u32,

    pub bird_start_x: f32,
    pub bird_start_y: f32,
    pub bird_radius: f32,
    pub bird_color: [u8; 3],
    pub bird_gravity: f32,
    pub bird_flap_force: f32,
    pub bird_flap_decay: f32,
    pub max_bird_velocity: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 800,
            screen_height: 600,
            background_color: [112, 197, 206],
            start_level: 1,
            start_score: 0,
            score_per_level_up: 5,
            pipe_speed: 180.0,
            pipe_speed_increase_per_level_up: 20.0,
            max_pipe_speed: 400.0,
            pipe_width: 70,
            pipe_min_height: 50,
            pipe_min_gap_height: 130,
            pipe_max_gap_height: 220,
            min_time_between_pipes: 1400,
            max_time_between_pipes: 2200,
            bird_start_x: 150.0,
            bird_start_y: 300.0,
            bird_radius: 12.0,
            bird_color: [245, 200, 66],
            bird_gravity: 30.0,
            bird_flap_force: 8.0,
            bird_flap_decay: 0.9,
            max_bird_velocity: 15.0,
        }
    }
}

impl GameConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = Self {
            screen_width: settings.get_u32("SCREEN_WIDTH")?,
            screen_height: settings.get_u32("SCREEN_HEIGHT")?,
            background_color: settings.get_color("BACKGROUND_COLOR")?,
            start_level: settings.get_u32("START_LEVEL")?,
            start_score: settings.get_u32("START_SCORE")?,
            score_per_level_up: settings.get_u32("SCORE_PER_LEVEL_UP")?,
            pipe_speed: settings.get_float("PIPE_SPEED")?,
            pipe_speed_increase_per_level_up: settings
                .get_float("PIPE_SPEED_INCREASE_PER_LEVEL_UP")?,
            max_pipe_speed: settings.get_float("MAX_PIPE_SPEED")?,
            pipe_width: settings.get_u32("PIPE_WIDTH")?,
            pipe_min_height: settings.get_u32("PIPE_MIN_HEIGHT")?,
            pipe_min_gap_height: settings.get_u32("PIPE_MIN_GAP_HEIGHT")?,
            pipe_max_gap_height: settings.get_u32("PIPE_MAX_GAP_HEIGHT")?,
            min_time_between_pipes: settings.get_u32("MIN_TIME_BETWEEN_PIPES")?,
            max_time_between_pipes: settings.get_u32("MAX_TIME_BETWEEN_PIPES")?,
            bird_start_x: settings.get_float("BIRD_START_X_POS")?,
            bird_start_y: settings.get_float("BIRD_START_Y_POS")?,
            bird_radius: settings.get_float("BIRD_RADIUS")?,
            bird_color: settings.get_color("BIRD_COLOR")?,
            bird_gravity: settings.get_float("BIRD_GRAVITY")?,
            bird_flap_force: settings.get_float("BIRD_FLAP_FORCE")?,
            bird_flap_decay: settings.get_float("BIRD_FLAP_DECAY_FORCE")?,
            max_bird_velocity: settings.get_float("BIRD_MAX_Y_VELOCITY")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("screen_width", self.screen_width as f32),
            ("screen_height", self.screen_height as f32),
            ("max_pipe_speed", self.max_pipe_speed),
            ("max_bird_velocity", self.max_bird_velocity),
            ("pipe_width", self.pipe_width as f32),
            ("pipe_min_gap_height", self.pipe_min_gap_height as f32),
            ("bird_radius", self.bird_radius),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value <= 0.0) {
            return Err(ConfigError::Invalid(format!("{name} must be positive")));
        }
        if self.pipe_min_gap_height > self.pipe_max_gap_height {
            return Err(ConfigError::Invalid(
                "pipe_min_gap_height is larger than pipe_max_gap_height".to_string(),
            ));
        }
        if self.min_time_between_pipes > self.max_time_between_pipes {
            return Err(ConfigError::Invalid(
                "min_time_between_pipes is larger than max_time_between_pipes".to_string(),
            ));
        }
        let pipes_and_gap = self
            .pipe_min_height
            .checked_mul(2)
            .and_then(|pipes| pipes.checked_add(self.pipe_max_gap_height));
        if pipes_and_gap.map_or(true, |height| height > self.screen_height) {
            return Err(ConfigError::Invalid(
                "the largest gap doesn't fit between the minimum pipe heights".to_string(),
            ));
        }
        if self.pipe_speed < 0.0 || self.pipe_speed > self.max_pipe_speed {
            return Err(ConfigError::Invalid(
                "pipe_speed must be between 0 and max_pipe_speed".to_string(),
            ));
        }
        Ok(())
    }

    /// Legal gap center range for the given gap height.
    pub fn gap_center_range(&self, gap_height: u32) -> (u32, u32) {
        let edge = self.pipe_min_height.saturating_add(gap_height / 2);
        (edge, self.screen_height.saturating_sub(edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = "
# screen
SCREEN_WIDTH=800
SCREEN_HEIGHT=600
BACKGROUND_COLOR=\"0,0,0\"
START_LEVEL=1
START_SCORE=0
SCORE_PER_LEVEL_UP=10
PIPE_SPEED=200
PIPE_SPEED_INCREASE_PER_LEVEL_UP=25
MAX_PIPE_SPEED=500
PIPE_WIDTH=60
PIPE_MIN_HEIGHT=50
PIPE_MIN_GAP_HEIGHT=120
PIPE_MAX_GAP_HEIGHT=200
MIN_TIME_BETWEEN_PIPES=1000
MAX_TIME_BETWEEN_PIPES=2000
BIRD_START_X_POS=100
BIRD_START_Y_POS=300
BIRD_RADIUS=10
BIRD_COLOR=255, 255, 0
BIRD_GRAVITY=0.5
BIRD_FLAP_FORCE=8
BIRD_FLAP_DECAY_FORCE=0.9
BIRD_MAX_Y_VELOCITY=12
";

    #[test]
    fn test_typed_accessors() {
        let settings = Settings::parse(SETTINGS);
        assert_eq!(settings.get_int("SCREEN_WIDTH").unwrap(), 800);
        assert_eq!(settings.get_float("BIRD_GRAVITY").unwrap(), 0.5);
        assert_eq!(settings.get_tuple("BIRD_COLOR").unwrap(), vec![255, 255, 0]);
        assert_eq!(settings.get_string("BACKGROUND_COLOR").unwrap(), "0,0,0");
    }

    #[test]
    fn test_missing_key() {
        let settings = Settings::parse("SCREEN_WIDTH=800");
        assert!(matches!(
            settings.get_int("SCREEN_HEIGHT"),
            Err(ConfigError::MissingKey(key)) if key == "SCREEN_HEIGHT"
        ));
        assert!(matches!(
            GameConfig::from_settings(&settings),
            Err(ConfigError::MissingKey(_))
        ));
    }

    #[test]
    fn test_unparsable_value() {
        let settings = Settings::parse("PIPE_WIDTH=wide\nBIRD_COLOR=1,x,3");
        assert!(matches!(
            settings.get_int("PIPE_WIDTH"),
            Err(ConfigError::Unparsable { .. })
        ));
        assert!(matches!(
            settings.get_tuple("BIRD_COLOR"),
            Err(ConfigError::Unparsable { .. })
        ));
    }

    #[test]
    fn test_game_config_from_settings() {
        let config = GameConfig::from_settings(&Settings::parse(SETTINGS)).unwrap();
        assert_eq!(config.screen_height, 600);
        assert_eq!(config.pipe_width, 60);
        assert_eq!(config.bird_color, [255, 255, 0]);
        assert_eq!(config.max_bird_velocity, 12.0);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_denominators_are_rejected() {
        let config = GameConfig {
            max_bird_velocity: 0.0,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let config = GameConfig {
            screen_width: 0,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_gap_center_range() {
        let config = GameConfig::default();
        assert_eq!(config.gap_center_range(150), (125, 475));
        assert_eq!(config.gap_center_range(131), (115, 485));
        assert_eq!(config.gap_center_range(u32::MAX), (u32::MAX, 0));
    }

    #[test]
    fn test_huge_pipe_heights_are_rejected() {
        let config = GameConfig {
            pipe_min_height: u32::MAX / 2 + 1,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let config = GameConfig {
            pipe_min_height: u32::MAX / 2,
            pipe_max_gap_height: u32::MAX,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
