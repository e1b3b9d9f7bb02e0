// pipe.rs

use std::str::FromStr;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use super::{collision::Rect, config::GameConfig};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PipeError {
    #[error("Gap height {gap_height} is outside of {min}-{max}")]
    GapHeightOutOfRange { gap_height: u32, min: u32, max: u32 },
    #[error("Gap center {gap_center} is outside of {min}-{max}")]
    GapCenterOutOfRange { gap_center: u32, min: u32, max: u32 },
    #[error("Pipe x position {x} is outside of 0-{max}")]
    PositionOutOfRange { x: f32, max: u32 },
    #[error("Unknown pipe color {0:?}, expected green or red")]
    UnknownColor(String),
}

pub type Result<T> = std::result::Result<T, PipeError>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipeColor {
    #[default]
    Green,
    Red,
}

impl FromStr for PipeColor {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(PipeColor::Green),
            "red" => Ok(PipeColor::Red),
            _ => Err(PipeError::UnknownColor(s.to_string())),
        }
    }
}

/// A top and a bottom pipe sharing one x position with a gap between them.
#[derive(Clone, Debug)]
pub struct Pipe {
    color: PipeColor,
    x: f32,
    gap_center: u32,
    gap_height: u32,
    width: f32,
    screen_height: f32,
    passed: bool,
}

impl Pipe {
    pub fn new(
        config: &GameConfig,
        color: PipeColor,
        x: f32,
        gap_center: u32,
        gap_height: u32,
    ) -> Result<Self> {
        if gap_height < config.pipe_min_gap_height || gap_height > config.pipe_max_gap_height {
            return Err(PipeError::GapHeightOutOfRange {
                gap_height,
                min: config.pipe_min_gap_height,
                max: config.pipe_max_gap_height,
            });
        }
        let (min, max) = config.gap_center_range(gap_height);
        if gap_center < min || gap_center > max {
            return Err(PipeError::GapCenterOutOfRange {
                gap_center,
                min,
                max,
            });
        }
        if !(0.0..=config.screen_width as f32).contains(&x) {
            return Err(PipeError::PositionOutOfRange {
                x,
                max: config.screen_width,
            });
        }
        Ok(Self {
            color,
            x,
            gap_center,
            gap_height,
            width: config.pipe_width as f32,
            screen_height: config.screen_height as f32,
            passed: false,
        })
    }

    pub fn translate(&mut self, distance: f32) {
        self.x -= distance;
    }

    /// Same rounding as `GameConfig::gap_center_range`, an odd gap loses its last pixel.
    fn half_gap(&self) -> f32 {
        (self.gap_height / 2) as f32
    }

    pub fn top_height(&self) -> f32 {
        self.gap_center as f32 - self.half_gap()
    }

    pub fn bottom_height(&self) -> f32 {
        self.screen_height - (self.gap_center as f32 + self.half_gap())
    }

    pub fn top_rect(&self) -> Rect {
        Rect::new(self.x, 0.0, self.width, self.top_height())
    }

    pub fn bottom_rect(&self) -> Rect {
        Rect::new(
            self.x,
            self.gap_center as f32 + self.half_gap(),
            self.width,
            self.bottom_height(),
        )
    }

    pub fn collides_with(&self, rect: &Rect) -> bool {
        rect.intersects(&self.top_rect()) || rect.intersects(&self.bottom_rect())
    }

    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    pub fn is_off_screen(&self) -> bool {
        self.trailing_edge() < 0.0
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn mark_passed(&mut self) {
        self.passed = true;
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn gap_center(&self) -> u32 {
        self.gap_center
    }

    pub fn gap_height(&self) -> u32 {
        self.gap_height
    }

    pub fn color(&self) -> PipeColor {
        self.color
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSizeMode {
    Large,
    Small,
    #[default]
    Random,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    Large,
    Small,
    #[default]
    Random,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    pub pipes_active: bool,
    pub gap_size_mode: GapSizeMode,
    pub distance_mode: DistanceMode,
    pub gaps_centered: bool,
    pub gaps_alternating: bool,
    pub pipe_color: PipeColor,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            pipes_active: true,
            gap_size_mode: GapSizeMode::Random,
            distance_mode: DistanceMode::Random,
            gaps_centered: false,
            gaps_alternating: false,
            pipe_color: PipeColor::Green,
        }
    }
}

/// Decides when the next pipe appears and what it looks like. Time is tracked in milliseconds.
#[derive(Clone, Debug)]
pub struct PipeSpawner {
    settings: SpawnSettings,
    rng: XorShiftRng,
    time_since_last_pipe: f32,
    time_between_pipes: f32,
    upper_band_next: bool,
}

impl PipeSpawner {
    pub fn new(config: &GameConfig, settings: SpawnSettings, seed: u64) -> Self {
        let mut spawner = Self {
            settings,
            rng: XorShiftRng::seed_from_u64(seed),
            time_since_last_pipe: 0.0,
            time_between_pipes: 0.0,
            upper_band_next: true,
        };
        spawner.reset(config);
        spawner
    }

    pub fn reset(&mut self, config: &GameConfig) {
        self.time_since_last_pipe = 0.0;
        self.upper_band_next = true;
        self.time_between_pipes = self.draw_interval(config);
    }

    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, config: &GameConfig, settings: SpawnSettings) {
        self.settings = settings;
        self.reset(config);
    }

    pub fn time_between_pipes(&self) -> f32 {
        self.time_between_pipes
    }

    /// Advances the spawn timer. Returns true when a pipe is due, in which case the timer starts
    /// over and the next interval is drawn.
    pub fn tick(&mut self, config: &GameConfig, delta_time: f32) -> bool {
        self.time_since_last_pipe += delta_time * 1000.0;
        if self.time_since_last_pipe >= self.time_between_pipes {
            self.time_since_last_pipe = 0.0;
            self.time_between_pipes = self.draw_interval(config);
            true
        } else {
            false
        }
    }

    /// Builds the next pipe at the right edge of the screen.
    pub fn spawn(&mut self, config: &GameConfig) -> Result<Pipe> {
        let gap_height = match self.settings.gap_size_mode {
            GapSizeMode::Large => config.pipe_max_gap_height,
            GapSizeMode::Small => config.pipe_min_gap_height,
            GapSizeMode::Random => self
                .rng
                .gen_range(config.pipe_min_gap_height..=config.pipe_max_gap_height),
        };
        let (min_center, max_center) = config.gap_center_range(gap_height);
        let gap_center = if self.settings.gaps_alternating {
            let band = if self.upper_band_next {
                config.screen_height / 3
            } else {
                2 * config.screen_height / 3
            };
            self.upper_band_next = !self.upper_band_next;
            band.clamp(min_center, max_center)
        } else if self.settings.gaps_centered {
            (config.screen_height / 2).clamp(min_center, max_center)
        } else {
            self.rng.gen_range(min_center..=max_center)
        };
        Pipe::new(
            config,
            self.settings.pipe_color,
            config.screen_width as f32,
            gap_center,
            gap_height,
        )
    }

    fn draw_interval(&mut self, config: &GameConfig) -> f32 {
        let interval = match self.settings.distance_mode {
            DistanceMode::Large => config.max_time_between_pipes,
            DistanceMode::Small => config.min_time_between_pipes,
            DistanceMode::Random => self
                .rng
                .gen_range(config.min_time_between_pipes..=config.max_time_between_pipes),
        };
        interval as f32
    }
}
