// environment_state.rs

use clap::ValueEnum;
use flappylearn::machine_learning::reinforcement_learning::environment::{RLAction, RLState};
use serde::{Deserialize, Serialize};

use super::{config::GameConfig, game_model::GameManager, pipe::Pipe};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlappyAction {
    NoFlap,
    Flap,
}

impl RLAction for FlappyAction {
    const SIZE: u32 = 2;
}

impl From<u32> for FlappyAction {
    fn from(value: u32) -> Self {
        if value == 1 {
            FlappyAction::Flap
        } else {
            FlappyAction::NoFlap
        }
    }
}

impl From<FlappyAction> for u32 {
    fn from(value: FlappyAction) -> Self {
        match value {
            FlappyAction::NoFlap => 0,
            FlappyAction::Flap => 1,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureProfile {
    /// Bird and the nearest pipe
    #[default]
    Compact,
    /// Compact plus the second nearest pipe
    Extended,
}

impl FeatureProfile {
    pub fn feature_size(&self) -> usize {
        match self {
            FeatureProfile::Compact => 6,
            FeatureProfile::Extended => 9,
        }
    }
}

/// Raw (unnormalized) description of one upcoming pipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipeFeatures {
    pub distance: f32,
    pub gap_center: f32,
    pub gap_height: f32,
}

impl PipeFeatures {
    /// Used when there is no such pipe.
    pub fn sentinel(config: &GameConfig) -> Self {
        Self {
            distance: config.screen_width as f32,
            gap_center: (config.screen_height / 2) as f32,
            gap_height: (config.screen_height / 4) as f32,
        }
    }

    fn of(pipe: &Pipe, bird_x: f32) -> Self {
        Self {
            distance: pipe.trailing_edge() - bird_x,
            gap_center: pipe.gap_center() as f32,
            gap_height: pipe.gap_height() as f32,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnvironmentState {
    alive: bool,
    bird_y: f32,
    bird_velocity: f32,
    pipe_speed: f32,
    nearest: PipeFeatures,
    second_nearest: PipeFeatures,
    features: Vec<f32>,
}

impl EnvironmentState {
    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn bird_y(&self) -> f32 {
        self.bird_y
    }

    pub fn bird_velocity(&self) -> f32 {
        self.bird_velocity
    }

    pub fn pipe_speed(&self) -> f32 {
        self.pipe_speed
    }

    pub fn nearest(&self) -> PipeFeatures {
        self.nearest
    }

    pub fn second_nearest(&self) -> PipeFeatures {
        self.second_nearest
    }

    pub fn features(&self) -> &[f32] {
        &self.features
    }
}

impl AsRef<[f32]> for EnvironmentState {
    fn as_ref(&self) -> &[f32] {
        &self.features
    }
}

impl RLState for EnvironmentState {
    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Normalizes the raw state into the feature vector of the chosen profile. The configuration is
/// validated before this is built so every divisor is positive.
#[derive(Clone, Debug)]
pub struct FeatureEncoder {
    profile: FeatureProfile,
    screen_width: f32,
    screen_height: f32,
    max_bird_velocity: f32,
    max_pipe_speed: f32,
}

impl FeatureEncoder {
    pub fn new(profile: FeatureProfile, config: &GameConfig) -> Self {
        Self {
            profile,
            screen_width: config.screen_width as f32,
            screen_height: config.screen_height as f32,
            max_bird_velocity: config.max_bird_velocity,
            max_pipe_speed: config.max_pipe_speed,
        }
    }

    pub fn feature_size(&self) -> usize {
        self.profile.feature_size()
    }

    fn encode(
        &self,
        bird_y: f32,
        bird_velocity: f32,
        pipe_speed: f32,
        nearest: &PipeFeatures,
        second_nearest: &PipeFeatures,
    ) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.feature_size());
        features.extend([
            bird_y / self.screen_height,
            bird_velocity / self.max_bird_velocity,
            pipe_speed / self.max_pipe_speed,
        ]);
        let pipes = match self.profile {
            FeatureProfile::Compact => vec![nearest],
            FeatureProfile::Extended => vec![nearest, second_nearest],
        };
        for pipe in pipes {
            features.extend([
                pipe.distance / self.screen_width,
                pipe.gap_center / self.screen_height,
                pipe.gap_height / self.screen_height,
            ]);
        }
        features
    }
}

/// Snapshot of the game as the agent sees it. Passed pipes are ignored.
pub fn extract(game: &GameManager, encoder: &FeatureEncoder) -> EnvironmentState {
    let bird = game.bird();
    let upcoming = game.upcoming_pipes();
    let describe = |index: usize| {
        upcoming
            .get(index)
            .map(|pipe| PipeFeatures::of(pipe, bird.x()))
            .unwrap_or_else(|| PipeFeatures::sentinel(game.config()))
    };
    let nearest = describe(0);
    let second_nearest = describe(1);
    let features = encoder.encode(
        bird.y(),
        bird.velocity(),
        game.pipe_speed(),
        &nearest,
        &second_nearest,
    );
    EnvironmentState {
        alive: bird.is_alive(),
        bird_y: bird.y(),
        bird_velocity: bird.velocity(),
        pipe_speed: game.pipe_speed(),
        nearest,
        second_nearest,
        features,
    }
}

#[cfg(test)]
mod tests {
    use crate::flappy::pipe::{DistanceMode, SpawnSettings};

    use super::*;

    fn config() -> GameConfig {
        GameConfig {
            screen_width: 800,
            screen_height: 600,
            pipe_width: 50,
            pipe_speed: 100.0,
            max_pipe_speed: 400.0,
            max_bird_velocity: 10.0,
            bird_start_x: 100.0,
            bird_start_y: 300.0,
            bird_gravity: 0.0,
            ..GameConfig::default()
        }
    }

    fn game() -> GameManager {
        let settings = SpawnSettings {
            distance_mode: DistanceMode::Large,
            ..SpawnSettings::default()
        };
        let mut game = GameManager::new(config(), settings, 0);
        game.start_game();
        game
    }

    #[test]
    fn test_sentinels_without_pipes() {
        let game = game();
        let state = extract(&game, &FeatureEncoder::new(FeatureProfile::Extended, &config()));
        let sentinel = PipeFeatures {
            distance: 800.0,
            gap_center: 300.0,
            gap_height: 150.0,
        };
        assert_eq!(state.nearest(), sentinel);
        assert_eq!(state.second_nearest(), sentinel);
        assert!(state.alive());
    }

    #[test]
    fn test_nearest_pipe_ignores_passed() {
        let mut game = game();
        game.spawn_pipe_at(0.0, 300, 150).unwrap();
        game.spawn_pipe_at(400.0, 250, 140).unwrap();
        // moves 10 px, the first pipe is passed
        game.update(0.1);
        let state = extract(&game, &FeatureEncoder::new(FeatureProfile::Compact, &config()));
        assert_eq!(
            state.nearest(),
            PipeFeatures {
                distance: 390.0 + 50.0 - 100.0,
                gap_center: 250.0,
                gap_height: 140.0,
            }
        );
        assert_eq!(state.second_nearest(), PipeFeatures::sentinel(&config()));
    }

    #[test]
    fn test_compact_normalization() {
        let mut game = game();
        game.spawn_pipe_at(450.0, 300, 150).unwrap();
        let state = extract(&game, &FeatureEncoder::new(FeatureProfile::Compact, &config()));
        assert_eq!(state.features().len(), 6);
        let expected = [
            300.0 / 600.0,
            0.0,
            100.0 / 400.0,
            400.0 / 800.0,
            300.0 / 600.0,
            150.0 / 600.0,
        ];
        assert_eq!(state.features(), &expected);
    }

    #[test]
    fn test_extended_profile_adds_second_pipe() {
        let mut game = game();
        game.spawn_pipe_at(450.0, 300, 150).unwrap();
        game.spawn_pipe_at(750.0, 200, 140).unwrap();
        let state = extract(&game, &FeatureEncoder::new(FeatureProfile::Extended, &config()));
        assert_eq!(state.features().len(), 9);
        assert_eq!(state.as_ref()[3], 400.0 / 800.0);
        assert_eq!(state.as_ref()[6], 700.0 / 800.0);
        assert_eq!(state.as_ref()[7], 200.0 / 600.0);
        assert_eq!(state.as_ref()[8], 140.0 / 600.0);
    }

    #[test]
    fn test_all_pipes_passed_falls_back_to_sentinels() {
        let mut game = game();
        game.spawn_pipe_at(0.0, 300, 150).unwrap();
        game.spawn_pipe_at(20.0, 300, 150).unwrap();
        game.update(0.1);
        assert_eq!(game.score(), 2);
        assert_eq!(game.pipes().len(), 2);
        let state = extract(&game, &FeatureEncoder::new(FeatureProfile::Extended, &config()));
        let sentinel = PipeFeatures::sentinel(&config());
        assert_eq!(state.nearest(), sentinel);
        assert_eq!(state.second_nearest(), sentinel);
        assert_eq!(&state.features()[3..6], &state.features()[6..9]);
    }

    #[test]
    fn test_action_indices() {
        assert_eq!(FlappyAction::from(0), FlappyAction::NoFlap);
        assert_eq!(FlappyAction::from(1), FlappyAction::Flap);
        assert_eq!(u32::from(FlappyAction::Flap), 1);
        assert_eq!(FlappyAction::NoFlap.index(), 0);
    }
}
