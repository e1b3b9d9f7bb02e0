// game_engine.rs

use ratatui::Frame;

use super::{
    config::GameConfig,
    engine::{Engine, DELTA_TIME},
    error::Result,
    game_model::GameManager,
    input::GameInput,
    pipe::SpawnSettings,
};

pub struct GameEngine {
    pub game_model: GameManager,
}

impl GameEngine {
    pub fn new(config: GameConfig, spawn_settings: SpawnSettings, seed: u64) -> GameEngine {
        GameEngine {
            game_model: GameManager::new(config, spawn_settings, seed),
        }
    }
}

impl Engine for GameEngine {
    fn tick(&mut self, user_input: Option<GameInput>) -> Result<bool> {
        match user_input {
            Some(GameInput::Quit) => return Ok(true),
            Some(user_input) => self.game_model.handle_event(user_input),
            None => {}
        }
        self.game_model.update(DELTA_TIME);
        Ok(false)
    }

    fn render_frame(&self, frame: &mut Frame) {
        frame.render_widget(&self.game_model, frame.size());
    }
}
