// watch_engine.rs

use flappylearn::machine_learning::reinforcement_learning::{
    q_learning::dqnet::greedy_action, rl_model::RLModel,
};
use ratatui::Frame;
use tracing::info;

use super::{
    engine::{Engine, DELTA_TIME},
    environment_state::{extract, FeatureEncoder, FlappyAction},
    error::Result,
    game_model::{GameManager, GameState},
    input::GameInput,
};

/// Lets a trained model play, restarting after every game over.
pub struct WatchEngine<M: RLModel> {
    game: GameManager,
    model: M,
    encoder: FeatureEncoder,
    action_tick: usize,
    frame: usize,
    games_played: usize,
    best_score: u32,
}

impl<M: RLModel> WatchEngine<M> {
    pub fn new(
        mut game: GameManager,
        model: M,
        encoder: FeatureEncoder,
        action_tick: usize,
    ) -> Self {
        game.start_game();
        Self {
            game,
            model,
            encoder,
            action_tick: action_tick.max(1),
            frame: 0,
            games_played: 0,
            best_score: 0,
        }
    }

    fn restart(&mut self) {
        self.games_played += 1;
        self.best_score = self.best_score.max(self.game.score());
        info!(
            score = self.game.score(),
            best_score = self.best_score,
            "Game {} finished",
            self.games_played
        );
        self.game.start_game();
        self.frame = 0;
    }

    #[cfg(test)]
    pub fn games_played(&self) -> usize {
        self.games_played
    }
}

impl<M: RLModel> Engine for WatchEngine<M> {
    fn tick(&mut self, user_input: Option<GameInput>) -> Result<bool> {
        match user_input {
            Some(GameInput::Quit) => return Ok(true),
            Some(GameInput::Pause) => self.game.handle_event(GameInput::Pause),
            _ => {}
        }
        match self.game.state() {
            GameState::GameOver => self.restart(),
            GameState::Start => self.game.start_game(),
            GameState::Paused => return Ok(false),
            GameState::Running => {}
        }
        self.game.update(DELTA_TIME);
        self.frame += 1;
        if self.game.state() == GameState::Running
            && (self.frame == 1 || self.frame % self.action_tick == 0)
        {
            let state = extract(&self.game, &self.encoder);
            if greedy_action::<_, FlappyAction>(&self.model, state.as_ref())? == FlappyAction::Flap
            {
                self.game.flap();
            }
        }
        Ok(false)
    }

    fn render_frame(&self, frame: &mut Frame) {
        frame.render_widget(&self.game, frame.size());
    }
}
