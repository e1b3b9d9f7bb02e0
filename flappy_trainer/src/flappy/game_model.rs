use tracing::{debug, error};

use super::{
    bird::Bird,
    collision::{hits_boundary, hits_pipe, score_passed},
    config::GameConfig,
    input::GameInput,
    pipe::{Pipe, PipeSpawner, SpawnSettings},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Start,
    Running,
    Paused,
    GameOver,
}

/// Owns the bird and the pipes and advances them one tick at a time.
#[derive(Clone, Debug)]
pub struct GameManager {
    config: GameConfig,
    state: GameState,
    bird: Bird,
    pipes: Vec<Pipe>,
    spawner: PipeSpawner,
    score: u32,
    level: u32,
    pipe_speed: f32,
    next_level_score: u32,
}

impl GameManager {
    pub fn new(config: GameConfig, spawn_settings: SpawnSettings, seed: u64) -> Self {
        let bird = Bird::new(&config);
        let spawner = PipeSpawner::new(&config, spawn_settings, seed);
        Self {
            state: GameState::Start,
            bird,
            pipes: Vec::new(),
            spawner,
            score: config.start_score,
            level: config.start_level,
            pipe_speed: config.pipe_speed,
            next_level_score: config.start_score + config.score_per_level_up,
            config,
        }
    }

    /// Starts a fresh run, also used for restarting after a game over.
    pub fn start_game(&mut self) {
        self.bird.reset();
        self.pipes.clear();
        self.spawner.reset(&self.config);
        self.score = self.config.start_score;
        self.level = self.config.start_level;
        self.pipe_speed = self.config.pipe_speed;
        self.next_level_score = self.score + self.config.score_per_level_up;
        self.state = GameState::Running;
    }

    pub fn handle_event(&mut self, input: GameInput) {
        match (input, self.state) {
            (GameInput::Flap, GameState::Start | GameState::GameOver) => self.start_game(),
            (GameInput::Flap, GameState::Paused) => self.state = GameState::Running,
            (GameInput::Flap, GameState::Running) => self.bird.flap(),
            (GameInput::Pause, GameState::Running) => self.state = GameState::Paused,
            (GameInput::Pause, GameState::Paused) => self.state = GameState::Running,
            _ => {}
        }
    }

    pub fn flap(&mut self) {
        if self.state == GameState::Running {
            self.bird.flap();
        }
    }

    pub fn update(&mut self, delta_time: f32) {
        if self.state != GameState::Running {
            return;
        }
        self.bird.update(delta_time);
        if self.check_collision() {
            self.game_over();
            return;
        }
        if self.spawner.settings().pipes_active {
            self.update_pipes(delta_time);
        }
        if self.score >= self.next_level_score {
            self.level_up();
        }
    }

    fn check_collision(&self) -> bool {
        hits_boundary(&self.bird, self.config.screen_height as f32)
            || hits_pipe(&self.bird.rect(), &self.pipes)
    }

    fn update_pipes(&mut self, delta_time: f32) {
        let distance = self.pipe_speed * delta_time;
        self.pipes.iter_mut().for_each(|pipe| pipe.translate(distance));
        self.score += score_passed(&mut self.pipes, self.bird.x());
        self.pipes.retain(|pipe| !pipe.is_off_screen());
        if self.spawner.tick(&self.config, delta_time) {
            match self.spawner.spawn(&self.config) {
                Ok(pipe) => self.pipes.push(pipe),
                Err(err) => error!("Dropping pipe spawn: {err}"),
            }
        }
    }

    fn game_over(&mut self) {
        self.bird.die();
        self.state = GameState::GameOver;
        debug!(score = self.score, level = self.level, "game over");
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.pipe_speed = (self.pipe_speed + self.config.pipe_speed_increase_per_level_up)
            .min(self.config.max_pipe_speed);
        self.next_level_score += self.config.score_per_level_up;
    }

    pub fn set_spawn_settings(&mut self, settings: SpawnSettings) {
        self.spawner.set_settings(&self.config, settings);
    }

    /// Inserts a pipe at an explicit position.
    #[cfg(test)]
    pub fn spawn_pipe_at(
        &mut self,
        x: f32,
        gap_center: u32,
        gap_height: u32,
    ) -> super::pipe::Result<()> {
        let pipe = Pipe::new(
            &self.config,
            self.spawner.settings().pipe_color,
            x,
            gap_center,
            gap_height,
        )?;
        self.pipes.push(pipe);
        Ok(())
    }

    /// Unpassed pipes ordered by distance, nearest first.
    pub fn upcoming_pipes(&self) -> Vec<&Pipe> {
        let mut pipes = self
            .pipes
            .iter()
            .filter(|pipe| !pipe.passed())
            .collect::<Vec<_>>();
        pipes.sort_by(|a, b| a.x().total_cmp(&b.x()));
        pipes
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn bird(&self) -> &Bird {
        &self.bird
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn pipe_speed(&self) -> f32 {
        self.pipe_speed
    }

    pub fn next_level_score(&self) -> u32 {
        self.next_level_score
    }

    #[cfg(test)]
    pub fn bird_mut(&mut self) -> &mut Bird {
        &mut self.bird
    }

    #[cfg(test)]
    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }
}
