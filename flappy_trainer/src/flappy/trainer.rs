// trainer.rs

use std::{fs, path::Path};

use flappylearn::machine_learning::reinforcement_learning::{
    environment::{Knowledge, Reward},
    q_learning::dqnet::DQNAgent,
    rl_model::RLModel,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    environment_state::{extract, EnvironmentState, FeatureEncoder, FlappyAction},
    error::{FlappyError, Result},
    game_model::{GameManager, GameState},
    pipe::{DistanceMode, GapSizeMode, SpawnSettings},
    training_log::{EpisodeRecord, TrainingLog},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RewardScheme {
    /// +1 for every survived decision, -1 on death.
    Flat,
    /// Survival is rewarded by how much closer the bird got to the center of the nearest gap.
    Shaped { death_penalty: f32, scale: f32 },
}

impl RewardScheme {
    /// `post` is `None` for the terminal decision of an episode.
    pub fn reward(
        &self,
        pre: &EnvironmentState,
        post: Option<&EnvironmentState>,
        screen_height: f32,
    ) -> Reward {
        let Some(post) = post.filter(|post| post.alive()) else {
            return match self {
                RewardScheme::Flat => -1.0,
                RewardScheme::Shaped { death_penalty, .. } => -death_penalty,
            };
        };
        match self {
            RewardScheme::Flat => 1.0,
            RewardScheme::Shaped { scale, .. } => {
                let before = (pre.bird_y() - pre.nearest().gap_center).abs();
                let after = (post.bird_y() - post.nearest().gap_center).abs();
                scale * (before - after) / screen_height
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub episodes: usize,
    /// The agent decides on the first frame and on every `action_tick`th frame.
    pub action_tick: usize,
    pub frame_cap: usize,
    #[serde(flatten)]
    pub spawn: SpawnSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub stages: Vec<Stage>,
}

impl Curriculum {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let curriculum: Curriculum = serde_json::from_str(contents)?;
        curriculum.validate()?;
        Ok(curriculum)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(FlappyError::InvalidCurriculum(
                "at least one stage is needed".to_string(),
            ));
        }
        for stage in self.stages.iter() {
            if stage.action_tick == 0 {
                return Err(FlappyError::InvalidCurriculum(format!(
                    "stage {} has a zero action tick",
                    stage.name
                )));
            }
            if stage.frame_cap == 0 {
                return Err(FlappyError::InvalidCurriculum(format!(
                    "stage {} has a zero frame cap",
                    stage.name
                )));
            }
        }
        Ok(())
    }

    pub fn total_episodes(&self) -> usize {
        self.stages.iter().map(|stage| stage.episodes).sum()
    }
}

impl Default for Curriculum {
    /// Gravity only first, then pipes with wide centered gaps and more variation every stage.
    fn default() -> Self {
        let stage = |name: &str, episodes, frame_cap, spawn| Stage {
            name: name.to_string(),
            episodes,
            action_tick: 5,
            frame_cap,
            spawn,
        };
        Self {
            stages: vec![
                stage(
                    "gravity",
                    50,
                    1000,
                    SpawnSettings {
                        pipes_active: false,
                        ..SpawnSettings::default()
                    },
                ),
                stage(
                    "wide-centered",
                    150,
                    2000,
                    SpawnSettings {
                        gap_size_mode: GapSizeMode::Large,
                        distance_mode: DistanceMode::Large,
                        gaps_centered: true,
                        ..SpawnSettings::default()
                    },
                ),
                stage(
                    "wide-alternating",
                    200,
                    2000,
                    SpawnSettings {
                        gap_size_mode: GapSizeMode::Large,
                        distance_mode: DistanceMode::Large,
                        gaps_alternating: true,
                        ..SpawnSettings::default()
                    },
                ),
                stage(
                    "random-gaps",
                    300,
                    3000,
                    SpawnSettings {
                        distance_mode: DistanceMode::Large,
                        ..SpawnSettings::default()
                    },
                ),
                stage("full-game", 500, 3000, SpawnSettings::default()),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplorationSchedule {
    pub initial: f32,
    /// Multiplier applied after every episode. The agent floors the result at its minimum rate.
    pub decay: f32,
    pub reset_each_stage: bool,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            initial: 1.0,
            decay: 0.995,
            reset_each_stage: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TrainerConfig {
    pub delta_time: f32,
    pub batch_size: usize,
    /// Frames between replays, three action ticks when unset.
    pub replay_interval: Option<usize>,
    pub exploration: ExplorationSchedule,
    pub reward: RewardScheme,
    pub log_every: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            delta_time: 1.0 / 60.0,
            batch_size: 32,
            replay_interval: None,
            exploration: ExplorationSchedule::default(),
            reward: RewardScheme::Flat,
            log_every: 10,
        }
    }
}

/// What the episode hook receives after every finished episode.
#[derive(Clone, Debug)]
pub struct EpisodeReport {
    pub record: EpisodeRecord,
    pub mean_loss: Option<f32>,
    pub learning_rate: f32,
    pub total_episodes: usize,
}

struct PendingDecision {
    pre_state: EnvironmentState,
    action: FlappyAction,
    frame_issued: usize,
}

struct EpisodeOutcome {
    frames: usize,
    score: u32,
    mean_loss: Option<f32>,
}

pub struct CurriculumTrainer<M: RLModel> {
    agent: DQNAgent<EnvironmentState, FlappyAction, M>,
    game: GameManager,
    encoder: FeatureEncoder,
    config: TrainerConfig,
    log: Option<TrainingLog>,
}

impl<M: RLModel> CurriculumTrainer<M> {
    pub fn new(
        agent: DQNAgent<EnvironmentState, FlappyAction, M>,
        game: GameManager,
        encoder: FeatureEncoder,
        config: TrainerConfig,
    ) -> Self {
        Self {
            agent,
            game,
            encoder,
            config,
            log: None,
        }
    }

    pub fn with_log(mut self, log: TrainingLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn agent(&self) -> &DQNAgent<EnvironmentState, FlappyAction, M> {
        &self.agent
    }

    pub fn save_model(&self, path: &Path) -> Result<()> {
        info!("Saving model to {}", path.display());
        Ok(self.agent.save_model(path)?)
    }

    /// Runs every stage of the curriculum. `on_episode` is called after each episode with the
    /// game in its final state and stops the training when it returns true.
    pub fn run<F>(&mut self, curriculum: &Curriculum, mut on_episode: F) -> Result<()>
    where
        F: FnMut(&EpisodeReport, &GameManager) -> bool,
    {
        curriculum.validate()?;
        let total_episodes = curriculum.total_episodes();
        for (index, stage) in curriculum.stages.iter().enumerate() {
            info!(
                stage = %stage.name,
                episodes = stage.episodes,
                action_tick = stage.action_tick,
                "Starting stage {}/{}",
                index + 1,
                curriculum.stages.len()
            );
            self.game.set_spawn_settings(stage.spawn.clone());
            if index == 0 || self.config.exploration.reset_each_stage {
                self.agent
                    .set_exploration_rate(self.config.exploration.initial);
            }
            let mut best_score = 0;
            for episode in 1..=stage.episodes {
                let exploration_rate = self.agent.exploration_rate();
                let outcome = self.run_episode(stage)?;
                best_score = best_score.max(outcome.score);
                let record = EpisodeRecord {
                    stage: stage.name.clone(),
                    episode,
                    exploration_rate,
                    frames_survived: outcome.frames,
                    score: outcome.score,
                };
                debug!(
                    stage = %record.stage,
                    episode,
                    frames = record.frames_survived,
                    score = record.score,
                    loss = ?outcome.mean_loss,
                    "episode finished"
                );
                if self.config.log_every > 0 && episode % self.config.log_every == 0 {
                    info!(
                        stage = %stage.name,
                        exploration_rate,
                        best_score,
                        memory = self.agent.memory().len(),
                        "Episode {episode}/{}",
                        stage.episodes
                    );
                }
                if let Some(log) = self.log.as_mut() {
                    log.append(&record)?;
                }
                self.agent.set_exploration_rate(
                    self.agent.exploration_rate() * self.config.exploration.decay,
                );
                let report = EpisodeReport {
                    record,
                    mean_loss: outcome.mean_loss,
                    learning_rate: self.agent.learning_rate(),
                    total_episodes,
                };
                if on_episode(&report, &self.game) {
                    info!("Training stopped during stage {}", stage.name);
                    return Ok(());
                }
            }
            info!(stage = %stage.name, best_score, "Finished stage");
        }
        Ok(())
    }

    fn run_episode(&mut self, stage: &Stage) -> Result<EpisodeOutcome> {
        self.game.start_game();
        let action_tick = stage.action_tick.max(1);
        let replay_interval = self
            .config
            .replay_interval
            .unwrap_or(3 * action_tick)
            .max(1);
        let mut pending: Vec<PendingDecision> = Vec::new();
        let mut losses = Vec::new();
        let mut frame = 0;
        while self.game.state() == GameState::Running && frame < stage.frame_cap {
            self.game.update(self.config.delta_time);
            frame += 1;
            if frame == 1 || frame % action_tick == 0 {
                let state = extract(&self.game, &self.encoder);
                let (matured, waiting): (Vec<_>, Vec<_>) = pending
                    .into_iter()
                    .partition(|decision| frame - decision.frame_issued >= action_tick);
                pending = waiting;
                for decision in matured {
                    self.resolve(decision, Some(state.clone()));
                }
                if self.game.state() == GameState::Running {
                    let action = self.agent.choose_action(&state)?;
                    if action == FlappyAction::Flap {
                        self.game.flap();
                    }
                    pending.push(PendingDecision {
                        pre_state: state,
                        action,
                        frame_issued: frame,
                    });
                }
            }
            if frame % replay_interval == 0 {
                if let Some(loss) = self.agent.replay(self.config.batch_size)? {
                    losses.push(loss);
                }
            }
        }

        // the latest decision led to the end of the episode
        if let Some(last) = pending.pop() {
            let final_state = extract(&self.game, &self.encoder);
            for decision in pending {
                self.resolve(decision, Some(final_state.clone()));
            }
            self.resolve(last, None);
        }

        let mean_loss = if losses.is_empty() {
            None
        } else {
            Some(losses.iter().sum::<f32>() / losses.len() as f32)
        };
        Ok(EpisodeOutcome {
            frames: frame,
            score: self.game.score(),
            mean_loss,
        })
    }

    fn resolve(&mut self, decision: PendingDecision, post_state: Option<EnvironmentState>) {
        let reward = self.config.reward.reward(
            &decision.pre_state,
            post_state.as_ref(),
            self.game.config().screen_height as f32,
        );
        self.agent.remember(Knowledge::new(
            decision.pre_state,
            decision.action,
            reward,
            post_state,
        ));
    }
}

#[cfg(test)]
mod tests {
    use flappylearn::machine_learning::reinforcement_learning::{
        q_learning::dqnet::{AgentConfig, LearningRateScheduler},
        rl_error::RLResult,
        rl_model::ModelShape,
    };
    use float_cmp::approx_eq;

    use crate::flappy::{config::GameConfig, environment_state::FeatureProfile};

    use super::*;

    // Always prefers not flapping.
    struct NeverFlap;

    impl RLModel for NeverFlap {
        fn init(_path: Option<&Path>, _shape: &ModelShape, _seed: u64) -> RLResult<Self> {
            Ok(NeverFlap)
        }

        fn save_model(&self, _path: &Path) -> RLResult<()> {
            Ok(())
        }

        fn predict(&self, _observation: &[f32]) -> RLResult<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn optimize(
            &mut self,
            _observations: &[Vec<f32>],
            _targets: &[Vec<f32>],
            _lr: f32,
        ) -> RLResult<f32> {
            Ok(0.25)
        }
    }

    fn trainer(config: TrainerConfig) -> CurriculumTrainer<NeverFlap> {
        let agent_config = AgentConfig {
            exploration_rate: 0.0,
            min_exploration_rate: 0.0,
            ..AgentConfig::default()
        };
        let agent = DQNAgent::new(NeverFlap, agent_config, LearningRateScheduler::default());
        let game = GameManager::new(GameConfig::default(), SpawnSettings::default(), 0);
        let encoder = FeatureEncoder::new(FeatureProfile::Compact, &GameConfig::default());
        CurriculumTrainer::new(agent, game, encoder, config)
    }

    fn greedy() -> TrainerConfig {
        TrainerConfig {
            exploration: ExplorationSchedule {
                initial: 0.0,
                decay: 1.0,
                reset_each_stage: false,
            },
            ..TrainerConfig::default()
        }
    }

    fn gravity_stage(action_tick: usize, frame_cap: usize) -> Stage {
        Stage {
            name: "gravity".to_string(),
            episodes: 1,
            action_tick,
            frame_cap,
            spawn: SpawnSettings {
                pipes_active: false,
                ..SpawnSettings::default()
            },
        }
    }

    fn rewards(trainer: &CurriculumTrainer<NeverFlap>) -> Vec<f32> {
        trainer
            .agent()
            .memory()
            .iter()
            .map(|knowledge| knowledge.reward())
            .collect()
    }

    #[test]
    fn test_frame_cap_ends_with_terminal_decision() {
        let mut trainer = trainer(greedy());
        let outcome = trainer.run_episode(&gravity_stage(5, 20)).unwrap();
        assert_eq!(outcome.frames, 20);
        assert_eq!(trainer.game.state(), GameState::Running);
        // decisions on frames 1, 5, 10, 15 and 20
        assert_eq!(rewards(&trainer), vec![1.0, 1.0, 1.0, 1.0, -1.0]);
        let terminal = trainer
            .agent()
            .memory()
            .iter()
            .filter(|knowledge| knowledge.is_terminal())
            .count();
        assert_eq!(terminal, 1);
    }

    #[test]
    fn test_death_resolves_pending_decisions() {
        let mut trainer = trainer(greedy());
        let outcome = trainer.run_episode(&gravity_stage(15, 1000)).unwrap();
        // falling from 300 with 0.5 px per frame of acceleration reaches the floor on frame 34
        assert_eq!(outcome.frames, 34);
        assert_eq!(trainer.game.state(), GameState::GameOver);
        // decisions on frames 1, 15 and 30, the first two mature on frame 30
        assert_eq!(rewards(&trainer), vec![1.0, 1.0, -1.0]);
        let last = trainer.agent().memory().iter().last().unwrap();
        assert!(last.is_terminal());
        assert_eq!(last.action(), FlappyAction::NoFlap);
    }

    #[test]
    fn test_replay_runs_on_interval() {
        let mut trainer = trainer(TrainerConfig {
            batch_size: 2,
            replay_interval: Some(10),
            ..greedy()
        });
        let outcome = trainer.run_episode(&gravity_stage(5, 20)).unwrap();
        // only two decisions are remembered by frame 20
        assert_eq!(outcome.mean_loss, Some(0.25));
    }

    #[test]
    fn test_flat_rewards() {
        let game = GameManager::new(GameConfig::default(), SpawnSettings::default(), 0);
        let encoder = FeatureEncoder::new(FeatureProfile::Compact, game.config());
        let state = extract(&game, &encoder);
        assert_eq!(RewardScheme::Flat.reward(&state, Some(&state), 600.0), 1.0);
        assert_eq!(RewardScheme::Flat.reward(&state, None, 600.0), -1.0);
    }

    #[test]
    fn test_shaped_rewards() {
        let config = GameConfig {
            bird_gravity: 0.0,
            ..GameConfig::default()
        };
        let mut game = GameManager::new(config.clone(), SpawnSettings::default(), 0);
        game.start_game();
        let encoder = FeatureEncoder::new(FeatureProfile::Compact, &config);
        // bird at 300, no pipes so the gap center is the sentinel 300
        let centered = extract(&game, &encoder);
        game.flap();
        game.update(1.0 / 60.0);
        let above = extract(&game, &encoder);
        let scheme = RewardScheme::Shaped {
            death_penalty: 5.0,
            scale: 10.0,
        };
        let moved = 300.0 - above.bird_y();
        assert!(moved > 0.0);
        assert!(approx_eq!(
            f32,
            scheme.reward(&above, Some(&centered), 600.0),
            10.0 * moved / 600.0,
            epsilon = 1e-5
        ));
        assert!(approx_eq!(
            f32,
            scheme.reward(&centered, Some(&above), 600.0),
            -10.0 * moved / 600.0,
            epsilon = 1e-5
        ));
        assert_eq!(scheme.reward(&centered, None, 600.0), -5.0);
    }

    #[test]
    fn test_exploration_decay_and_stage_reset() {
        let curriculum = Curriculum {
            stages: vec![gravity_stage(5, 5), gravity_stage(5, 5)]
                .into_iter()
                .map(|stage| Stage {
                    episodes: 2,
                    ..stage
                })
                .collect(),
        };
        let schedule = |reset_each_stage| ExplorationSchedule {
            initial: 1.0,
            decay: 0.5,
            reset_each_stage,
        };
        let mut rates = Vec::new();
        let mut resetting = trainer(TrainerConfig {
            exploration: schedule(true),
            ..TrainerConfig::default()
        });
        resetting
            .run(&curriculum, |report, _| {
                rates.push(report.record.exploration_rate);
                false
            })
            .unwrap();
        assert_eq!(rates, vec![1.0, 0.5, 1.0, 0.5]);

        rates.clear();
        let mut decaying = trainer(TrainerConfig {
            exploration: schedule(false),
            ..TrainerConfig::default()
        });
        decaying
            .run(&curriculum, |report, _| {
                rates.push(report.record.exploration_rate);
                false
            })
            .unwrap();
        assert_eq!(rates, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn test_hook_stops_training() {
        let curriculum = Curriculum {
            stages: vec![Stage {
                episodes: 10,
                ..gravity_stage(5, 5)
            }],
        };
        let mut trainer = trainer(greedy());
        let mut episodes = 0;
        trainer
            .run(&curriculum, |report, _| {
                episodes += 1;
                assert_eq!(report.total_episodes, 10);
                report.record.episode == 3
            })
            .unwrap();
        assert_eq!(episodes, 3);
    }

    #[test]
    fn test_curriculum_from_json() {
        let json = r#"{
            "stages": [
                {"name": "gravity", "episodes": 3, "action_tick": 4, "frame_cap": 500,
                 "pipes_active": false},
                {"name": "hard", "episodes": 7, "action_tick": 2, "frame_cap": 900,
                 "gap_size_mode": "small", "distance_mode": "small", "gaps_alternating": true}
            ]
        }"#;
        let curriculum = Curriculum::from_json(json).unwrap();
        assert_eq!(curriculum.total_episodes(), 10);
        assert!(!curriculum.stages[0].spawn.pipes_active);
        assert_eq!(curriculum.stages[1].spawn.gap_size_mode, GapSizeMode::Small);
        assert_eq!(curriculum.stages[1].spawn.distance_mode, DistanceMode::Small);
        assert!(curriculum.stages[1].spawn.gaps_alternating);
        assert!(curriculum.stages[1].spawn.pipes_active);
    }

    #[test]
    fn test_curriculum_validation() {
        assert!(Curriculum::default().validate().is_ok());
        assert!(!Curriculum::default().stages[0].spawn.pipes_active);
        assert!(matches!(
            Curriculum { stages: vec![] }.validate(),
            Err(FlappyError::InvalidCurriculum(_))
        ));
        assert!(matches!(
            Curriculum {
                stages: vec![gravity_stage(0, 10)]
            }
            .validate(),
            Err(FlappyError::InvalidCurriculum(_))
        ));
    }
}
