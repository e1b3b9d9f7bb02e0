mod flappy;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use flappy::{
    DistanceMode, ExplorationSchedule, FeatureProfile, FlappyError, GapSizeMode, PipeColor,
    RewardScheme, SpawnSettings, TrainerConfig,
};
use flappylearn::machine_learning::reinforcement_learning::q_learning::dqnet::{
    AgentConfig, LearningRateScheduler,
};

#[derive(Parser)]
#[command(about)]
pub struct FlappyArgs {
    /// KEY=VALUE settings file, the built-in defaults are used without it
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    mode: FlappyMode,
}

#[derive(Subcommand)]
pub enum FlappyMode {
    /// Play with the keyboard
    Play {
        #[command(flatten)]
        spawn_args: SpawnArgs,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Let a trained model play
    Watch {
        file: PathBuf,
        /// Feature profile the model was trained with
        #[arg(value_enum, long, default_value_t = FeatureProfile::Compact)]
        profile: FeatureProfile,
        /// Frames between two decisions of the model
        #[arg(long, default_value_t = 5)]
        action_tick: usize,
        #[command(flatten)]
        spawn_args: SpawnArgs,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Train a model through the curriculum
    Train {
        #[command(flatten)]
        training_args: TrainingArgs,
    },
}

#[derive(Args, Debug)]
pub struct SpawnArgs {
    /// Start without pipes
    #[arg(long)]
    no_pipes: bool,
    #[arg(value_enum, long, default_value_t = GapSizeMode::Random)]
    gap_size: GapSizeMode,
    #[arg(value_enum, long, default_value_t = DistanceMode::Random)]
    distance: DistanceMode,
    /// Keep every gap in the middle of the screen
    #[arg(long)]
    centered_gaps: bool,
    /// Alternate gaps between the upper and the lower part of the screen
    #[arg(long)]
    alternating_gaps: bool,
    /// green or red
    #[arg(long, default_value = "green")]
    pipe_color: PipeColor,
}

impl From<SpawnArgs> for SpawnSettings {
    fn from(value: SpawnArgs) -> Self {
        SpawnSettings {
            pipes_active: !value.no_pipes,
            gap_size_mode: value.gap_size,
            distance_mode: value.distance,
            gaps_centered: value.centered_gaps,
            gaps_alternating: value.alternating_gaps,
            pipe_color: value.pipe_color,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum RewardKind {
    /// +1 for surviving a decision, -1 for dying
    #[default]
    Flat,
    /// Rewards moving towards the center of the next gap
    Shaped,
}

#[derive(Parser, Debug)]
pub struct TrainingArgs {
    /// JSON curriculum, the built-in curriculum is used without it
    #[arg(long)]
    pub curriculum: Option<PathBuf>,

    /// Continue from this model if the file exists
    #[arg(long)]
    pub load_model: Option<PathBuf>,

    #[arg(long, default_value = "flappy_model.json")]
    pub save_model: PathBuf,

    /// Csv file for per episode results
    #[arg(long)]
    pub training_log: Option<PathBuf>,

    /// Show the training dashboard instead of logging to stderr
    #[arg(long)]
    pub dashboard: bool,

    #[arg(value_enum, long, default_value_t = FeatureProfile::Compact)]
    pub profile: FeatureProfile,

    /// Sizes of the hidden layers
    #[arg(long, value_delimiter = ',', default_value = "64,32")]
    pub hidden_layers: Vec<usize>,

    #[arg(value_enum, long, default_value_t = RewardKind::Flat)]
    reward: RewardKind,

    /// Penalty of dying with the shaped reward
    #[arg(long, default_value_t = 1.0)]
    death_penalty: f32,

    /// Multiplier of the shaped survival reward
    #[arg(long, default_value_t = 10.0)]
    shaping_scale: f32,

    /// Discount factor (gamma)
    #[arg(long, default_value_t = 0.95)]
    gamma: f32,

    /// Exploration rate at the start of training (epsilon)
    #[arg(long, default_value_t = 1.0)]
    epsilon: f32,

    #[arg(long, default_value_t = 0.01)]
    min_epsilon: f32,

    /// Epsilon multiplier applied after every episode
    #[arg(long, default_value_t = 0.995)]
    epsilon_decay: f32,

    /// Restore epsilon at the start of every stage
    #[arg(long)]
    reset_epsilon: bool,

    /// Size of the replay buffer
    #[arg(long, default_value_t = 50_000)]
    replay_buffer_size: usize,

    /// Batch size for training
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Frames between replays, three action ticks by default
    #[arg(long)]
    replay_interval: Option<usize>,

    /// Learning rate
    #[arg(long, default_value_t = 0.001)]
    lr: f32,

    /// Learning rate decay step
    #[arg(long, default_value_t = 0.98)]
    step_size: f32,

    /// Learning rate decay interval
    #[arg(long, default_value_t = 10_000)]
    update_interval: usize,

    /// Warmup steps
    #[arg(long, default_value_t = 200)]
    warmup: usize,

    /// Log progress every n episodes
    #[arg(long, default_value_t = 10)]
    log_every: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl From<&TrainingArgs> for (LearningRateScheduler, AgentConfig, TrainerConfig) {
    fn from(value: &TrainingArgs) -> Self {
        let reward = match value.reward {
            RewardKind::Flat => RewardScheme::Flat,
            RewardKind::Shaped => RewardScheme::Shaped {
                death_penalty: value.death_penalty,
                scale: value.shaping_scale,
            },
        };
        let agent_config = AgentConfig {
            gamma: value.gamma,
            exploration_rate: value.epsilon,
            min_exploration_rate: value.min_epsilon,
            memory_size: value.replay_buffer_size,
            seed: value.seed,
        };
        let trainer_config = TrainerConfig {
            batch_size: value.batch_size,
            replay_interval: value.replay_interval,
            exploration: ExplorationSchedule {
                initial: value.epsilon,
                decay: value.epsilon_decay,
                reset_each_stage: value.reset_epsilon,
            },
            reward,
            log_every: value.log_every,
            ..TrainerConfig::default()
        };
        let learning_rate_scheduler = LearningRateScheduler::new(
            value.lr,
            value.step_size,
            value.update_interval,
            value.warmup,
        );
        (learning_rate_scheduler, agent_config, trainer_config)
    }
}

fn main() -> Result<(), FlappyError> {
    let args = FlappyArgs::parse();
    flappy::game_loop(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_args_conversion() {
        let args = FlappyArgs::parse_from([
            "flappy_trainer",
            "train",
            "--reward",
            "shaped",
            "--death-penalty",
            "3",
            "--epsilon-decay",
            "0.9",
            "--hidden-layers",
            "16,8",
            "--reset-epsilon",
        ]);
        let FlappyMode::Train { training_args } = args.mode else {
            panic!("expected train mode");
        };
        assert_eq!(training_args.hidden_layers, vec![16, 8]);
        let (_, agent_config, trainer_config): (LearningRateScheduler, AgentConfig, TrainerConfig) =
            (&training_args).into();
        assert_eq!(agent_config.memory_size, 50_000);
        assert_eq!(
            trainer_config.reward,
            RewardScheme::Shaped {
                death_penalty: 3.0,
                scale: 10.0
            }
        );
        assert_eq!(trainer_config.exploration.decay, 0.9);
        assert!(trainer_config.exploration.reset_each_stage);
    }

    #[test]
    fn test_spawn_args() {
        let args = FlappyArgs::parse_from([
            "flappy_trainer",
            "play",
            "--gap-size",
            "large",
            "--alternating-gaps",
            "--pipe-color",
            "red",
        ]);
        let FlappyMode::Play { spawn_args, .. } = args.mode else {
            panic!("expected play mode");
        };
        let settings = SpawnSettings::from(spawn_args);
        assert!(settings.pipes_active);
        assert_eq!(settings.gap_size_mode, GapSizeMode::Large);
        assert!(settings.gaps_alternating);
        assert_eq!(settings.pipe_color, PipeColor::Red);
    }
}
