mod agent_engine;
mod bird;
mod collision;
mod config;
mod engine;
mod environment_state;
mod error;
mod game_engine;
mod game_model;
mod info;
mod input;
mod pipe;
mod render_engine;
mod trainer;
mod training_log;
mod watch_engine;

pub use environment_state::FeatureProfile;
pub use error::{FlappyError, Result};
pub use pipe::{DistanceMode, GapSizeMode, PipeColor, SpawnSettings};
pub use trainer::{ExplorationSchedule, RewardScheme, TrainerConfig};

use agent_engine::TrainingEngine;
use config::{GameConfig, Settings};
use environment_state::FeatureEncoder;
use flappylearn::machine_learning::{
    nn::nn_model::NNModel,
    reinforcement_learning::{
        environment::RLAction,
        q_learning::dqnet::{AgentConfig, DQNAgent, LearningRateScheduler},
        rl_model::{ModelShape, RLModel},
    },
};
use game_model::GameManager;
use input::handle_events;
use trainer::{Curriculum, CurriculumTrainer};
use training_log::TrainingLog;
use tracing::info;
use tracing_subscriber::EnvFilter;
use watch_engine::WatchEngine;

use crate::{FlappyArgs, FlappyMode, TrainingArgs};

use self::{
    engine::{Engine, DELTA_TIME},
    environment_state::FlappyAction,
    game_engine::GameEngine,
    render_engine::RenderEngine,
};
use std::{
    fs::File,
    io,
    path::Path,
    sync::Mutex,
    time::{Duration, Instant},
};

const LOG_FILE: &str = "flappy_trainer.log";

pub fn game_loop(game_args: FlappyArgs) -> Result<()> {
    let headless = matches!(
        &game_args.mode,
        FlappyMode::Train { training_args } if !training_args.dashboard
    );
    init_logging(if headless { None } else { Some(Path::new(LOG_FILE)) })?;
    let config = load_config(game_args.settings.as_deref())?;

    match game_args.mode {
        FlappyMode::Train { training_args } if headless => train(training_args, config),
        mode => {
            let mut render_engine = RenderEngine::init_render_engine()?;
            let result = run_tui_mode(mode, config, &mut render_engine);
            render_engine.deinit_render_engine()?;
            result
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        // the terminal belongs to the TUI
        Some(path) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(File::create(path)?))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }
    Ok(())
}

fn load_config(settings: Option<&Path>) -> Result<GameConfig> {
    let config = match settings {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            GameConfig::from_settings(&Settings::load(path)?)?
        }
        None => GameConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run_tui_mode(
    mode: FlappyMode,
    config: GameConfig,
    render_engine: &mut RenderEngine,
) -> Result<()> {
    match mode {
        FlappyMode::Play { spawn_args, seed } => {
            let mut game_engine = GameEngine::new(config, spawn_args.into(), seed);
            engine_loop(&mut game_engine, render_engine)
        }
        FlappyMode::Watch {
            file,
            profile,
            action_tick,
            spawn_args,
            seed,
        } => {
            if !file.exists() {
                return Err(FlappyError::MissingModel(file));
            }
            let encoder = FeatureEncoder::new(profile, &config);
            let model = NNModel::init(Some(&file), &model_shape(&encoder, vec![]), seed)?;
            let game = GameManager::new(config, spawn_args.into(), seed);
            let mut watch_engine = WatchEngine::new(game, model, encoder, action_tick);
            engine_loop(&mut watch_engine, render_engine)
        }
        FlappyMode::Train { training_args } => {
            let curriculum = load_curriculum(training_args.curriculum.as_deref())?;
            let save_model = Some(training_args.save_model.clone());
            let trainer = build_trainer(&training_args, config)?;
            let mut training_engine = TrainingEngine::new(trainer, curriculum, save_model);
            engine_loop(&mut training_engine, render_engine)
        }
    }
}

fn engine_loop<E: Engine>(engine: &mut E, render_engine: &mut RenderEngine) -> Result<()> {
    let frame_time = Duration::from_secs_f32(DELTA_TIME);
    let mut should_quit = false;
    while !should_quit {
        let frame_start = Instant::now();
        // rendering
        render_engine.render(|frame| engine.render_frame(frame))?;
        // tick
        let user_input = handle_events(frame_time.saturating_sub(frame_start.elapsed()))?;
        should_quit = engine.tick(user_input)?;
    }
    Ok(())
}

fn train(training_args: TrainingArgs, config: GameConfig) -> Result<()> {
    let curriculum = load_curriculum(training_args.curriculum.as_deref())?;
    let mut trainer = build_trainer(&training_args, config)?;
    info!(
        stages = curriculum.stages.len(),
        episodes = curriculum.total_episodes(),
        "Starting training"
    );
    trainer.run(&curriculum, |_, _| false)?;
    trainer.save_model(&training_args.save_model)
}

fn load_curriculum(path: Option<&Path>) -> Result<Curriculum> {
    match path {
        Some(path) => {
            info!("Loading curriculum from {}", path.display());
            Curriculum::load(path)
        }
        None => Ok(Curriculum::default()),
    }
}

fn model_shape(encoder: &FeatureEncoder, hidden_layers: Vec<usize>) -> ModelShape {
    ModelShape {
        feature_size: encoder.feature_size(),
        action_size: FlappyAction::SIZE,
        hidden_layers,
    }
}

fn build_trainer(
    training_args: &TrainingArgs,
    config: GameConfig,
) -> Result<CurriculumTrainer<NNModel>> {
    let (lr_scheduler, agent_config, trainer_config): (
        LearningRateScheduler,
        AgentConfig,
        TrainerConfig,
    ) = training_args.into();
    let encoder = FeatureEncoder::new(training_args.profile, &config);
    let shape = model_shape(&encoder, training_args.hidden_layers.clone());
    let model = NNModel::init(
        training_args.load_model.as_deref(),
        &shape,
        training_args.seed,
    )?;
    let agent = DQNAgent::new(model, agent_config, lr_scheduler);
    let game = GameManager::new(config, SpawnSettings::default(), training_args.seed);
    let trainer = CurriculumTrainer::new(agent, game, encoder, trainer_config);
    Ok(match training_args.training_log.as_ref() {
        Some(path) => trainer.with_log(TrainingLog::open(path)?),
        None => trainer,
    })
}
