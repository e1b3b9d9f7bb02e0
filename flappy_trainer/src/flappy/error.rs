use std::{io, path::PathBuf};

use flappylearn::machine_learning::reinforcement_learning::rl_error::RLError;

use super::{config::ConfigError, pipe::PipeError};

#[derive(thiserror::Error, Debug)]
pub enum FlappyError {
    #[error("Configuration error")]
    Config(#[from] ConfigError),
    #[error("Agent error")]
    RL(#[from] RLError),
    #[error("Pipe error")]
    Pipe(#[from] PipeError),
    #[error("Training log error")]
    Csv(#[from] csv::Error),
    #[error("Curriculum parsing error")]
    Json(#[from] serde_json::Error),
    #[error("Invalid curriculum: {0}")]
    InvalidCurriculum(String),
    #[error("Model file {0:?} doesn't exist")]
    MissingModel(PathBuf),
    #[error("Training thread panicked")]
    TrainingPanicked,
    #[error("IO error")]
    IOError(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FlappyError>;
