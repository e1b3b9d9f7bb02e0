use crate::machine_learning::nn::nn_error::NNError;

#[derive(thiserror::Error, Debug)]
pub enum RLError {
    #[error("Action out of range got: {value} when max action value is {max}.")]
    ActionOutOfRange { value: u32, max: u32 },
    #[error("Feature size mismatch. The model expects {expected} features but got {received}.")]
    FeatureSizeMismatch { expected: usize, received: usize },
    #[error("Action size mismatch. The model predicts {expected} actions but got {received}.")]
    ActionSizeMismatch { expected: usize, received: usize },
    #[error("Neural network error")]
    NNError(#[from] NNError),
}

pub type RLResult<T> = std::result::Result<T, RLError>;
