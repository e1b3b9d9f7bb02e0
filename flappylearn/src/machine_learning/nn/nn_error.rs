use serde_json::Error as SerdeError;
use std::io::Error as IOError;

#[derive(thiserror::Error, Debug)]
pub enum NNError {
    #[error("Empty model.")]
    EmptyModel,
    #[error("Can't build a model from an empty model config.")]
    EmptyModelConfig,
    #[error("Faulty model config in layer number: {0}.")]
    FaultyModelConfig(usize),
    #[error("Input size mismatch in `{op_name}`. Expected {expected} values but received {received}.")]
    InputSizeMismatch {
        op_name: String,
        expected: usize,
        received: usize,
    },
    #[error("Batch mismatch: {inputs} inputs but {targets} targets.")]
    BatchMismatch { inputs: usize, targets: usize },
    #[error("Couldn't serialize the model.")]
    ModelSerializationError(#[from] SerdeError),
    #[error("IO error")]
    IOError(#[from] IOError),
}

pub type Result<T> = std::result::Result<T, NNError>;
