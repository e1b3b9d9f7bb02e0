use std::path::Path;

use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use tracing::info;

use crate::machine_learning::nn::{
    loss::LossFunction,
    model_config::NNModelConfig,
    nn_model::{NNModel, Optimizer},
    optimizer::AdamOptimizer,
};

use super::rl_error::{RLError, RLResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelShape {
    pub feature_size: usize,
    pub action_size: u32,
    pub hidden_layers: Vec<usize>,
}

/// Value approximator used by the agents: one prediction slot per action.
pub trait RLModel: Sized + Sync {
    /// Loads the model from `path` when the file exists, otherwise builds a fresh one seeded
    /// with `seed`.
    fn init(path: Option<&Path>, shape: &ModelShape, seed: u64) -> RLResult<Self>;
    fn save_model(&self, path: &Path) -> RLResult<()>;
    fn predict(&self, observation: &[f32]) -> RLResult<Vec<f32>>;
    /// Fits the model once towards `targets` and returns the batch loss.
    fn optimize(
        &mut self,
        observations: &[Vec<f32>],
        targets: &[Vec<f32>],
        lr: f32,
    ) -> RLResult<f32>;
}

impl RLModel for NNModel {
    fn init(path: Option<&Path>, shape: &ModelShape, seed: u64) -> RLResult<Self> {
        let config = match path {
            Some(path) if path.exists() => {
                info!("Loading model from {}", path.display());
                let config = NNModelConfig::load(path)?;
                if config.input_size() != shape.feature_size {
                    return Err(RLError::FeatureSizeMismatch {
                        expected: shape.feature_size,
                        received: config.input_size(),
                    });
                }
                let output_size = config.output_size()?;
                if output_size != shape.action_size as usize {
                    return Err(RLError::ActionSizeMismatch {
                        expected: shape.action_size as usize,
                        received: output_size,
                    });
                }
                config
            }
            _ => {
                let mut rng = XorShiftRng::seed_from_u64(seed);
                NNModelConfig::dense(
                    &mut rng,
                    shape.feature_size,
                    &shape.hidden_layers,
                    shape.action_size as usize,
                )
            }
        };
        Ok(NNModel::from_config(
            config,
            Optimizer::Adam(AdamOptimizer::default()),
        )?)
    }

    fn save_model(&self, path: &Path) -> RLResult<()> {
        self.as_config().save(path)?;
        Ok(())
    }

    fn predict(&self, observation: &[f32]) -> RLResult<Vec<f32>> {
        if observation.len() != self.input_size() {
            return Err(RLError::FeatureSizeMismatch {
                expected: self.input_size(),
                received: observation.len(),
            });
        }
        Ok(self.forward(observation)?)
    }

    fn optimize(
        &mut self,
        observations: &[Vec<f32>],
        targets: &[Vec<f32>],
        lr: f32,
    ) -> RLResult<f32> {
        Ok(self.train_batch(observations, targets, LossFunction::MSE, lr)?)
    }
}
