use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    activation::Activation,
    nn_error::{NNError, Result},
    weight_initialization::{he_uniform, lecun_uniform},
};

/// The configuration to represent a dense neural network model. This is also the on-disk format
/// of a trained model.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct NNModelConfig {
    input_size: usize,
    layer_configs: Vec<DenseConfig>,
}

impl NNModelConfig {
    pub fn new(input_size: usize) -> Self {
        Self {
            input_size,
            layer_configs: Vec::new(),
        }
    }

    /// Hidden layers use relu, the output layer is linear.
    pub fn dense<R: Rng>(
        rng: &mut R,
        input_size: usize,
        hidden_layers: &[usize],
        output_size: usize,
    ) -> Self {
        let mut config = Self::new(input_size);
        let layer_sizes = std::iter::once(input_size)
            .chain(hidden_layers.iter().copied())
            .chain(std::iter::once(output_size))
            .collect::<Vec<_>>();
        let layer_count = layer_sizes.len() - 1;
        for (i, (input, output)) in layer_sizes.into_iter().tuple_windows().enumerate() {
            let activation = if i + 1 == layer_count {
                None
            } else {
                Some(Activation::ReLU)
            };
            config.add_layer(DenseConfig::new(rng, input, activation, output));
        }
        config
    }

    pub fn add_layer(&mut self, layer_config: DenseConfig) {
        self.layer_configs.push(layer_config);
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn layer_configs_ref(&self) -> &Vec<DenseConfig> {
        &self.layer_configs
    }

    pub fn layer_configs(self) -> Vec<DenseConfig> {
        self.layer_configs
    }

    pub fn output_size(&self) -> Result<usize> {
        match self.layer_configs.last() {
            None => Err(NNError::EmptyModelConfig),
            Some(layer) => Ok(layer.layer_size),
        }
    }

    /// Checks that every layer consumes what the previous one produces and that the stored
    /// parameters match the declared sizes.
    pub fn validate(&self) -> Result<()> {
        if self.layer_configs.is_empty() {
            return Err(NNError::EmptyModelConfig);
        }
        let mut expected_input = self.input_size;
        for (i, layer) in self.layer_configs.iter().enumerate() {
            let consistent = layer.input_size == expected_input
                && layer.weights.len() == layer.layer_size
                && layer.bias.len() == layer.layer_size
                && layer.weights.iter().all(|w| w.len() == layer.input_size);
            if !consistent {
                return Err(NNError::FaultyModelConfig(i));
            }
            expected_input = layer.layer_size;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let model_str = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(model_str.as_bytes())?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut config_str = String::new();
        file.read_to_string(&mut config_str)?;
        let config: NNModelConfig = serde_json::from_str(&config_str)?;
        Ok(config)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseConfig {
    pub activation: Option<Activation>,
    pub layer_size: usize,
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub input_size: usize,
}

impl DenseConfig {
    pub fn new<R: Rng>(
        rng: &mut R,
        input_size: usize,
        activation: Option<Activation>,
        layer_size: usize,
    ) -> Self {
        let weights = (0..layer_size)
            .map(|_| match activation {
                Some(Activation::ReLU) => he_uniform(rng, input_size),
                _ => lecun_uniform(rng, input_size),
            })
            .collect();
        let bias: Vec<f32> = vec![0.0; layer_size];
        Self {
            activation,
            layer_size,
            weights,
            bias,
            input_size,
        }
    }

    pub fn from_initialized(
        input_size: usize,
        activation: Option<Activation>,
        weights: Vec<Vec<f32>>,
        bias: Vec<f32>,
    ) -> Self {
        Self {
            activation,
            layer_size: bias.len(),
            weights,
            bias,
            input_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::*;

    #[test]
    fn test_dense_layer_shapes() {
        let mut rng = XorShiftRng::seed_from_u64(1);
        let config = NNModelConfig::dense(&mut rng, 6, &[16, 8], 2);
        let layers = config.layer_configs_ref();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].input_size, 6);
        assert_eq!(layers[0].activation, Some(Activation::ReLU));
        assert_eq!(layers[1].input_size, 16);
        assert_eq!(layers[2].layer_size, 2);
        assert_eq!(layers[2].activation, None);
        assert_eq!(config.output_size().unwrap(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_rejected() {
        let config = NNModelConfig::new(4);
        assert!(matches!(config.output_size(), Err(NNError::EmptyModelConfig)));
        assert!(matches!(config.validate(), Err(NNError::EmptyModelConfig)));
    }

    #[test]
    fn test_mismatched_layer_is_rejected() {
        let mut config = NNModelConfig::new(3);
        config.add_layer(DenseConfig::from_initialized(
            3,
            None,
            vec![vec![0.1, 0.2]],
            vec![0.0],
        ));
        assert!(matches!(config.validate(), Err(NNError::FaultyModelConfig(0))));
    }

    #[test]
    fn test_save_and_load() {
        let mut rng = XorShiftRng::seed_from_u64(5);
        let config = NNModelConfig::dense(&mut rng, 3, &[4], 2);
        let path = std::env::temp_dir().join("flappylearn_model_config_test.json");
        config.save(&path).unwrap();
        let loaded = NNModelConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.input_size(), 3);
        assert_eq!(
            loaded.layer_configs_ref()[0].weights,
            config.layer_configs_ref()[0].weights
        );
    }
}
