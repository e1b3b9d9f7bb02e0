use super::{
    activation::Activation,
    loss::LossFunction,
    model_config::{DenseConfig, NNModelConfig},
    neuron::Neuron,
    nn_error::{NNError, Result},
    optimizer::AdamOptimizer,
};

#[derive(Clone, Debug)]
pub enum Optimizer {
    Sgd,
    Adam(AdamOptimizer),
}

#[derive(Clone, Debug)]
pub struct DenseLayer {
    neurons: Vec<Neuron>,
    activation: Option<Activation>,
}

impl DenseLayer {
    // returns the pre-activations and the activations
    fn forward(&self, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let pre_activations = self
            .neurons
            .iter()
            .map(|neuron| neuron.forward(input))
            .collect::<Vec<_>>();
        let activations = match self.activation {
            Some(activation) => pre_activations
                .iter()
                .map(|&z| activation.forward(z))
                .collect(),
            None => pre_activations.clone(),
        };
        (pre_activations, activations)
    }

    // returns the gradient for the layer input
    fn backward(&mut self, input: &[f32], pre_activations: &[f32], output_grads: &[f32]) -> Vec<f32> {
        let mut input_grads = vec![0.0; input.len()];
        for ((neuron, &z), &grad) in self
            .neurons
            .iter_mut()
            .zip(pre_activations)
            .zip(output_grads)
        {
            let grad = match self.activation {
                Some(activation) => grad * activation.backward(z),
                None => grad,
            };
            neuron.backward(input, grad, &mut input_grads);
        }
        input_grads
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }
}

/// Dense feed forward network trained on the cpu.
#[derive(Clone, Debug)]
pub struct NNModel {
    input_size: usize,
    output_size: usize,
    layers: Vec<DenseLayer>,
    optimizer: Optimizer,
    time_step: usize,
}

impl NNModel {
    pub fn from_config(config: NNModelConfig, optimizer: Optimizer) -> Result<Self> {
        config.validate()?;
        let input_size = config.input_size();
        let output_size = config.output_size()?;
        let layers = config
            .layer_configs()
            .into_iter()
            .map(|layer_config| DenseLayer {
                neurons: layer_config
                    .weights
                    .into_iter()
                    .zip(layer_config.bias)
                    .map(|(weights, bias)| Neuron::new_with_weights(weights, bias))
                    .collect(),
                activation: layer_config.activation,
            })
            .collect();
        Ok(Self {
            input_size,
            output_size,
            layers,
            optimizer,
            time_step: 0,
        })
    }

    pub fn as_config(&self) -> NNModelConfig {
        let mut model_config = NNModelConfig::new(self.input_size);
        let mut last_output_size = self.input_size;
        for layer in self.layers.iter() {
            let weights = layer
                .neurons
                .iter()
                .map(|neuron| neuron.weights().clone())
                .collect();
            let bias = layer.neurons.iter().map(|neuron| neuron.bias()).collect();
            model_config.add_layer(DenseConfig::from_initialized(
                last_output_size,
                layer.activation,
                weights,
                bias,
            ));
            last_output_size = layer.neurons.len();
        }
        model_config
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        self.check_input("forward", input)?;
        let output = self
            .layers
            .iter()
            .fold(input.to_vec(), |x, layer| layer.forward(&x).1);
        Ok(output)
    }

    /// One optimizer step over the whole batch. Returns the mean loss of the batch before the
    /// update.
    pub fn train_batch(
        &mut self,
        inputs: &[Vec<f32>],
        targets: &[Vec<f32>],
        loss_function: LossFunction,
        learning_rate: f32,
    ) -> Result<f32> {
        if inputs.len() != targets.len() {
            return Err(NNError::BatchMismatch {
                inputs: inputs.len(),
                targets: targets.len(),
            });
        }
        if inputs.is_empty() {
            return Ok(0.0);
        }
        // a rejected sample must not leave gradients behind for the next batch
        for (input, target) in inputs.iter().zip(targets) {
            self.check_input("train_batch", input)?;
            if target.len() != self.output_size {
                return Err(NNError::InputSizeMismatch {
                    op_name: "train_batch target".to_string(),
                    expected: self.output_size,
                    received: target.len(),
                });
            }
        }
        let mut total_loss = 0.0;
        for (input, target) in inputs.iter().zip(targets) {
            // Forward pass saving each layer input and pre-activation for the backward pass
            let mut layer_inputs = Vec::with_capacity(self.layers.len());
            let mut pre_activations = Vec::with_capacity(self.layers.len());
            let mut x = input.clone();
            for layer in self.layers.iter() {
                let (z, a) = layer.forward(&x);
                layer_inputs.push(x);
                pre_activations.push(z);
                x = a;
            }
            total_loss += loss_function.loss(&x, target);
            let mut grad = loss_function.grad(&x, target);
            for ((layer, layer_input), z) in self
                .layers
                .iter_mut()
                .zip(layer_inputs.iter())
                .zip(pre_activations.iter())
                .rev()
            {
                grad = layer.backward(layer_input, z, &grad);
            }
        }
        self.apply_grads(inputs.len(), learning_rate);
        Ok(total_loss / inputs.len() as f32)
    }

    fn apply_grads(&mut self, batch_size: usize, learning_rate: f32) {
        self.time_step += 1;
        let mut id = 0;
        for layer in self.layers.iter_mut() {
            for neuron in layer.neurons.iter_mut() {
                match &mut self.optimizer {
                    Optimizer::Sgd => neuron.update_weights(batch_size, learning_rate),
                    Optimizer::Adam(adam) => neuron.update_weights_adam(
                        adam,
                        id,
                        batch_size,
                        self.time_step,
                        learning_rate,
                    ),
                }
                id += 1;
            }
        }
    }

    fn check_input(&self, op_name: &str, input: &[f32]) -> Result<()> {
        if input.len() != self.input_size {
            return Err(NNError::InputSizeMismatch {
                op_name: op_name.to_string(),
                expected: self.input_size,
                received: input.len(),
            });
        }
        Ok(())
    }
}
