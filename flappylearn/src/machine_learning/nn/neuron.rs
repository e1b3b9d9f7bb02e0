// neuron.rs

use super::optimizer::AdamOptimizer;

#[derive(Clone, Debug)]
pub struct Neuron {
    weights: Vec<f32>,
    bias: f32,
    grads: Vec<f32>,
    bias_grad: f32,
}

impl Neuron {
    pub fn new_with_weights(weights: Vec<f32>, bias: f32) -> Self {
        let weights_size = weights.len();
        Neuron {
            weights,
            bias,
            grads: vec![0.0; weights_size],
            bias_grad: 0.0,
        }
    }

    pub fn weights(&self) -> &Vec<f32> {
        &self.weights
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn grads(&self) -> &Vec<f32> {
        &self.grads
    }

    pub fn bias_grad(&self) -> f32 {
        self.bias_grad
    }

    pub fn forward(&self, input: &[f32]) -> f32 {
        self.weights
            .iter()
            .zip(input.iter())
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias
    }

    // Accumulates the weight and bias grads and adds this neuron's share of the input grad to
    // `input_grads`
    pub fn backward(&mut self, input: &[f32], grad: f32, input_grads: &mut [f32]) {
        debug_assert_eq!(input.len(), self.weights.len());
        debug_assert_eq!(input_grads.len(), self.weights.len());
        for ((weight_grad, next_grad), (weight, input)) in self
            .grads
            .iter_mut()
            .zip(input_grads.iter_mut())
            .zip(self.weights.iter().zip(input.iter()))
        {
            *weight_grad += grad * input;
            *next_grad += grad * weight;
        }
        self.bias_grad += grad;
    }

    pub fn update_weights(&mut self, batch_size: usize, learning_rate: f32) {
        self.weights
            .iter_mut()
            .zip(self.grads.iter())
            .for_each(|(weight, grad)| *weight -= learning_rate * grad / batch_size as f32);
        self.bias -= learning_rate * self.bias_grad / batch_size as f32;
        self.flush();
    }

    /// Applies the batch averaged grads with Adam. The neuron owns the parameter ids `2 * id` for
    /// the weights and `2 * id + 1` for the bias.
    pub fn update_weights_adam(
        &mut self,
        optimizer: &mut AdamOptimizer,
        id: usize,
        batch_size: usize,
        time_step: usize,
        learning_rate: f32,
    ) {
        let batch_size = batch_size.max(1) as f32;
        let grads = self
            .grads
            .iter()
            .map(|grad| grad / batch_size)
            .collect::<Vec<_>>();
        optimizer.step(2 * id, &mut self.weights, &grads, time_step, learning_rate);
        let bias_grad = [self.bias_grad / batch_size];
        optimizer.step(
            2 * id + 1,
            std::slice::from_mut(&mut self.bias),
            &bias_grad,
            time_step,
            learning_rate,
        );
        self.flush();
    }

    fn flush(&mut self) {
        self.grads.iter_mut().for_each(|grad| *grad = 0.0);
        self.bias_grad = 0.0;
    }
}
