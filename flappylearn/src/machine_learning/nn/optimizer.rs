use std::collections::HashMap;

/// Adam with optional decoupled weight decay and per parameter group gradient norm clipping.
/// Moments are keyed by the parameter group id handed to `step`.
#[derive(Clone, Debug)]
pub struct AdamOptimizer {
    beta_1: f32,
    beta_2: f32,
    epsilon: f32,
    weight_decay: Option<f32>,
    clip_norm: Option<f32>,
    first_moments: HashMap<usize, Vec<f32>>,
    second_moments: HashMap<usize, Vec<f32>>,
}

impl AdamOptimizer {
    pub fn new(
        beta_1: f32,
        beta_2: f32,
        epsilon: f32,
        weight_decay: Option<f32>,
        clip_norm: Option<f32>,
    ) -> Self {
        Self {
            beta_1,
            beta_2,
            epsilon,
            weight_decay,
            clip_norm,
            first_moments: HashMap::new(),
            second_moments: HashMap::new(),
        }
    }

    /// `time_step` starts from 1.
    pub fn step(
        &mut self,
        parameter_id: usize,
        parameters: &mut [f32],
        grads: &[f32],
        time_step: usize,
        learning_rate: f32,
    ) {
        debug_assert_eq!(parameters.len(), grads.len());
        let len = parameters.len();
        // Check if moments exist, if not init to zero
        let first_moment = self
            .first_moments
            .entry(parameter_id)
            .or_insert_with(|| vec![0.0; len]);
        let second_moment = self
            .second_moments
            .entry(parameter_id)
            .or_insert_with(|| vec![0.0; len]);

        // gradient clipping
        let scale = match self.clip_norm {
            Some(clip_norm) => {
                let grad_norm = grads.iter().map(|g| g * g).sum::<f32>().sqrt();
                if grad_norm > clip_norm {
                    clip_norm / grad_norm
                } else {
                    1.0
                }
            }
            None => 1.0,
        };

        let time_step = time_step.max(1) as i32;
        let bias_correction_1 = 1.0 - self.beta_1.powi(time_step);
        let bias_correction_2 = 1.0 - self.beta_2.powi(time_step);

        for (((param, grad), m), v) in parameters
            .iter_mut()
            .zip(grads)
            .zip(first_moment.iter_mut())
            .zip(second_moment.iter_mut())
        {
            let grad = grad * scale;
            *m = self.beta_1 * *m + (1.0 - self.beta_1) * grad;
            *v = self.beta_2 * *v + (1.0 - self.beta_2) * grad * grad;
            let m_hat = *m / bias_correction_1;
            let v_hat = *v / bias_correction_2;
            let decay = self.weight_decay.map_or(0.0, |wd| learning_rate * wd * *param);
            *param -= learning_rate * m_hat / (v_hat.sqrt() + self.epsilon) + decay;
        }
    }
}

impl Default for AdamOptimizer {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8, None, Some(1.0))
    }
}
