use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    ReLU,
    Sigmoid,
    Tanh,
}

impl Activation {
    pub fn forward(&self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => Self::sigmoid(x),
            Activation::ReLU => f32::max(0.0, x),
            Activation::Tanh => x.tanh(),
        }
    }

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }

    /// Derivative with respect to the pre-activation value `x`.
    pub fn backward(&self, x: f32) -> f32 {
        match self {
            Activation::ReLU => match x {
                x if x > 0.0 => 1.0,
                _ => 0.0,
            },
            Activation::Sigmoid => {
                let sigma = Self::sigmoid(x);
                sigma * (1.0 - sigma)
            }
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }
}
