use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LossFunction {
    MSE,
    MAE,
}

impl LossFunction {
    /// Mean loss over the output values of one sample.
    pub fn loss(&self, pred: &[f32], gt: &[f32]) -> f32 {
        let n = pred.len().max(1) as f32;
        match self {
            LossFunction::MSE => {
                pred.iter()
                    .zip(gt)
                    .map(|(p, t)| (p - t) * (p - t))
                    .sum::<f32>()
                    / n
            }
            LossFunction::MAE => pred.iter().zip(gt).map(|(p, t)| (p - t).abs()).sum::<f32>() / n,
        }
    }

    /// Gradient of `loss` with respect to each prediction.
    pub fn grad(&self, pred: &[f32], gt: &[f32]) -> Vec<f32> {
        let n = pred.len().max(1) as f32;
        match self {
            LossFunction::MSE => pred.iter().zip(gt).map(|(p, t)| 2.0 * (p - t) / n).collect(),
            LossFunction::MAE => pred
                .iter()
                .zip(gt)
                .map(|(p, t)| match p - t {
                    d if d > 0.0 => 1.0 / n,
                    d if d < 0.0 => -1.0 / n,
                    _ => 0.0,
                })
                .collect(),
        }
    }
}
