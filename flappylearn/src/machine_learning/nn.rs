// nn.rs
pub mod activation;
pub mod loss;
pub mod model_config;
pub mod neuron;
pub mod nn_error;
pub mod nn_model;
pub mod optimizer;
pub mod weight_initialization;

#[cfg(test)]
pub fn vec_compare(va: &[f32], vb: &[f32]) -> bool {
    (va.len() == vb.len()) &&  // zip stops at the shortest
     va.iter()
       .zip(vb)
       .all(|(a,b)| eq_with_nan_eq(*a,*b))
}

#[cfg(test)]
fn eq_with_nan_eq(a: f32, b: f32) -> bool {
    const TOLERANCE: f32 = 0.0001;
    (a.is_nan() && b.is_nan()) || (a - b).abs() <= TOLERANCE
}
