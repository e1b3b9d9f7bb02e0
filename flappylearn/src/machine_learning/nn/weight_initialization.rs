use rand::Rng;
use rand_distr::{Distribution, Uniform};

pub fn he_uniform<R: Rng>(rng: &mut R, input_size: usize) -> Vec<f32> {
    // this is used as a default in burn and works well for the relu layers
    let limit = (3.0 / input_size as f32).sqrt();
    let between = Uniform::from(-limit..limit);

    (0..input_size).map(|_| between.sample(rng)).collect()
}

pub fn lecun_uniform<R: Rng>(rng: &mut R, input_size: usize) -> Vec<f32> {
    let limit = (1.0 / input_size as f32).sqrt(); // LeCun uniform limit
    let between = Uniform::from(-limit..limit);

    (0..input_size)
        .map(|_| between.sample(rng))
        .collect::<Vec<f32>>()
}
