// machine_learning.rs
pub mod nn;
pub mod reinforcement_learning;

#[cfg(test)]
fn compare_outputs(a: &[f32], b: &[f32]) -> bool {
    use float_cmp::{ApproxEq, F32Margin};

    if a.len() != b.len() {
        return false;
    }
    let lax_margin = F32Margin {
        epsilon: 1e-3, // Allows for small numerical errors in very small numbers
        ulps: 50,      // Tolerates rounding errors for larger numbers
    };
    for (&a, &b) in a.iter().zip(b) {
        if !a.approx_eq(b, lax_margin) {
            return false;
        }
    }
    true
}
