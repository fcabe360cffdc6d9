//! Small dense-vector helpers. Accumulation is done in `f64`.

use distill_shared::{DistillError, Result};

fn check_dims(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(DistillError::contract(format!(
            "vectors must have the same dimensions, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

/// Cosine similarity in `[-1, 1]`. Empty or zero-magnitude vectors give 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    let dot = dot_product(a, b)?;
    // Squared norms under one sqrt keep identical vectors at exactly 1.
    let (sq_a, sq_b) = (dot_product(a, a)?, dot_product(b, b)?);
    if sq_a == 0.0 || sq_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (sq_a * sq_b).sqrt()).clamp(-1.0, 1.0))
}

pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f64> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum())
}

/// Euclidean norm.
pub fn vector_magnitude(v: &[f32]) -> f64 {
    dot_product(v, v).map_or(0.0, f64::sqrt)
}

/// Unit-length copy of `v`; a zero vector stays zero.
pub fn normalize_vector(v: &[f32]) -> Vec<f32> {
    let magnitude = vector_magnitude(v);
    if magnitude == 0.0 {
        return vec![0.0; v.len()];
    }
    v.iter().map(|&x| (f64::from(x) / magnitude) as f32).collect()
}
