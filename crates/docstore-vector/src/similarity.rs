/// Euclidean norm, accumulated in f64.
pub fn norm(v: &[f32]) -> f64 {
	v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt()
}

pub fn dot(a: &[f32], b: &[f32]) -> f64 {
	a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum()
}

/// Cosine similarity given precomputed norms. A zero-norm side scores 0;
/// the result is clamped to [-1, 1] to absorb rounding.
pub fn cosine_with_norms(a: &[f32], b: &[f32], norm_a: f64, norm_b: f64) -> f32 {
	if norm_a == 0.0 || norm_b == 0.0 { return 0.0; }
	(dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 { cosine_with_norms(a, b, norm(a), norm(b)) }
