/// Cosine similarity `dot(a, b) / (|a| * |b|)`, accumulated in `f64`.
///
/// `None` when the lengths differ, either vector has zero magnitude or the
/// result is not finite. Those pairs are unrankable, not "score 0".
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    // rounding can push |score| a hair past 1
    score.is_finite().then(|| score.clamp(-1.0, 1.0) as f32)
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt() as f32
}
