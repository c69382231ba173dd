//! Cosine-similarity ranking over the loaded chunk embeddings.

/// Minimum score a chunk must strictly exceed to count as relevant context.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.3;

/// Default number of chunks handed to the answer composer.
pub const DEFAULT_TOP_K: usize = 3;

/// Retrieval knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Upper bound on returned results.
    pub top_k: usize,
    /// Exclusive lower bound on similarity.
    pub relevance_threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }
}

/// Chunk text paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Position of the chunk in the store.
    pub index: usize,
    /// Chunk text.
    pub text: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Cosine of the angle between `a` and `b`.
///
/// Mismatched lengths and zero vectors score `0.0`, which never clears the
/// relevance threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0) as f32
}

/// Scores every embedding against `query` and returns the indices of the
/// best matches above the threshold, highest first.
///
/// Ties keep ascending index order.
pub fn rank(query: &[f32], embeddings: &[Vec<f32>], config: &SearchConfig) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = embeddings
        .iter()
        .enumerate()
        .map(|(idx, embedding)| (idx, cosine_similarity(query, embedding)))
        .filter(|&(_, score)| score > config.relevance_threshold)
        .collect();
    // stable: equal scores stay in index order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(config.top_k);
    scored
}
