//! Text embedding backends.

pub mod openai;

use tracing::debug;

use crate::error::EmbeddingError;

/// Fixed-length vector produced for one input text.
pub type Embedding = Vec<f32>;

/// Converts text into embedding vectors, preserving input order.
pub trait Embedder {
    /// Maximum number of inputs sent in one request.
    fn batch_size(&self) -> usize;

    /// Embeds one request's worth of inputs.
    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Embeds every text in `batch_size` slices. The first failing batch aborts
    /// the whole call and the partial output is dropped.
    fn embed_all(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let batch_size = self.batch_size().max(1);
        let mut vectors = Vec::with_capacity(texts.len());
        for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
            let inputs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let embedded = self.embed_batch(&inputs)?;
            if embedded.len() != inputs.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: inputs.len(),
                    got: embedded.len(),
                });
            }
            vectors.extend(embedded);
            debug!(
                batch = batch_no + 1,
                embedded = vectors.len(),
                total = texts.len(),
                "embedded batch"
            );
        }
        Ok(vectors)
    }

    /// Embeds a single text, e.g. a query.
    fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text])?;
        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            got => Err(EmbeddingError::CountMismatch { expected: 1, got }),
        }
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn batch_size(&self) -> usize {
        (**self).batch_size()
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        (**self).embed_batch(inputs)
    }
}
