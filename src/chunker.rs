//! Token-bounded, overlapping text windows for embedding.

use std::ops::Range;

use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::error::ChunkError;

/// Window sizing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Tokens per emitted window.
    pub max_tokens: usize,
    /// Tokens shared by consecutive windows.
    pub overlap: usize,
}

impl ChunkConfig {
    /// Distance between the starts of consecutive windows.
    pub fn stride(&self) -> Result<usize, ChunkError> {
        if self.max_tokens == 0 || self.overlap >= self.max_tokens {
            return Err(ChunkError::InvalidOverlap {
                max_tokens: self.max_tokens,
                overlap: self.overlap,
            });
        }
        Ok(self.max_tokens - self.overlap)
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            overlap: 50,
        }
    }
}

/// Splits documents into overlapping windows over the `cl100k_base` vocabulary.
pub struct Chunker {
    config: ChunkConfig,
    bpe: CoreBPE,
}

impl Chunker {
    /// Builds a chunker, rejecting configurations with a non-positive stride.
    pub fn new(config: ChunkConfig) -> Result<Self, ChunkError> {
        config.stride()?;
        let bpe =
            tiktoken_rs::cl100k_base().map_err(|err| ChunkError::Tokenizer(err.to_string()))?;
        Ok(Self { config, bpe })
    }

    /// Returns the active window configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Number of tokens `text` encodes to.
    pub fn token_count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Splits `text` into decoded token windows, in order.
    pub fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        let tokens = self.bpe.encode_ordinary(text);
        let bounds = window_bounds(tokens.len(), &self.config)?;
        let mut chunks = Vec::with_capacity(bounds.len());
        for range in bounds {
            let window = &tokens[range];
            // A window edge can land inside a multi-byte character; narrow it
            // to the closest decodable span.
            let decoded = edge_trims(window.len()).find_map(|(head, tail)| {
                self.bpe
                    .decode(window[head..window.len() - tail].to_vec())
                    .ok()
            });
            if let Some(piece) = decoded {
                chunks.push(piece);
            }
        }
        debug!(
            tokens = tokens.len(),
            chunks = chunks.len(),
            "chunked document"
        );
        Ok(chunks)
    }
}

fn edge_trims(len: usize) -> impl Iterator<Item = (usize, usize)> {
    const MAX_TRIM: usize = 3;
    (0..=MAX_TRIM)
        .flat_map(|head| (0..=MAX_TRIM).map(move |tail| (head, tail)))
        .filter(move |(head, tail)| head + tail < len)
}

/// Computes the token ranges emitted for a sequence of `len` tokens.
///
/// Windows start at 0 and advance by `max_tokens - overlap`; the walk stops
/// after the first window that reaches the end, so any input no longer than
/// `max_tokens` yields exactly one window and empty input yields none.
pub fn window_bounds(
    len: usize,
    config: &ChunkConfig,
) -> Result<Vec<Range<usize>>, ChunkError> {
    let stride = config.stride()?;
    let mut bounds = Vec::new();
    let mut start = 0usize;
    while start < len {
        let end = (start + config.max_tokens).min(len);
        bounds.push(start..end);
        if end == len {
            break;
        }
        start += stride;
    }
    Ok(bounds)
}
