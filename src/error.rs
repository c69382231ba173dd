//! Error taxonomy shared by the retrieval and answering pipeline.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised while turning text into embedding vectors.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Client construction was rejected (missing key, bad header, ...).
    #[error("invalid embedding client configuration: {0}")]
    Config(String),
    /// The request never produced an HTTP response.
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("embedding service returned {status}: {body}")]
    Status {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Response body, or a placeholder when unreadable.
        body: String,
    },
    /// The response body could not be decoded.
    #[error("failed to decode embedding response: {0}")]
    Decode(String),
    /// The service returned a different number of vectors than inputs sent.
    #[error("embedding service returned {got} vectors for {expected} inputs")]
    CountMismatch {
        /// Number of inputs in the request.
        expected: usize,
        /// Number of vectors in the response.
        got: usize,
    },
}

/// Failures raised by a chat completion provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Client construction was rejected.
    #[error("invalid completion client configuration: {0}")]
    Config(String),
    /// The request never produced an HTTP response.
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("completion service returned {status}: {body}")]
    Status {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Response body, or a placeholder when unreadable.
        body: String,
    },
    /// The response body could not be decoded or carried no text.
    #[error("failed to decode completion response: {0}")]
    Decode(String),
}

/// Failures reading or writing the on-disk embedding cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache artifact exists but could not be read.
    #[error("failed to read cache {path:?}: {source}")]
    Read {
        /// Artifact location.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The cache artifact is malformed or inconsistent.
    #[error("failed to decode cache {path:?}: {reason}")]
    Decode {
        /// Artifact location.
        path: PathBuf,
        /// Why the record was rejected.
        reason: String,
    },
    /// Writing the cache artifact failed.
    #[error("failed to persist cache {path:?}: {reason}")]
    Persist {
        /// Artifact location.
        path: PathBuf,
        /// Why the write failed.
        reason: String,
    },
}

/// Chunker configuration and tokenizer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The window stride would be zero or negative.
    #[error("chunk overlap {overlap} must be smaller than max tokens {max_tokens}")]
    InvalidOverlap {
        /// Window size in tokens.
        max_tokens: usize,
        /// Requested overlap in tokens.
        overlap: usize,
    },
    /// The tokenizer vocabulary could not be initialised.
    #[error("failed to initialise tokenizer: {0}")]
    Tokenizer(String),
}

/// Failures that abort [`crate::DocumentStore::load`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// Every provided source was missing, unreadable, or empty.
    #[error("no documents could be loaded from the provided paths")]
    NoDocumentsLoaded,
    /// The chunker rejected its configuration.
    #[error(transparent)]
    Chunking(#[from] ChunkError),
    /// Embedding the chunks failed; nothing was cached.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Per-query failures surfaced by [`crate::Assistant::answer`].
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The query could not be embedded.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// The completion model call failed.
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
