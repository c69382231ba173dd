//! On-disk snapshot of the chunk list and its embeddings.
//!
//! The artifact is keyed only by its directory. It is not invalidated when the
//! source files change; pass `force_reload` to rebuild it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedder::Embedding;
use crate::error::CacheError;

/// File name of the artifact inside the cache directory.
pub const CACHE_FILE_NAME: &str = "embeddings_cache.bin";

/// Serialized `(chunks, embeddings)` pair, index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Chunk texts in load order.
    pub chunks: Vec<String>,
    /// One vector per chunk.
    pub embeddings: Vec<Embedding>,
}

impl CacheRecord {
    /// A record is usable when both lists are non-empty and equally long.
    pub fn is_usable(&self) -> bool {
        !self.chunks.is_empty() && self.chunks.len() == self.embeddings.len()
    }
}

/// Reads and writes the cache artifact under one directory.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    dir: PathBuf,
}

impl EmbeddingCache {
    /// Points the cache at `dir`; nothing is touched until the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the artifact.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the artifact.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE_NAME)
    }

    /// Loads the record, returning `Ok(None)` when no artifact exists.
    ///
    /// Records that decode but are empty or misaligned are reported as
    /// [`CacheError::Decode`].
    pub fn read(&self) -> Result<Option<CacheRecord>, CacheError> {
        let path = self.path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Read { path, source }),
        };
        let record: CacheRecord =
            bincode::deserialize(&bytes).map_err(|err| CacheError::Decode {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        if !record.is_usable() {
            return Err(CacheError::Decode {
                path,
                reason: format!(
                    "{} chunks vs {} embeddings",
                    record.chunks.len(),
                    record.embeddings.len()
                ),
            });
        }
        debug!(path = %path.display(), chunks = record.chunks.len(), "read cache");
        Ok(Some(record))
    }

    /// Persists `chunks` and `embeddings`, replacing any previous artifact.
    pub fn write(&self, chunks: &[String], embeddings: &[Embedding]) -> Result<(), CacheError> {
        let path = self.path();
        let persist_err = |reason: String| CacheError::Persist {
            path: path.clone(),
            reason,
        };
        fs::create_dir_all(&self.dir).map_err(|err| persist_err(err.to_string()))?;
        let bytes = bincode::serialize(&CacheRecordRef { chunks, embeddings })
            .map_err(|err| persist_err(err.to_string()))?;
        let staging = path.with_extension("bin.tmp");
        fs::write(&staging, bytes).map_err(|err| persist_err(err.to_string()))?;
        fs::rename(&staging, &path).map_err(|err| persist_err(err.to_string()))?;
        debug!(path = %path.display(), chunks = chunks.len(), "wrote cache");
        Ok(())
    }

    /// Deletes the artifact if present.
    pub fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(self.path()) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

// Borrowed twin of `CacheRecord`; bincode encodes both identically.
#[derive(Serialize)]
struct CacheRecordRef<'a> {
    chunks: &'a [String],
    embeddings: &'a [Embedding],
}
