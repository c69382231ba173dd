//! In-memory document store backed by the embedding cache.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cache::EmbeddingCache;
use crate::chunker::{ChunkConfig, Chunker};
use crate::embedder::{Embedder, Embedding};
use crate::error::{ChunkError, EmbeddingError, LoadError};
use crate::search::{rank, SearchConfig, SearchResult};

/// Where the state installed by a successful load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Restored from the cache artifact; sources were not read.
    Cache,
    /// Read from the source files and embedded.
    Embedded,
}

/// Summary of a successful [`DocumentStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Origin of the loaded state.
    pub source: LoadSource,
    /// Number of chunks now held.
    pub chunks: usize,
    /// Source files that contributed chunks.
    pub files_read: usize,
    /// Source files skipped as unreadable or empty.
    pub files_skipped: usize,
}

/// Ordered chunks and their index-aligned embeddings.
pub struct DocumentStore {
    chunker: Chunker,
    cache: EmbeddingCache,
    chunks: Vec<String>,
    embeddings: Vec<Embedding>,
}

impl DocumentStore {
    /// Creates an empty store.
    pub fn new(chunk_config: ChunkConfig, cache: EmbeddingCache) -> Result<Self, ChunkError> {
        Ok(Self {
            chunker: Chunker::new(chunk_config)?,
            cache,
            chunks: Vec::new(),
            embeddings: Vec::new(),
        })
    }

    /// Populates the store from the cache, or from `paths` when the cache is
    /// absent, unusable, or `force_reload` is set.
    ///
    /// Unreadable and blank files are skipped. A fresh load that yields no
    /// chunks, or whose embedding fails, leaves the store empty and writes
    /// no cache. Failing to persist the cache is logged and otherwise ignored.
    pub fn load<P, E>(
        &mut self,
        paths: &[P],
        force_reload: bool,
        embedder: &E,
    ) -> Result<LoadReport, LoadError>
    where
        P: AsRef<Path>,
        E: Embedder + ?Sized,
    {
        if !force_reload {
            match self.cache.read() {
                Ok(Some(record)) => {
                    self.chunks = record.chunks;
                    self.embeddings = record.embeddings;
                    info!(
                        chunks = self.chunks.len(),
                        path = %self.cache.path().display(),
                        "restored documents from cache"
                    );
                    return Ok(LoadReport {
                        source: LoadSource::Cache,
                        chunks: self.chunks.len(),
                        files_read: 0,
                        files_skipped: 0,
                    });
                }
                Ok(None) => debug!(path = %self.cache.path().display(), "no cache artifact"),
                Err(err) => warn!(error = %err, "ignoring unusable cache"),
            }
        }

        self.clear();
        let mut chunks = Vec::new();
        let mut files_read = 0usize;
        let mut files_skipped = 0usize;
        for path in paths {
            let path = path.as_ref();
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable document");
                    files_skipped += 1;
                    continue;
                }
            };
            if text.trim().is_empty() {
                warn!(path = %path.display(), "skipping empty document");
                files_skipped += 1;
                continue;
            }
            let pieces = self.chunker.chunk(&text)?;
            debug!(path = %path.display(), chunks = pieces.len(), "chunked document");
            chunks.extend(pieces);
            files_read += 1;
        }

        if chunks.is_empty() {
            return Err(LoadError::NoDocumentsLoaded);
        }

        info!(chunks = chunks.len(), files = files_read, "embedding documents");
        let embeddings = embedder.embed_all(&chunks)?;
        if let Err(err) = self.cache.write(&chunks, &embeddings) {
            warn!(error = %err, "cache not persisted; keeping in-memory state");
        }

        self.chunks = chunks;
        self.embeddings = embeddings;
        Ok(LoadReport {
            source: LoadSource::Embedded,
            chunks: self.chunks.len(),
            files_read,
            files_skipped,
        })
    }

    /// Returns up to `config.top_k` chunks scoring above the relevance
    /// threshold, best first. An empty store yields no results without
    /// calling the embedder.
    pub fn search<E>(
        &self,
        query: &str,
        embedder: &E,
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>, EmbeddingError>
    where
        E: Embedder + ?Sized,
    {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = embedder.embed_one(query)?;
        let results: Vec<SearchResult> = rank(&query_embedding, &self.embeddings, config)
            .into_iter()
            .map(|(index, score)| SearchResult {
                index,
                text: self.chunks[index].clone(),
                score,
            })
            .collect();
        debug!(hits = results.len(), "searched documents");
        Ok(results)
    }

    /// Loaded chunk texts.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Embeddings, index-aligned with [`Self::chunks`].
    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The backing cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Drops all in-memory state; the cache artifact is untouched.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.embeddings.clear();
    }
}
