//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::assistant::GenerationConfig;
use crate::chunker::ChunkConfig;
use crate::search::SearchConfig;

/// Chat completion backend.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProviderKind {
    /// OpenAI Chat Completions.
    Openai,
    /// Anthropic Messages.
    Anthropic,
}

/// Command-line interface for the `docqa` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "docqa",
    about = "Answer questions about a fixed document set with retrieval-augmented generation"
)]
pub struct Cli {
    /// Plain-text documents to load (repeat the flag or comma-separate via env)
    #[arg(long = "doc", env = "DOCQA_DOCS", value_delimiter = ',')]
    pub docs: Vec<PathBuf>,

    /// Directory holding the embedding cache
    #[arg(long, env = "DOCQA_CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Ignore the cache and re-embed the documents
    #[arg(long, default_value_t = false)]
    pub force_reload: bool,

    /// Answer one question and exit (interactive when omitted)
    #[arg(long)]
    pub query: Option<String>,

    /// Only print the retrieved context (skip the completion call)
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// OpenAI API key, used for embeddings and OpenAI completions
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL for the OpenAI-compatible API
    #[arg(
        long,
        env = "DOCQA_OPENAI_BASE",
        default_value = "https://api.openai.com/v1"
    )]
    pub openai_base_url: String,

    /// Embedding model identifier
    #[arg(
        long,
        env = "DOCQA_EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub embedding_model: String,

    /// OpenAI chat model used for answers
    #[arg(long, env = "DOCQA_CHAT_MODEL", default_value = "gpt-3.5-turbo")]
    pub chat_model: String,

    /// Completion provider
    #[arg(long, env = "DOCQA_PROVIDER", value_enum, default_value = "openai")]
    pub llm_provider: ProviderKind,

    /// Anthropic API key (required with --llm-provider anthropic)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Anthropic model identifier
    #[arg(
        long,
        env = "DOCQA_ANTHROPIC_MODEL",
        default_value = "claude-3-haiku-20240307"
    )]
    pub anthropic_model: String,

    /// Base URL for the Anthropic API
    #[arg(
        long,
        env = "DOCQA_ANTHROPIC_BASE",
        default_value = "https://api.anthropic.com"
    )]
    pub anthropic_base_url: String,

    /// Tokens per chunk
    #[arg(long, default_value_t = 512)]
    pub chunk_max_tokens: usize,

    /// Tokens shared by consecutive chunks
    #[arg(long, default_value_t = 50)]
    pub chunk_overlap: usize,

    /// Chunks per embedding request
    #[arg(long, default_value_t = 100)]
    pub embed_batch_size: usize,

    /// Maximum chunks used as context
    #[arg(long, default_value_t = 3)]
    pub top_k: usize,

    /// Similarity a chunk must exceed to be used
    #[arg(long, default_value_t = 0.3)]
    pub relevance_threshold: f32,

    /// Trailing conversation turns sent with each question
    #[arg(long, default_value_t = 5)]
    pub history_window: usize,

    /// Sampling temperature for the answer model
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Maximum tokens to request from the completion model
    #[arg(long, default_value_t = 500)]
    pub max_completion_tokens: usize,

    /// Seconds to wait for each HTTP request
    #[arg(long, env = "DOCQA_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl Cli {
    /// Chunk window settings.
    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            max_tokens: self.chunk_max_tokens,
            overlap: self.chunk_overlap,
        }
    }

    /// Retrieval settings.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            top_k: self.top_k,
            relevance_threshold: self.relevance_threshold,
        }
    }

    /// Completion settings.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_tokens: self.max_completion_tokens,
            history_window: self.history_window,
        }
    }

    /// HTTP timeout applied to both remote services.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
