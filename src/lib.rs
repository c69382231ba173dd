#![warn(missing_docs)]
//! Core library for docqa: chunk a fixed document set, embed and cache it,
//! retrieve by cosine similarity, and answer questions with a chat model.

pub mod assistant;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod embedder;
pub mod error;
pub mod persona;
pub mod providers;
pub mod search;
pub mod session;
pub mod store;

pub use assistant::{reply_or_apology, Assistant, CannedReply, GenerationConfig, GENERIC_APOLOGY};
pub use cache::{CacheRecord, EmbeddingCache};
pub use chunker::{ChunkConfig, Chunker};
pub use config::{Cli, ProviderKind};
pub use embedder::openai::OpenAiEmbedder;
pub use embedder::{Embedder, Embedding};
pub use error::{AnswerError, CacheError, ChunkError, CompletionError, EmbeddingError, LoadError};
pub use persona::Persona;
pub use providers::{AnthropicProvider, ChatMessage, LlmProvider, OpenAiProvider, ProviderRequest};
pub use search::{SearchConfig, SearchResult};
pub use session::{ConversationTurn, Role, Session};
pub use store::{DocumentStore, LoadReport, LoadSource};
