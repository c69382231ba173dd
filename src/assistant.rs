//! Retrieval-augmented answering: the caller-facing `load` / `answer` API.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::embedder::Embedder;
use crate::error::{AnswerError, EmbeddingError, LoadError};
use crate::persona::{render_context, Persona};
use crate::providers::{ChatMessage, LlmProvider, ProviderRequest};
use crate::search::{SearchConfig, SearchResult};
use crate::session::{self, ConversationTurn, Role};
use crate::store::{DocumentStore, LoadReport};

/// Reply shown when answering fails; front ends substitute it for an
/// [`AnswerError`].
pub const GENERIC_APOLOGY: &str = "I apologize, but I encountered an error while processing \
    your question. Please try again in a moment.";

const GREETING_WORDS: [&str; 4] = ["hello", "hi", "hey", "greetings"];
const IDENTITY_PHRASES: [&str; 2] = ["what do you do", "who are you"];

/// Completion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens the model may generate.
    pub max_tokens: usize,
    /// Number of trailing history turns included in the prompt.
    pub history_window: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            history_window: 5,
        }
    }
}

/// Canned reply chosen when retrieval finds nothing relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedReply {
    /// The query contains a greeting word.
    Greeting,
    /// The query asks what the assistant is.
    Identity,
    /// Anything else.
    Fallback,
}

impl CannedReply {
    /// Picks the reply for `query` by case-insensitive substring match.
    /// Greetings take precedence over identity questions.
    pub fn classify(query: &str) -> Self {
        let lower = query.to_lowercase();
        if GREETING_WORDS.iter().any(|word| lower.contains(word)) {
            CannedReply::Greeting
        } else if IDENTITY_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            CannedReply::Identity
        } else {
            CannedReply::Fallback
        }
    }

    /// Text of this reply under `persona`.
    pub fn text<'p>(&self, persona: &'p Persona) -> &'p str {
        match self {
            CannedReply::Greeting => &persona.greeting,
            CannedReply::Identity => &persona.capabilities,
            CannedReply::Fallback => &persona.fallback,
        }
    }
}

/// Document question-answering assistant.
///
/// Calls block until the remote services respond. One `load` or `answer` at
/// a time per instance.
pub struct Assistant {
    store: DocumentStore,
    embedder: Box<dyn Embedder>,
    provider: Box<dyn LlmProvider>,
    persona: Persona,
    search: SearchConfig,
    generation: GenerationConfig,
}

impl Assistant {
    /// Wires an assistant with default persona, search, and generation settings.
    pub fn new(
        store: DocumentStore,
        embedder: Box<dyn Embedder>,
        provider: Box<dyn LlmProvider>,
    ) -> Self {
        Self {
            store,
            embedder,
            provider,
            persona: Persona::default(),
            search: SearchConfig::default(),
            generation: GenerationConfig::default(),
        }
    }

    /// Replaces the persona.
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Replaces the search settings.
    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Replaces the generation settings.
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Loads the corpus; see [`DocumentStore::load`]. Errors propagate.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        force_reload: bool,
    ) -> Result<LoadReport, LoadError> {
        let report = self.store.load(paths, force_reload, self.embedder.as_ref())?;
        info!(
            source = ?report.source,
            chunks = report.chunks,
            skipped = report.files_skipped,
            "documents ready"
        );
        Ok(report)
    }

    /// Relevant chunks for `query`, best first.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, EmbeddingError> {
        self.store.search(query, self.embedder.as_ref(), &self.search)
    }

    /// The numbered context block `answer` would send, or `None` when
    /// nothing relevant was found.
    pub fn retrieve_context(&self, query: &str) -> Result<Option<String>, EmbeddingError> {
        let results = self.search(query)?;
        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(render_context(
            results.iter().map(|result| result.text.as_str()),
        )))
    }

    /// Answers `query` given the caller's conversation so far.
    ///
    /// With no relevant context the reply is a canned template and no
    /// completion call is made. Otherwise the persona prompt, the last
    /// `history_window` turns, and the question with its context are sent to
    /// the provider and its text is returned verbatim.
    pub fn answer(
        &self,
        query: &str,
        history: &[ConversationTurn],
    ) -> Result<String, AnswerError> {
        let Some(context) = self.retrieve_context(query)? else {
            let canned = CannedReply::classify(query);
            debug!(reply = ?canned, "no relevant context; using canned reply");
            return Ok(canned.text(&self.persona).to_string());
        };
        let messages = self.build_messages(query, &context, history);
        let request = ProviderRequest {
            messages: &messages,
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
        };
        let reply = self.provider.answer(&request)?;
        debug!(messages = messages.len(), reply_len = reply.len(), "completion received");
        Ok(reply)
    }

    /// Assembles system prompt, history window, and the question message.
    pub fn build_messages(
        &self,
        query: &str,
        context: &str,
        history: &[ConversationTurn],
    ) -> Vec<ChatMessage> {
        let window = session::recent(history, self.generation.history_window);
        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(ChatMessage::new(Role::System, self.persona.system_prompt.as_str()));
        messages.extend(
            window
                .iter()
                .map(|turn| ChatMessage::new(turn.role, turn.content.as_str())),
        );
        messages.push(ChatMessage::new(
            Role::User,
            self.persona.question_prompt(query, context),
        ));
        messages
    }

    /// The loaded documents.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Active persona.
    pub fn persona(&self) -> &Persona {
        &self.persona
    }
}

/// Turns an answer result into user-facing text, logging any failure and
/// substituting [`GENERIC_APOLOGY`].
pub fn reply_or_apology(result: Result<String, AnswerError>) -> String {
    match result {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "answer failed");
            GENERIC_APOLOGY.to_string()
        }
    }
}
