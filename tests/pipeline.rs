use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use docqa::{
    reply_or_apology, AnswerError, Assistant, ChatMessage, ChunkConfig, Chunker, CompletionError,
    ConversationTurn, DocumentStore, Embedder, Embedding, EmbeddingCache, EmbeddingError,
    LlmProvider, LoadError, LoadSource, Persona, ProviderRequest, Role, SearchConfig, Session,
    GENERIC_APOLOGY,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const VOCAB: [&str; 4] = ["alpha", "bravo", "charlie", "delta"];

/// Counts vocabulary words; texts without any score as the zero vector.
#[derive(Clone, Default)]
struct KeywordEmbedder {
    calls: Rc<Cell<usize>>,
    fail: Rc<Cell<bool>>,
}

impl Embedder for KeywordEmbedder {
    fn batch_size(&self) -> usize {
        100
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(EmbeddingError::Decode("embedding service unavailable".into()));
        }
        Ok(inputs
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                VOCAB
                    .iter()
                    .map(|word| lower.matches(word).count() as f32)
                    .collect()
            })
            .collect())
    }
}

#[derive(Clone)]
struct ScriptedProvider {
    requests: Rc<RefCell<Vec<Vec<ChatMessage>>>>,
    params: Rc<RefCell<Vec<(f32, usize)>>>,
    reply: Result<String, String>,
}

impl ScriptedProvider {
    fn replying(reply: &str) -> Self {
        Self {
            requests: Rc::default(),
            params: Rc::default(),
            reply: Ok(reply.to_string()),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            requests: Rc::default(),
            params: Rc::default(),
            reply: Err(reason.to_string()),
        }
    }
}

impl LlmProvider for ScriptedProvider {
    fn answer(&self, request: &ProviderRequest<'_>) -> Result<String, CompletionError> {
        self.requests.borrow_mut().push(request.messages.to_vec());
        self.params
            .borrow_mut()
            .push((request.temperature, request.max_tokens));
        self.reply.clone().map_err(CompletionError::Decode)
    }
}

struct Fixture {
    dir: TempDir,
    embedder: KeywordEmbedder,
    provider: ScriptedProvider,
}

impl Fixture {
    fn new(provider: ScriptedProvider) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            embedder: KeywordEmbedder::default(),
            provider,
        }
    }

    fn doc(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    fn assistant(&self, chunk_config: ChunkConfig) -> Assistant {
        let store =
            DocumentStore::new(chunk_config, EmbeddingCache::new(self.cache_dir())).unwrap();
        Assistant::new(
            store,
            Box::new(self.embedder.clone()),
            Box::new(self.provider.clone()),
        )
    }
}

fn history(turns: &[(Role, &str)]) -> Vec<ConversationTurn> {
    turns
        .iter()
        .map(|(role, text)| ConversationTurn::new(*role, *text))
        .collect()
}

fn assert_load_invariant(assistant: &Assistant) {
    assert_eq!(
        assistant.store().chunks().len(),
        assistant.store().embeddings().len()
    );
}

#[test]
fn query_matching_one_of_three_chunks_returns_only_it() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let first = fx.doc("first.txt", "alpha");
    let second_body = "bravo bravo bravo bravo bravo bravo bravo bravo.";
    let second = fx.doc("second.txt", second_body);

    // Size the window one token short of the second file so it splits in two.
    let probe = Chunker::new(ChunkConfig::default()).unwrap();
    let tokens = probe.token_count(second_body);
    assert!(tokens > probe.token_count("alpha"));
    let config = ChunkConfig {
        max_tokens: tokens - 1,
        overlap: 0,
    };

    let mut assistant = fx.assistant(config);
    let report = assistant.load(&[first, second], false).unwrap();
    assert_eq!(report.chunks, 3);
    assert_load_invariant(&assistant);

    let results = assistant.search("which bravo?").unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].index, 1);
    assert_eq!(results[0].text, assistant.store().chunks()[1]);
    assert!(results[0].text.contains("bravo"));
    assert!(results[0].score > 0.3);
}

#[test]
fn search_respects_top_k_and_ordering() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [
        fx.doc("a.txt", "alpha bravo"),
        fx.doc("b.txt", "alpha alpha alpha bravo"),
        fx.doc("c.txt", "alpha"),
        fx.doc("d.txt", "charlie"),
        fx.doc("e.txt", "alpha alpha bravo"),
    ];
    let mut assistant = fx
        .assistant(ChunkConfig::default())
        .with_search_config(SearchConfig {
            top_k: 3,
            ..SearchConfig::default()
        });
    assistant.load(&docs, false).unwrap();

    let results = assistant.search("alpha").unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|result| result.score > 0.3));
    assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));
    assert_eq!(results[0].text, "alpha");
    assert_eq!(results[1].text, "alpha alpha alpha bravo");
}

#[test]
fn load_is_idempotent_through_the_cache() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [fx.doc("a.txt", "alpha notes"), fx.doc("b.txt", "delta notes")];

    let mut first = fx.assistant(ChunkConfig::default());
    assert_eq!(
        first.load(&docs, false).unwrap().source,
        LoadSource::Embedded
    );
    let calls = fx.embedder.calls.get();

    let mut second = fx.assistant(ChunkConfig::default());
    let report = second.load(&docs, false).unwrap();

    assert_eq!(report.source, LoadSource::Cache);
    assert_eq!(fx.embedder.calls.get(), calls);
    assert_eq!(second.store().chunks(), first.store().chunks());
    assert_eq!(second.store().embeddings(), first.store().embeddings());
    assert_load_invariant(&second);
}

#[test]
fn deleted_cache_falls_back_to_a_fresh_load() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [fx.doc("a.txt", "charlie")];
    let mut assistant = fx.assistant(ChunkConfig::default());
    assistant.load(&docs, false).unwrap();
    let calls = fx.embedder.calls.get();

    fs::remove_dir_all(fx.cache_dir()).unwrap();
    let report = assistant.load(&docs, false).unwrap();

    assert_eq!(report.source, LoadSource::Embedded);
    assert_eq!(report.files_read, 1);
    assert!(fx.embedder.calls.get() > calls);
    assert!(Path::new(&fx.cache_dir()).join("embeddings_cache.bin").exists());
}

#[test]
fn corrupt_cache_is_treated_as_missing() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [fx.doc("a.txt", "delta")];
    fs::create_dir_all(fx.cache_dir()).unwrap();
    fs::write(fx.cache_dir().join("embeddings_cache.bin"), b"\x00\x01garbage").unwrap();

    let mut assistant = fx.assistant(ChunkConfig::default());
    let report = assistant.load(&docs, false).unwrap();

    assert_eq!(report.source, LoadSource::Embedded);
    assert_eq!(assistant.store().chunks(), ["delta".to_string()]);
}

#[test]
fn nonexistent_paths_fail_and_leave_state_empty() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [
        fx.dir.path().join("missing-1.txt"),
        fx.dir.path().join("missing-2.txt"),
    ];
    let mut assistant = fx.assistant(ChunkConfig::default());

    let err = assistant.load(&docs, false).unwrap_err();

    assert!(matches!(err, LoadError::NoDocumentsLoaded));
    assert!(assistant.store().is_empty());
    assert!(assistant.store().embeddings().is_empty());
    assert_eq!(fx.embedder.calls.get(), 0);
}

#[test]
fn embedding_failure_during_load_propagates() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [fx.doc("a.txt", "alpha")];
    fx.embedder.fail.set(true);
    let mut assistant = fx.assistant(ChunkConfig::default());

    let err = assistant.load(&docs, false).unwrap_err();

    assert!(matches!(err, LoadError::Embedding(_)));
    assert!(assistant.store().is_empty());
    assert!(!fx.cache_dir().join("embeddings_cache.bin").exists());
}

#[test]
fn hello_gets_the_greeting_regardless_of_history() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let assistant = fx.assistant(ChunkConfig::default());
    let persona = Persona::default();
    let noisy = history(&[
        (Role::User, "tell me about alpha"),
        (Role::Assistant, "alpha is documented"),
    ]);

    assert_eq!(assistant.answer("hello", &[]).unwrap(), persona.greeting);
    assert_eq!(assistant.answer("Hello", &noisy).unwrap(), persona.greeting);
    assert!(fx.provider.requests.borrow().is_empty());
    // nothing loaded, so the query is never embedded
    assert_eq!(fx.embedder.calls.get(), 0);
}

#[test]
fn unmatched_queries_use_identity_and_fallback_templates() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [fx.doc("a.txt", "alpha")];
    let mut assistant = fx.assistant(ChunkConfig::default());
    assistant.load(&docs, false).unwrap();
    let persona = Persona::default();

    assert_eq!(
        assistant.answer("Who are you?", &[]).unwrap(),
        persona.capabilities
    );
    assert_eq!(
        assistant.answer("pricing for delta?", &[]).unwrap(),
        persona.fallback
    );
    assert!(fx.provider.requests.borrow().is_empty());
}

#[test]
fn relevant_context_builds_the_completion_request() {
    let fx = Fixture::new(ScriptedProvider::replying("Use alpha tokens."));
    let docs = [
        fx.doc("a.txt", "alpha authentication guide"),
        fx.doc("b.txt", "bravo endpoint"),
    ];
    let mut assistant = fx.assistant(ChunkConfig::default());
    assistant.load(&docs, false).unwrap();

    let mut session = Session::new();
    for i in 0..4 {
        session.record_exchange(format!("q{i}"), format!("a{i}"));
    }

    let reply = assistant.answer("How does alpha work?", session.history()).unwrap();
    assert_eq!(reply, "Use alpha tokens.");

    let requests = fx.provider.requests.borrow();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0];
    assert_eq!(messages.len(), 1 + 5 + 1);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].content, Persona::default().system_prompt);

    let window: Vec<(Role, &str)> = messages[1..6]
        .iter()
        .map(|message| (message.role, message.content.as_str()))
        .collect();
    assert_eq!(
        window,
        vec![
            (Role::Assistant, "a1"),
            (Role::User, "q2"),
            (Role::Assistant, "a2"),
            (Role::User, "q3"),
            (Role::Assistant, "a3"),
        ]
    );

    let last = messages.last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(
        last.content,
        "Question about CrustData API: How does alpha work?\n\n\
         Relevant documentation:\nDocument 1:\nalpha authentication guide\n"
    );
    assert_eq!(*fx.provider.params.borrow(), vec![(0.7, 500)]);
}

#[test]
fn completion_failure_is_typed_and_rendered_as_apology() {
    let fx = Fixture::new(ScriptedProvider::failing("model overloaded"));
    let docs = [fx.doc("a.txt", "alpha")];
    let mut assistant = fx.assistant(ChunkConfig::default());
    assistant.load(&docs, false).unwrap();

    let result = assistant.answer("alpha?", &[]);

    assert!(matches!(result, Err(AnswerError::Completion(_))));
    assert_eq!(reply_or_apology(result), GENERIC_APOLOGY);
}

#[test]
fn query_embedding_failure_is_typed() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [fx.doc("a.txt", "alpha")];
    let mut assistant = fx.assistant(ChunkConfig::default());
    assistant.load(&docs, false).unwrap();
    fx.embedder.fail.set(true);

    let result = assistant.answer("alpha?", &[]);

    assert!(matches!(result, Err(AnswerError::Embedding(_))));
    assert_eq!(reply_or_apology(result), GENERIC_APOLOGY);
    assert!(fx.provider.requests.borrow().is_empty());
}

#[test]
fn retrieve_context_numbers_hits() {
    let fx = Fixture::new(ScriptedProvider::replying("unused"));
    let docs = [fx.doc("a.txt", "charlie one"), fx.doc("b.txt", "charlie two")];
    let mut assistant = fx.assistant(ChunkConfig::default());
    assistant.load(&docs, false).unwrap();

    let context = assistant.retrieve_context("charlie").unwrap().unwrap();
    assert_eq!(
        context,
        "Document 1:\ncharlie one\n\nDocument 2:\ncharlie two\n"
    );
    assert!(assistant.retrieve_context("delta").unwrap().is_none());
}
