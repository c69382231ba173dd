use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use docqa::{
    reply_or_apology, AnthropicProvider, Assistant, Cli, DocumentStore, EmbeddingCache,
    LlmProvider, OpenAiEmbedder, OpenAiProvider, ProviderKind, Session,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut assistant = build_assistant(&cli)?;
    let report = assistant
        .load(&cli.docs, cli.force_reload)
        .context("failed to load documents")?;
    eprintln!(
        "loaded {} chunks ({:?}, {} file(s) skipped)",
        report.chunks, report.source, report.files_skipped
    );

    let mut session = Session::new();
    if let Some(query) = cli.query.as_deref() {
        respond(&assistant, &mut session, query, cli.dry_run);
        return Ok(());
    }

    let mut stdin = io::stdin().lock();
    let mut stderr = io::stderr();
    while let Some(query) = read_command(&mut stdin, &mut stderr)? {
        match query.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.clear();
                eprintln!("conversation cleared");
            }
            _ => respond(&assistant, &mut session, &query, cli.dry_run),
        }
    }
    Ok(())
}

// Prompts on `prompt` and returns the next trimmed line, or `None` at EOF.
fn read_command(
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> io::Result<Option<String>> {
    write!(prompt, "> ")?;
    prompt.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn build_assistant(cli: &Cli) -> Result<Assistant> {
    let embedder = OpenAiEmbedder::new(
        &cli.openai_api_key,
        &cli.openai_base_url,
        &cli.embedding_model,
        cli.timeout(),
        cli.embed_batch_size,
    )?;
    let provider: Box<dyn LlmProvider> = match cli.llm_provider {
        ProviderKind::Openai => Box::new(OpenAiProvider::new(
            cli.openai_api_key.clone(),
            cli.chat_model.clone(),
            &cli.openai_base_url,
            cli.timeout(),
        )?),
        ProviderKind::Anthropic => {
            let Some(key) = cli.anthropic_api_key.clone() else {
                bail!("ANTHROPIC_API_KEY must be set for the Anthropic provider");
            };
            Box::new(AnthropicProvider::new(
                key,
                cli.anthropic_model.clone(),
                &cli.anthropic_base_url,
                cli.timeout(),
            )?)
        }
    };
    let store = DocumentStore::new(cli.chunk_config(), EmbeddingCache::new(&cli.cache_dir))?;
    Ok(Assistant::new(store, Box::new(embedder), provider)
        .with_search_config(cli.search_config())
        .with_generation_config(cli.generation_config()))
}

// Answers against the history recorded so far, then records the exchange.
fn respond(assistant: &Assistant, session: &mut Session, query: &str, dry_run: bool) {
    if dry_run {
        match assistant.retrieve_context(query) {
            Ok(Some(context)) => println!("--- Retrieved Context ---\n{context}"),
            Ok(None) => println!("--- No relevant context ---"),
            Err(err) => eprintln!("retrieval failed: {err}"),
        }
        return;
    }
    let reply = reply_or_apology(assistant.answer(query, session.history()));
    println!("{reply}\n");
    session.record_exchange(query, reply);
}
