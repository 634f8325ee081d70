//! Terminal host for the vocabulary quiz.
//!
//! Reads commands from stdin, renders frames to stdout and keeps progress in
//! a local SQLite database.

pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod render;
pub mod source;

use std::io::Stdout;

use command::{confirm_prompt, execute, is_yes, Command, Flow};
use config::AppConfig;
use db::SqliteStore;
use quiz_core::{
    resolve_vocabulary, token_from_link, Orchestrator, RngSource, SharedProgress, SystemClock,
    Ticket,
};
use render::TerminalRenderer;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep_until, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type TerminalQuiz = Orchestrator<SqliteStore, TerminalRenderer<Stdout>>;

/// Run the quiz until the user quits or stdin closes.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        vocabulary = %config.vocabulary_path.display(),
        db = %config.db_path.display(),
        "starting"
    );

    let loaded = resolve_vocabulary(
        source::load_vocabulary_file(&config.vocabulary_path),
        config.similar_pool_size(),
    )?;
    let quiz_config = config.quiz_config(loaded.store.len());

    let mut renderer = TerminalRenderer::new(
        std::io::stdout(),
        loaded.metadata.title(),
        loaded.metadata.subtitle(),
    );
    renderer.header();
    if let Some(reason) = &loaded.fallback {
        renderer.message(&format!("Using the built-in word list ({reason})."));
    }

    let sink = SqliteStore::open(&config.db_path)?;
    let mut quiz = Orchestrator::new(
        loaded.store,
        quiz_config,
        sink,
        renderer,
        SystemClock,
        Box::new(RngSource::from_os()),
    )?;
    match quiz.device_id() {
        Ok(device) => tracing::info!(%device, "device identified"),
        Err(e) => tracing::warn!(error = %e, "no device id"),
    }

    quiz.start()?;

    let mut pending_share = config
        .share_link
        .as_deref()
        .and_then(|link| offer_shared(&mut quiz, link));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut deadline: Option<(Ticket, Instant)> = None;

    loop {
        deadline = match (quiz.pending_advance(), deadline) {
            (Some(p), Some((ticket, at))) if p.ticket == ticket => Some((ticket, at)),
            (Some(p), _) => Some((p.ticket, Instant::now() + p.delay)),
            (None, _) => None,
        };

        let line = tokio::select! {
            Some(ticket) = fire_at(deadline) => {
                if let Err(e) = quiz.fire_advance(ticket) {
                    quiz.renderer_mut().message(&e.to_string());
                }
                continue;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        if let Some(shared) = pending_share.take() {
            if is_yes(&line) {
                if let Err(e) = quiz.apply_shared(shared) {
                    quiz.renderer_mut().message(&e.to_string());
                }
            } else {
                quiz.renderer_mut().message("Keeping your current progress.");
            }
            continue;
        }

        let result = Command::parse(&line)
            .and_then(|command| execute(&mut quiz, command, &config.share_base_url));
        match result {
            Ok(Flow::Continue) => {}
            Ok(Flow::Say(text)) => quiz.renderer_mut().message(&text),
            Ok(Flow::Confirm(shared)) => {
                let prompt = confirm_prompt(&shared, quiz.word_store().len());
                quiz.renderer_mut().message(&prompt);
                pending_share = Some(shared);
            }
            Ok(Flow::Quit) => break,
            Err(e) => quiz.renderer_mut().message(&e.to_string()),
        }
    }

    if let Err(e) = quiz.save() {
        tracing::warn!(error = %e, "could not save progress on exit");
    }
    tracing::info!("bye");
    Ok(())
}

/// Resolves when the pending advance is due, never when there is none.
async fn fire_at(deadline: Option<(Ticket, Instant)>) -> Option<Ticket> {
    match deadline {
        Some((ticket, at)) => {
            sleep_until(at).await;
            Some(ticket)
        }
        None => std::future::pending().await,
    }
}

/// Decode a startup share link and ask before applying it. Corrupt links
/// are logged and ignored.
fn offer_shared(quiz: &mut TerminalQuiz, link: &str) -> Option<SharedProgress> {
    let Some(token) = token_from_link(link) else {
        tracing::warn!(link, "share link has no token");
        return None;
    };
    match quiz.decode_share(&token) {
        Ok(shared) => {
            let prompt = confirm_prompt(&shared, quiz.word_store().len());
            quiz.renderer_mut().message(&prompt);
            Some(shared)
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring share link");
            None
        }
    }
}
