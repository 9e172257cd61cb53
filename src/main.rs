use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod cli;
mod config;
mod credential;
mod errors;
mod export;
mod extract;
mod log;
mod prompt;
mod provider;
mod session;
mod ux;
mod wire;

use cli::{Command, KeyAction};
use credential::{CredentialStore, FileKvStore};
use session::{Notice, Outcome, Session};

fn init_tracing(debug: bool) {
    let default = if debug { "vibe_sitegen=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_credentials(cfg: &config::Config) -> Result<CredentialStore> {
    if !cfg.persist_credential {
        return Ok(CredentialStore::in_memory());
    }
    let path = cfg.storage_file()?;
    tracing::debug!(path = %path.display(), "credential storage");
    Ok(CredentialStore::new(Box::new(FileKvStore::new(path))))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.debug);

    let cfg = config::Config::resolve(&args)?;
    let creds = open_credentials(&cfg)?;

    let seed = args.api_key.clone().or_else(|| std::env::var("GEMINI_API_KEY").ok());
    if let Some(key) = seed.filter(|k| !k.trim().is_empty()) {
        if let Err(e) = creds.set(key.trim()) {
            tracing::warn!(error = %e, "could not persist API key");
        }
    }

    let command = args.command.clone().unwrap_or(Command::Chat);
    if let Command::Key { action } = &command {
        return run_key(&creds, action);
    }

    let session_id = Uuid::new_v4();
    let transcript = log::Transcript::new(
        Path::new(&cfg.out_dir),
        session_id,
        cfg.save_request,
        cfg.save_response,
    );
    if transcript.enabled() {
        tracing::info!(dir = %transcript.dir().display(), "saving exchanges");
    }
    let prov = provider::make_provider(&cfg, Some(transcript))?;
    let session = Session::new(prov, creds);

    match command {
        Command::Generate { instruction } => run_generate(&session, &cfg, &instruction).await,
        _ => run_chat(&session, &cfg).await,
    }
}

fn run_key(creds: &CredentialStore, action: &KeyAction) -> Result<()> {
    match action {
        KeyAction::Set { key } => {
            let key = credential::validate_key_input(key)?;
            creds.set(&key).context("failed to save API key")?;
            ux::inform("API Key Saved", "Your Gemini API key has been saved successfully.");
        }
        KeyAction::Status => {
            let key = creds.get();
            if key.is_empty() {
                println!("No API key stored. Get one at {}", ux::KEY_PAGE);
            } else {
                println!("API key present: {}", credential::mask(&key));
            }
        }
    }
    Ok(())
}

async fn run_generate(session: &Session, cfg: &config::Config, instruction: &str) -> Result<()> {
    let pb = ux::sending_spinner("Generating website…");
    let outcome = session.submit(instruction).await;
    pb.finish_and_clear();

    match outcome {
        Outcome::Generated => {
            let out = export::download(session.artifact().as_deref(), Path::new(&cfg.out_dir))?;
            ux::show_exported("Website generated", &out);
            Ok(())
        }
        Outcome::Ignored => bail!("instruction is empty"),
        Outcome::CredentialRequired => bail!(
            "API key not set; run `vibe_sitegen key set <KEY>` or set GEMINI_API_KEY ({})",
            ux::KEY_PAGE
        ),
        Outcome::QuotaNotice => bail!(session::QUOTA_TURN),
        Outcome::Failed(n) | Outcome::Rejected(n) => bail!(n.description),
        Outcome::Busy | Outcome::Regenerated => bail!("unexpected session state"),
    }
}

async fn run_chat(session: &Session, cfg: &config::Config) -> Result<()> {
    ux::show_banner(&cfg.model);
    if !session.credentials().has() {
        enter_key(session);
    }

    let out_dir = Path::new(&cfg.out_dir);
    while let Some(line) = ux::read_line("\n> ") {
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => ux::show_help(),
            "/key" => enter_key(session),
            "/code" => ux::show_code(session.artifact().as_deref()),
            "/download" => match export::download(session.artifact().as_deref(), out_dir) {
                Ok(out) => ux::show_exported("Download started", &out),
                Err(e) => ux::notify(&Notice::new("Nothing to download", &e.to_string())),
            },
            "/preview" => match export::write_preview(session.artifact().as_deref(), out_dir) {
                Ok(out) => ux::show_exported("Preview written", &out),
                Err(e) => ux::notify(&Notice::new("No preview available", &e.to_string())),
            },
            "/regenerate" => {
                let before = session.turns().len();
                let pb = ux::sending_spinner("Regenerating website…");
                let outcome = session.regenerate().await;
                pb.finish_and_clear();
                report(session, before, outcome);
            }
            cmd if cmd.starts_with('/') => {
                ux::notify(&Notice::new("Unknown command", &format!("{cmd} (try /help)")))
            }
            text => {
                let before = session.turns().len();
                let pb = ux::sending_spinner("Generating website…");
                let outcome = session.submit(text).await;
                pb.finish_and_clear();
                report(session, before, outcome);
            }
        }
    }
    Ok(())
}

fn report(session: &Session, before: usize, outcome: Outcome) {
    tracing::debug!(state = ?session.state(), ?outcome, "flow settled");
    ux::show_turns_since(&session.turns(), before);
    match outcome {
        Outcome::Generated | Outcome::QuotaNotice | Outcome::Ignored => {}
        Outcome::Regenerated => ux::inform(
            "Website Regenerated",
            "The website has been regenerated with the same prompt but different variations.",
        ),
        Outcome::CredentialRequired => enter_key(session),
        Outcome::Busy => ux::notify(&Notice::new("Busy", "A website is still being generated.")),
        Outcome::Rejected(n) | Outcome::Failed(n) => ux::notify(&n),
    }
}

fn enter_key(session: &Session) {
    let Some(input) = ux::ask_for_key() else {
        return;
    };
    match credential::validate_key_input(&input) {
        Ok(key) => match session.credentials().set(&key) {
            Ok(()) => ux::inform("API Key Saved", "Your Gemini API key has been saved successfully."),
            Err(e) => {
                tracing::error!(error = %e, "failed to save API key");
                ux::notify(&Notice::new("Error", "Failed to save API key."));
            }
        },
        Err(e) => ux::notify(&Notice::new("Invalid API Key", &e.to_string())),
    }
}
