//! # neuro-rag CLI Interface (Module)
//!
//! This module implements the CLI for neuro-rag: command parsing, the async entrypoint and the
//! user-visible output of each subcommand.
//!
//! All synchronisation and query logic lives in the [`neuro-rag-core`] crate; this module only
//! loads configuration, builds the [`GeminiClient`] and hands both to the core.
//!
//! ## How To Use
//! - `neuro-rag` (or `neuro-rag chat`) syncs the book folder and starts the interactive loop.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`neuro-rag-core`]: ../../neuro-rag-core/
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use neuro_rag_core::contract::FileStore;
use neuro_rag_core::synchronise::synchronise;
use rustyline::DefaultEditor;

use crate::client::GeminiClient;
use crate::load_config::{load_config, AppConfig};
use crate::session::{print_report, run_loop, Session};

/// CLI for neuro-rag: ask questions answered from your own books.
#[derive(Parser)]
#[clap(
    name = "neuro-rag",
    version,
    about = "Sync a folder of books to the Gemini file store and ask questions about them"
)]
pub struct Cli {
    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync the book folder, then read `ask`/`refresh`/`exit` commands (default)
    Chat,
    /// Sync the book folder once and print the report
    Sync,
    /// Sync the book folder and answer a single question
    Ask {
        /// The question to send to the model
        #[clap(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List the files currently held by the remote store
    Files,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;
    let client = GeminiClient::new(&config.api).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            tracing::info!(command = "chat", "Starting interactive session");
            chat(&config, &client).await
        }
        Commands::Sync => {
            tracing::info!(command = "sync", "Starting synchronisation process");
            let report = synchronise(&config.sync, &client, &config.poll)
                .await
                .map_err(|e| {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    anyhow::Error::new(e)
                })?;
            let mut stdout = std::io::stdout();
            print_report(&mut stdout, &config.sync, &report)?;
            tracing::info!(command = "sync", ?report, "Synchronisation complete");
            Ok(())
        }
        Commands::Ask { question } => {
            let question = question.join(" ");
            tracing::info!(command = "ask", "Answering a single question");
            let mut session = Session::new(
                &client,
                &client,
                config.sync.clone(),
                config.model.clone(),
                config.poll,
            );
            let report = session.refresh().await?;
            let mut stdout = std::io::stdout();
            print_report(&mut stdout, &config.sync, &report)?;
            let answer = session.ask(&question).await?;
            writeln!(stdout, "{}", answer.trim_end())?;
            Ok(())
        }
        Commands::Files => {
            tracing::info!(command = "files", "Listing remote files");
            let files = client.list_files().await.map_err(|e| anyhow::anyhow!(e))?;
            let mut stdout = std::io::stdout();
            if files.is_empty() {
                writeln!(stdout, "{}", "No files in the remote store.".yellow())?;
            }
            for file in files {
                writeln!(
                    stdout,
                    "{}  {:?}  {}",
                    file.display_name.bold(),
                    file.state,
                    file.id.dimmed()
                )?;
            }
            Ok(())
        }
    }
}

async fn chat(config: &AppConfig, client: &GeminiClient) -> Result<()> {
    let mut session = Session::new(
        client,
        client,
        config.sync.clone(),
        config.model.clone(),
        config.poll,
    );
    let mut editor = DefaultEditor::new()?;
    let mut stdout = std::io::stdout();
    run_loop(&mut session, &mut editor, &mut stdout).await
}
