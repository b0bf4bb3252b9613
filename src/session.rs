//! Interactive session: owns the available file set and drives the `ask` / `refresh` / `exit` loop.
//!
//! The loop reads from any [`LineSource`] and writes to any [`Write`]. Interactive use goes through a
//! rustyline [`DefaultEditor`]; integration tests wrap a [`BufRead`] in [`ScriptedInput`] and script
//! a whole conversation against mocked contracts.

use std::io::{BufRead, Write};

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use neuro_rag_core::config::{ModelConfig, SyncConfig};
use neuro_rag_core::contract::{FileStore, Generator};
use neuro_rag_core::error::{QueryError, SyncError};
use neuro_rag_core::query::query;
use neuro_rag_core::synchronise::{synchronise, AvailableFileSet, SyncReport, SyncStatus};
use neuro_rag_core::upload::PollPolicy;
use tracing::{info, warn};

/// Where the command loop gets its next line from.
pub trait LineSource {
    /// Returns the next line, or `None` once the user is done (end of input or Ctrl-C).
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineSource for DefaultEditor {
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.add_history_entry(line.trim())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => {
                info!("End of input, leaving command loop");
                Ok(None)
            }
            Err(ReadlineError::Interrupted) => {
                info!("Interrupted, leaving command loop");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Reads commands from a buffered reader, one per line.
pub struct ScriptedInput<R> {
    reader: R,
}

impl<R: BufRead> ScriptedInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ScriptedInput<R> {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            info!("End of input, leaving command loop");
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Refresh,
    Help,
    Exit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        match line.to_lowercase().as_str() {
            "exit" | "quit" => return Command::Exit,
            "refresh" => return Command::Refresh,
            "help" => return Command::Help,
            "ask" => return Command::Ask(String::new()),
            _ => {}
        }
        match line.strip_prefix("ask ") {
            Some(question) => Command::Ask(question.trim().to_string()),
            None => Command::Unknown(line.to_string()),
        }
    }
}

pub struct Session<'a, S: ?Sized, G: ?Sized> {
    store: &'a S,
    generator: &'a G,
    sync: SyncConfig,
    model: ModelConfig,
    poll: PollPolicy,
    available: AvailableFileSet,
}

impl<'a, S, G> Session<'a, S, G>
where
    S: FileStore + ?Sized,
    G: Generator + ?Sized,
{
    pub fn new(
        store: &'a S,
        generator: &'a G,
        sync: SyncConfig,
        model: ModelConfig,
        poll: PollPolicy,
    ) -> Self {
        Self {
            store,
            generator,
            sync,
            model,
            poll,
            available: AvailableFileSet::new(),
        }
    }

    pub fn available(&self) -> &AvailableFileSet {
        &self.available
    }

    /// Clears the available set, then rebuilds it. On failure the set stays empty.
    pub async fn refresh(&mut self) -> Result<SyncReport, SyncError> {
        self.available.clear();
        let report = synchronise(&self.sync, self.store, &self.poll).await?;
        self.available = report.available.clone();
        info!(available = self.available.len(), "Session file set rebuilt");
        Ok(report)
    }

    pub async fn ask(&self, question: &str) -> Result<String, QueryError> {
        query(self.generator, &self.model, question, &self.available).await
    }

    /// Refresh and report to `out`; a failed refresh is printed, not returned.
    async fn refresh_and_print<W: Write>(&mut self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", "Checking the file store for existing files...".italic())?;
        match self.refresh().await {
            Ok(report) => print_report(out, &self.sync, &report)?,
            Err(e) => {
                warn!(error = %e, "Refresh failed");
                writeln!(out, "{} {}", "Error:".red().bold(), e)?;
            }
        }
        Ok(())
    }

    async fn ask_and_print<W: Write>(&self, out: &mut W, question: &str) -> Result<()> {
        if question.is_empty() {
            writeln!(out, "{}", "Usage: ask <question>".dimmed())?;
            return Ok(());
        }
        writeln!(out, "\n{}", "Thinking...".yellow().bold())?;
        match self.ask(question).await {
            Ok(answer) => {
                writeln!(out, "\n{}", "--- Answer ---".cyan().bold())?;
                writeln!(out, "{}", answer.trim_end())?;
                writeln!(out, "{}\n", "--------------".cyan().bold())?;
            }
            Err(QueryError::NoDocuments) => {
                writeln!(out, "{}", "No textbooks loaded!".red())?;
            }
            Err(e) => {
                writeln!(out, "{} {}", "Error:".red().bold(), e)?;
            }
        }
        Ok(())
    }
}

/// Prints what a sync run did, one line per document.
pub fn print_report<W: Write>(out: &mut W, sync: &SyncConfig, report: &SyncReport) -> Result<()> {
    match report.status {
        SyncStatus::FolderCreated => {
            let msg = format!(
                "Created directory: {}. Please put {} files here!",
                sync.books_dir.display(),
                sync.extension.to_uppercase()
            );
            writeln!(out, "{}", msg.yellow())?;
            return Ok(());
        }
        SyncStatus::NoDocuments => {
            let msg = format!(
                "No {} files found in {}/",
                sync.extension.to_uppercase(),
                sync.books_dir.display()
            );
            writeln!(out, "{}", msg.yellow())?;
            return Ok(());
        }
        SyncStatus::Synced => {}
    }

    for name in &report.reused {
        writeln!(out, "   {} {}", "✔ Found in cloud:".green(), name)?;
    }
    for name in &report.uploaded {
        writeln!(out, "   {} {}", "✔ Uploaded:".green().bold(), name)?;
    }
    for failed in &report.failed {
        writeln!(
            out,
            "   {} {} ({})",
            "❌ Failed:".red().bold(),
            failed.display_name,
            failed.error
        )?;
    }
    let ready = format!("System Ready! {} book(s) loaded.", report.available.len());
    writeln!(out, "{}\n", ready.green().bold())?;
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Type '{}' to ask a question.", "ask <question>".green())?;
    writeln!(out, "Type '{}' to re-scan the books folder.", "refresh".green())?;
    writeln!(out, "Type '{}' to quit.\n", "exit".green())?;
    Ok(())
}

/// Runs the interactive loop: one sync on startup, then commands until `exit`, end of input or
/// Ctrl-C.
pub async fn run_loop<S, G, L, W>(session: &mut Session<'_, S, G>, input: &mut L, out: &mut W) -> Result<()>
where
    S: FileStore + ?Sized,
    G: Generator + ?Sized,
    L: LineSource + ?Sized,
    W: Write,
{
    writeln!(out, "{}", "Welcome to the Neurophysiology RAG System".purple().bold())?;
    session.refresh_and_print(out).await?;
    print_help(out)?;
    out.flush()?;

    loop {
        let Some(line) = input.next_line("Command: ")? else {
            writeln!(out)?;
            break;
        };

        match Command::parse(&line) {
            Command::Exit => break,
            Command::Refresh => session.refresh_and_print(out).await?,
            Command::Ask(question) => session.ask_and_print(out, &question).await?,
            Command::Help => print_help(out)?,
            Command::Empty => {}
            Command::Unknown(other) => {
                info!(input = %other, "Unknown command");
                writeln!(out, "{}", "Unknown command.".dimmed())?;
            }
        }
        out.flush()?;
    }
    Ok(())
}
