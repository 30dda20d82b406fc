use crate::api::{HttpMemoryApi, MemoryApi};
use crate::controller::{drain_events, SubmissionController, SubmitOutcome, TimelineController};
use crate::messages;
use crate::model::{AppConfig, AppEvent, MemoryId, PendingAction};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
#[derive(Debug, PartialEq)]
pub(crate) enum OutputLine {
    Stdout(String),
    Stderr(String),
}

type OutputTx = mpsc::UnboundedSender<OutputLine>;

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (OutputTx, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "memory-restore",
    version,
    about = "Restore memories with AI analysis and images, from a TUI or the command line"
)]
pub struct Cli {
    /// Base URL of the memory service
    #[arg(
        long,
        env = "MEMORY_RESTORE_URL",
        default_value = "http://127.0.0.1:8000",
        global = true
    )]
    pub base_url: String,

    /// Per-request timeout (e.g. 30s); no timeout when unset
    #[arg(long, env = "MEMORY_RESTORE_TIMEOUT", global = true)]
    pub timeout: Option<humantime::Duration>,

    /// Refuse to submit a memory without a date
    #[arg(long, global = true)]
    pub require_date: bool,

    /// Print raw JSON payloads instead of text (subcommands only)
    #[arg(long, global = true)]
    pub json: bool,

    /// Write logs to this file (the TUI defaults to the user cache directory)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Submit a memory and print its analysis and image URL
    Create {
        /// What you remember
        #[arg(long)]
        text: String,
        /// When it happened (free-form label)
        #[arg(long, default_value = "")]
        date: String,
    },
    /// List stored memories in server order
    List {
        /// Also export the list as JSON
        #[arg(long)]
        export_json: Option<PathBuf>,
    },
    /// Change the text and date of a stored memory
    Update {
        id: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        date: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Delete a stored memory
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    /// True when no subcommand was given and the TUI will own the terminal.
    pub fn is_tui(&self) -> bool {
        cfg!(feature = "tui") && self.command.is_none()
    }
}

/// Build an `AppConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> AppConfig {
    AppConfig {
        base_url: args.base_url.clone(),
        timeout: args.timeout.map(Duration::from),
        user_agent: format!("memory-restore/{}", env!("CARGO_PKG_VERSION")),
        require_date: args.require_date,
    }
}

/// Config as one JSON line, for the startup log.
fn describe_config(cfg: &AppConfig) -> String {
    serde_json::to_string(cfg).unwrap_or_else(|e| format!("<unserializable config: {e}>"))
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    tracing::debug!(config = %describe_config(&cfg), "effective config");

    let command = match args.command.clone() {
        Some(cmd) => cmd,
        #[cfg(feature = "tui")]
        None => return crate::tui::run(cfg).await,
        // Fallback when built without TUI support.
        #[cfg(not(feature = "tui"))]
        None => Command::List { export_json: None },
    };

    let api = Arc::new(HttpMemoryApi::new(&cfg)?);
    let (out_tx, out_handle) = spawn_output_writer();
    let res = run_command(api, &cfg, command, args.json, &out_tx).await;
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_command<A: MemoryApi + 'static>(
    api: Arc<A>,
    cfg: &AppConfig,
    command: Command,
    json: bool,
    out: &OutputTx,
) -> Result<()> {
    match command {
        Command::Create { text, date } => run_create(api, cfg, &text, &date, json, out).await,
        Command::List { export_json } => run_list(api, export_json.as_deref(), json, out).await,
        Command::Update {
            id,
            text,
            date,
            yes,
        } => run_update(api, &MemoryId::new(id), &text, &date, yes, json, out).await,
        Command::Delete { id, yes } => run_delete(api, &MemoryId::new(id), yes, json, out).await,
    }
}

fn print_events(out: &OutputTx, events: &[AppEvent], with_lines: bool) {
    let summary = crate::text_summary::build_text_summary(events);
    if with_lines {
        for line in summary.lines {
            let _ = out.send(OutputLine::Stdout(line));
        }
    }
    for notice in summary.notices {
        let _ = out.send(OutputLine::Stderr(notice));
    }
}

fn print_json<T: Serialize + ?Sized>(out: &OutputTx, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value).context("serialize output")?;
    let _ = out.send(OutputLine::Stdout(body));
    Ok(())
}

async fn run_create<A: MemoryApi + 'static>(
    api: Arc<A>,
    cfg: &AppConfig,
    text: &str,
    date: &str,
    json: bool,
    out: &OutputTx,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctl = SubmissionController::new(api, tx, cfg.require_date);
    let outcome = ctl.submit(text, date).await;
    let events = drain_events(&mut rx);

    match outcome {
        SubmitOutcome::Completed(Ok(resp)) => {
            if json {
                print_json(out, &resp)?;
            } else {
                print_events(out, &events, true);
            }
            Ok(())
        }
        SubmitOutcome::Completed(Err(e)) => {
            print_events(out, &events, false);
            Err(e).context("restore failed")
        }
        SubmitOutcome::Invalid => {
            print_events(out, &events, false);
            anyhow::bail!("invalid input")
        }
        SubmitOutcome::Dropped | SubmitOutcome::NothingToRetry => {
            anyhow::bail!("nothing was submitted")
        }
    }
}

async fn run_list<A: MemoryApi + 'static>(
    api: Arc<A>,
    export_json: Option<&Path>,
    json: bool,
    out: &OutputTx,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut timeline = TimelineController::new(api, tx);
    let loaded = timeline.load_all().await;
    let events = drain_events(&mut rx);
    if let Err(e) = loaded {
        print_events(out, &events, false);
        return Err(e).context("timeline load failed");
    }

    if let Some(path) = export_json {
        crate::export::export_json(path, timeline.memories())?;
        let _ = out.send(OutputLine::Stderr(format!(
            "Exported JSON: {}",
            path.display()
        )));
    }

    if json {
        print_json(out, timeline.memories())
    } else {
        print_events(out, &events, true);
        Ok(())
    }
}

/// Load the timeline and select `id`, the way the detail view does before a mutation.
async fn select_target<A: MemoryApi + 'static>(
    timeline: &mut TimelineController<A>,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    id: &MemoryId,
    out: &OutputTx,
) -> Result<()> {
    if let Err(e) = timeline.load_all().await {
        print_events(out, &drain_events(rx), false);
        return Err(e).context("timeline load failed");
    }
    // The listing itself is not wanted here.
    drain_events(rx);

    if timeline.select(id).is_none() {
        print_events(out, &drain_events(rx), false);
        anyhow::bail!("no memory with id {id}");
    }
    drain_events(rx);
    Ok(())
}

/// Commit a prepared action once confirmed with `--yes`.
async fn confirm_and_commit<A: MemoryApi + 'static>(
    timeline: &mut TimelineController<A>,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    action: Option<PendingAction>,
    yes: bool,
    json: bool,
    out: &OutputTx,
) -> Result<()> {
    let Some(action) = action else {
        print_events(out, &drain_events(rx), false);
        anyhow::bail!("invalid input");
    };
    drain_events(rx);

    if !yes {
        let prompt = match &action {
            PendingAction::Edit(_) => messages::CONFIRM_EDIT,
            PendingAction::Delete(_) => messages::CONFIRM_DELETE,
        };
        let _ = out.send(OutputLine::Stderr(format!(
            "{prompt} (re-run with --yes to confirm)"
        )));
        anyhow::bail!("not confirmed");
    }

    let res = timeline.commit(action).await;
    print_events(out, &drain_events(rx), !json);
    res.context("request failed")
}

async fn run_update<A: MemoryApi + 'static>(
    api: Arc<A>,
    id: &MemoryId,
    text: &str,
    date: &str,
    yes: bool,
    json: bool,
    out: &OutputTx,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut timeline = TimelineController::new(api, tx);
    select_target(&mut timeline, &mut rx, id, out).await?;

    let action = timeline.prepare_edit(text, date);
    confirm_and_commit(&mut timeline, &mut rx, action, yes, json, out).await?;

    if json {
        if let Some(record) = timeline.memories().iter().find(|m| &m.id == id) {
            print_json(out, record)?;
        }
    }
    Ok(())
}

async fn run_delete<A: MemoryApi + 'static>(
    api: Arc<A>,
    id: &MemoryId,
    yes: bool,
    json: bool,
    out: &OutputTx,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut timeline = TimelineController::new(api, tx);
    select_target(&mut timeline, &mut rx, id, out).await?;

    let action = timeline.prepare_delete();
    confirm_and_commit(&mut timeline, &mut rx, action, yes, json, out).await?;

    if json {
        print_json(out, &serde_json::json!({ "status": "success", "id": id }))?;
    }
    Ok(())
}
