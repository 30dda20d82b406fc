mod analysis;
mod api;
mod cli;
mod controller;
mod export;
mod logging;
mod messages;
mod model;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_tui = args.is_tui();

    let log_path = logging::init(args.verbose, args.log_file.as_deref(), is_tui)?;
    tracing::debug!(?log_path, "logging initialized");

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success for non-TUI modes
            if !is_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            if is_tui {
                tracing::error!("session ended with error: {e:#}");
            }
            Err(e)
        }
    }
}
