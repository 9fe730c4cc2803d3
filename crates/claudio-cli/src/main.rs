//! Claudio CLI entry point.
//!
//! Binary name: `claudio`
//!
//! Parses CLI arguments, sets up tracing, wires the session store and
//! concatenator, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, SessionsCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,claudio=debug",
        _ => "trace",
    };
    claudio_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "claudio", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = dispatch(&state, cli).await;

    claudio_observe::shutdown_tracing();
    result
}

async fn dispatch(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Plan(args) => cli::plan::plan(state, args, json).await,
        Commands::Import { file } => cli::plan::import(state, &file, json).await,
        Commands::Sessions { action } => match action {
            SessionsCommand::List => cli::session::list_sessions(state, json).await,
            SessionsCommand::Show { id } => cli::session::show_session(state, &id, json).await,
            SessionsCommand::Delete { id, force } => {
                cli::session::delete_session(state, &id, force, json).await
            }
            SessionsCommand::Clean { id, all } => {
                cli::session::clean_session(state, &id, all, json).await
            }
        },
        Commands::Estimate { id } => cli::production::estimate(state, &id, json).await,
        Commands::Concat { id } => cli::production::concat(state, &id, json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
