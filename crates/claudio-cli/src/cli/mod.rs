//! CLI command definitions for the `claudio` binary.

pub mod plan;
pub mod production;
pub mod session;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Plan and assemble multi-scene generated videos.
#[derive(Parser)]
#[command(name = "claudio", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Draft a scene plan for a target duration.
    Plan(PlanArgs),

    /// Create a session from a JSON plan document.
    Import {
        /// Path to the plan document (raw JSON or a fenced ```json block).
        file: PathBuf,
    },

    /// Inspect and manage stored sessions.
    Sessions {
        #[command(subcommand)]
        action: SessionsCommand,
    },

    /// Estimate and record the generation cost of a session.
    Estimate {
        /// Session id.
        id: String,
    },

    /// Concatenate a session's finished video segments into the final video.
    Concat {
        /// Session id.
        id: String,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Target video length in seconds.
    pub duration: f64,

    /// Longest segment the video backend can produce (defaults to config).
    #[arg(long)]
    pub max_segment: Option<f64>,

    /// What the video is for.
    #[arg(long, default_value = "promotional video")]
    pub purpose: String,

    #[arg(long)]
    pub business: Option<String>,

    #[arg(long)]
    pub theme: Option<String>,

    /// Extra direction appended to every scene prompt.
    #[arg(long)]
    pub context: Option<String>,

    /// Persist the plan as a new session awaiting approval.
    #[arg(long)]
    pub save: bool,
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// List stored sessions.
    #[command(alias = "ls")]
    List,

    /// Show a session's plan, progress and assets.
    Show { id: String },

    /// Delete a session and everything under its directory.
    #[command(alias = "rm")]
    Delete {
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Remove intermediate images and videos of a session.
    Clean {
        id: String,

        /// Remove the final video as well.
        #[arg(long)]
        all: bool,
    },
}

/// Parse a session id argument.
pub fn parse_session_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("invalid session id '{id}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_flags_parse() {
        let cli = Cli::parse_from([
            "claudio", "plan", "20", "--max-segment", "8", "--theme", "warm", "--save", "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Plan(args) => {
                assert!((args.duration - 20.0).abs() < f64::EPSILON);
                assert_eq!(args.max_segment, Some(8.0));
                assert_eq!(args.theme.as_deref(), Some("warm"));
                assert_eq!(args.purpose, "promotional video");
                assert!(args.save);
            }
            _ => panic!("expected plan command"),
        }
    }

    #[test]
    fn sessions_clean_all_parses() {
        let cli = Cli::parse_from(["claudio", "sessions", "clean", "abc", "--all"]);
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                action: SessionsCommand::Clean { all: true, .. }
            }
        ));
    }

    #[test]
    fn session_id_must_be_uuid() {
        assert!(parse_session_id("not-a-uuid").is_err());
        let id = Uuid::now_v7();
        assert_eq!(parse_session_id(&id.to_string()).unwrap(), id);
    }
}
