use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{EditArgs, FlowCommands, StepCommands};

/// Command-line editor for onboarding flows
///
/// Flowsmith manages onboarding flows: ordered sequences of configurable
/// screens that are edited as drafts and deployed as frozen, versioned
/// releases. Single edits can be applied with `step`, or a flow can be opened
/// in an interactive `edit` session with debounced autosave.
#[derive(Parser)]
#[command(version, about, name = "flowsmith")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/flowsmith/flowsmith.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// JSON file with step templates, replacing the built-in set
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Autosave delay for `edit` sessions in milliseconds; 0 saves only on
    /// request
    #[arg(long, global = true, default_value_t = 2000)]
    pub debounce_ms: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Flowsmith CLI
///
/// - `flow`: create, inspect, deploy and branch flows
/// - `step`: apply a single edit to a draft flow and save it
/// - `edit`: interactive editing session over one flow
/// - `templates`: list the step templates new steps are created from
#[derive(Subcommand)]
pub enum Commands {
    /// Manage flows
    #[command(alias = "f")]
    Flow {
        #[command(subcommand)]
        command: FlowCommands,
    },
    /// Edit steps of a draft flow
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Open an interactive editing session reading commands from stdin
    #[command(alias = "e")]
    Edit(EditArgs),
    /// List available step templates
    #[command(alias = "t")]
    Templates,
}
