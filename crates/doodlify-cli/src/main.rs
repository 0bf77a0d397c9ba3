mod cmd_analyze;
mod cmd_clear;
mod cmd_migrate;
mod cmd_process;
mod cmd_push;
mod cmd_restore;
mod cmd_run;
mod cmd_status;
mod env;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use doodlify_conductor::runner::ProcessOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "doodlify",
    version,
    about = "Theme a website for calendar events, one pull request per event"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze the repository and file improvement suggestions as issues
    Analyze {
        /// File every suggestion, including kinds disabled in defaults.reportSuggestions
        #[arg(long)]
        report_all: bool,
    },
    /// Theme the files of active events and commit them on each event branch
    Process {
        /// Process this event regardless of its dates or processed state
        #[arg(long)]
        event_id: Option<String>,
        /// Only touch these files (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Re-theme files that already have a backup
        #[arg(long)]
        force: bool,
    },
    /// Push processed event branches and open pull requests
    Push,
    /// Restore files of an event from their backups
    Restore {
        /// Event the files belong to
        #[arg(long)]
        event_id: String,
        /// Files to restore (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        files: Vec<String>,
    },
    /// Clear ledger data for one event or the whole repository
    Clear {
        /// Event to clear (clears everything if omitted)
        #[arg(long)]
        event_id: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show events and their processing state
    Status {
        /// Print the raw ledger as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run analyze, process and push in sequence
    Run {
        /// File every suggestion, including disabled kinds
        #[arg(long)]
        report_all: bool,
        /// Re-theme files that already have a backup
        #[arg(long)]
        force: bool,
    },
    /// Rename `name.ext.original` backups to `name.original.ext`
    MigrateBackups {
        /// Report what would change without renaming anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_logging() {
    let filter = std::env::var("DOODLIFY_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();
    let config = cli.config.as_path();

    match cli.cmd {
        Command::Analyze { report_all } => cmd_analyze::execute(config, report_all),
        Command::Process {
            event_id,
            only,
            force,
        } => cmd_process::execute(
            config,
            ProcessOptions {
                event_id,
                only,
                force,
            },
        ),
        Command::Push => cmd_push::execute(config),
        Command::Restore { event_id, files } => cmd_restore::execute(config, &event_id, &files),
        Command::Clear { event_id, yes } => cmd_clear::execute(config, event_id.as_deref(), yes),
        Command::Status { json } => cmd_status::execute(config, json),
        Command::Run { report_all, force } => cmd_run::execute(config, report_all, force),
        Command::MigrateBackups { dry_run } => cmd_migrate::execute(config, dry_run),
    }
}
