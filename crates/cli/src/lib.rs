pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "requestdesk",
    about = "Requestdesk operator CLI",
    long_about = "Seed the data directory, inspect configuration, report on stored requests, and submit drafts through the wizard.",
    after_help = "Examples:\n  requestdesk seed --with-sample-requests\n  requestdesk config\n  requestdesk report\n  requestdesk submit --draft draft.json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a requestdesk.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Write default products and cost centers and an empty request collection")]
    Seed {
        #[arg(long, help = "Also write a handful of sample requests")]
        with_sample_requests: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Print dashboard metrics and the monthly timeline from the request store")]
    Report,
    #[command(about = "Walk a draft through every wizard step and submit it to the API")]
    Submit {
        #[arg(long, help = "JSON file holding the draft details and product selections")]
        draft: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Command::Seed { with_sample_requests } => {
            commands::seed::run(config_path, with_sample_requests)
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config_path) }
        }
        Command::Report => commands::report::run(config_path),
        Command::Submit { draft } => commands::submit::run(config_path, &draft),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Diagnostics go to stderr so stdout stays a single JSON outcome.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
