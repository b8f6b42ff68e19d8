use clap::{Parser, Subcommand};
use covey_team::CollaborationMode;
use std::path::PathBuf;
use std::process::ExitCode;

mod command_model;
mod commands;
mod config;
mod error;

use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "covey", version)]
#[command(about = "Covey CLI - run agents and agent teams")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a team on a task
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        task: String,
        /// Team to run (default: the first configured team)
        #[arg(long)]
        team: Option<String>,
        /// Agent that plans and synthesizes
        #[arg(long)]
        coordinator: Option<String>,
        /// Override the team's collaboration mode
        #[arg(long)]
        mode: Option<CollaborationMode>,
    },
    /// Run a single agent on a task
    Ask {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        agent: String,
        #[arg(long)]
        task: String,
    },
    /// Check a configuration file
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// List configured agents and teams
    List {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print a configuration value by dotted key, e.g. model.generation.temperature
    Get {
        #[arg(long)]
        config: PathBuf,
        key: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match default_level.parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();
}

async fn execute(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run {
            config,
            task,
            team,
            coordinator,
            mode,
        } => {
            commands::run_team(
                &config,
                &task,
                team.as_deref(),
                coordinator.as_deref(),
                mode,
            )
            .await
        }
        Commands::Ask {
            config,
            agent,
            task,
        } => commands::ask_agent(&config, &agent, &task).await,
        Commands::Validate { config } => commands::validate(&config),
        Commands::List { config } => commands::list(&config),
        Commands::Get { config, key } => commands::get(&config, &key),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error_code = e.error_code(), error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
