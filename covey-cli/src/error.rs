use covey_agent::AgentError;
use covey_team::TeamError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration:\n{}", format_problems(.0))]
    Invalid(Vec<String>),

    #[error("No agent named '{0}' in the configuration")]
    UnknownAgent(String),

    #[error("No team named '{0}' in the configuration")]
    UnknownTeam(String),

    #[error("The configuration defines no teams")]
    NoTeams,

    #[error("Key '{0}' not found in the configuration")]
    KeyNotFound(String),

    #[error(transparent)]
    Team(#[from] TeamError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CliError::Io { .. } => "CONFIG_IO",
            CliError::Yaml { .. } => "CONFIG_PARSE",
            CliError::Invalid(_) => "CONFIG_INVALID",
            CliError::UnknownAgent(_) => "UNKNOWN_AGENT",
            CliError::UnknownTeam(_) => "UNKNOWN_TEAM",
            CliError::NoTeams => "NO_TEAMS",
            CliError::KeyNotFound(_) => "KEY_NOT_FOUND",
            CliError::Team(err) => err.error_code(),
            CliError::Agent(err) => err.error_code(),
            CliError::Output(_) => "OUTPUT",
        }
    }
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}
