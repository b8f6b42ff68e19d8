//! YAML configuration for the `covey` binary.
//!
//! ```yaml
//! model:
//!   command: ./llama-cli
//!   args: ["-m", "models/model.gguf"]
//!   timeout_secs: 300
//!   generation:
//!     temperature: 0.5
//! agents:
//!   - name: researcher
//!     description: Finds facts
//!     tools: [calculate]
//! teams:
//!   - name: crew
//!     agents: [researcher]
//!     collaboration_mode: consensus
//! ```

use covey_core::GenerationOptions;
use covey_memory::RollingMemoryConfig;
use covey_team::TeamConfig;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::CliError;

fn default_timeout_secs() -> u64 {
    300
}

/// The program that produces completions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub generation: GenerationOptions,
}

fn default_model_name() -> String {
    "command".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Names of standard tools.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub memory: Option<RollingMemoryConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Member agent names in roster order.
    pub agents: Vec<String>,
    #[serde(flatten)]
    pub settings: TeamConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub model: ModelConfig,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub teams: Vec<TeamSection>,
}

/// A loaded configuration file, typed and raw.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: Settings,
    raw: Value,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        info!(path = %path.display(), "Loading configuration");
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| CliError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        let raw: Value = serde_yaml::from_str(text)?;
        let settings = serde_yaml::from_value(raw.clone())?;
        Ok(Self { settings, raw })
    }

    /// Look up a dotted key such as `model.generation.temperature`.
    ///
    /// Numeric segments index into lists, so `agents.0.name` is the first
    /// agent's name.
    pub fn value_at(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.raw, |value, segment| match value {
            Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Mapping(map) => map.get(segment),
            _ => None,
        })
    }

    pub fn agent(&self, name: &str) -> Option<&AgentConfig> {
        self.settings.agents.iter().find(|a| a.name == name)
    }

    /// The named team, or the first one when `name` is `None`.
    pub fn team(&self, name: Option<&str>) -> Result<&TeamSection, CliError> {
        match name {
            Some(name) => self
                .settings
                .teams
                .iter()
                .find(|t| t.name == name)
                .ok_or_else(|| CliError::UnknownTeam(name.to_string())),
            None => self.settings.teams.first().ok_or(CliError::NoTeams),
        }
    }

    pub fn team_mut(&mut self, name: &str) -> Option<&mut TeamSection> {
        self.settings.teams.iter_mut().find(|t| t.name == name)
    }

    /// Every problem found, empty when the configuration is usable.
    pub fn problems(&self, known_tools: &[String]) -> Vec<String> {
        let mut problems = Vec::new();
        let settings = &self.settings;

        if settings.model.command.as_os_str().is_empty() {
            problems.push("model.command is empty".to_string());
        }

        let mut agent_names = HashSet::new();
        for agent in &settings.agents {
            if !agent_names.insert(agent.name.as_str()) {
                problems.push(format!("agent '{}' is defined more than once", agent.name));
            }
            if agent.max_iterations == Some(0) {
                problems.push(format!("agent '{}' has max_iterations 0", agent.name));
            }
            for tool in &agent.tools {
                if !known_tools.iter().any(|t| t.eq_ignore_ascii_case(tool)) {
                    problems.push(format!("agent '{}' uses unknown tool '{tool}'", agent.name));
                }
            }
        }

        let mut team_names = HashSet::new();
        for team in &settings.teams {
            if !team_names.insert(team.name.as_str()) {
                problems.push(format!("team '{}' is defined more than once", team.name));
            }
            if team.agents.is_empty() {
                problems.push(format!("team '{}' has no agents", team.name));
            }
            for member in &team.agents {
                if !agent_names.contains(member.as_str()) {
                    problems.push(format!("team '{}' lists unknown agent '{member}'", team.name));
                }
            }
        }

        problems
    }
}
