//! Subcommand implementations.

use covey_agent::{Agent, Coworker};
use covey_core::Model;
use covey_memory::RollingMemory;
use covey_team::{CollaborationMode, Registry, Team};
use covey_tools::{ToolRegistry, standard_tools};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::command_model::CommandModel;
use crate::config::{AgentConfig, CliConfig};
use crate::error::CliError;

/// Load `path` and refuse configurations with problems.
pub fn load_checked(path: &Path) -> Result<CliConfig, CliError> {
    let config = CliConfig::load(path)?;
    let problems = config.problems(&standard_tools().names());
    if problems.is_empty() {
        Ok(config)
    } else {
        Err(CliError::Invalid(problems))
    }
}

fn build_agent(config: &AgentConfig, model: Arc<dyn Model>, cli: &CliConfig) -> Agent {
    let available = standard_tools();
    let tools: ToolRegistry = config
        .tools
        .iter()
        .filter_map(|name| available.find(name))
        .collect();

    let mut builder = Agent::builder(config.name.clone(), model)
        .tools(tools)
        .generation_options(cli.settings.model.generation.clone());
    if let Some(description) = &config.description {
        builder = builder.description(description.clone());
    }
    if let Some(prompt) = &config.system_prompt {
        builder = builder.system_prompt(prompt.clone());
    }
    if let Some(max_iterations) = config.max_iterations {
        builder = builder.max_iterations(max_iterations);
    }
    if let Some(memory) = &config.memory {
        builder = builder.memory(Arc::new(RollingMemory::new(memory.clone())));
    }
    builder.build()
}

/// Create every configured agent and team against `model`.
pub fn build_registry(config: &CliConfig, model: Arc<dyn Model>) -> Result<Registry, CliError> {
    let registry = Registry::new();
    for agent in &config.settings.agents {
        registry.register_agent(Arc::new(build_agent(agent, Arc::clone(&model), config)));
    }
    for team in &config.settings.teams {
        registry.build_team(
            team.name.clone(),
            team.description.clone(),
            team.agents.as_slice(),
            team.settings.clone(),
        )?;
    }
    info!(
        agents = registry.agent_names().len(),
        teams = registry.team_names().len(),
        "Registry ready"
    );
    Ok(registry)
}

/// Token cancelled on Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            trigger.cancel();
        }
    });
    token
}

pub async fn run_team(
    path: &Path,
    task: &str,
    team_name: Option<&str>,
    coordinator: Option<&str>,
    mode: Option<CollaborationMode>,
) -> Result<(), CliError> {
    let mut config = load_checked(path)?;
    let team_name = config.team(team_name)?.name.clone();
    if let Some(mode) = mode
        && let Some(section) = config.team_mut(&team_name)
    {
        section.settings.collaboration_mode = mode;
    }

    let model: Arc<dyn Model> = Arc::new(CommandModel::from_config(&config.settings.model));
    let registry = build_registry(&config, model)?;
    let team: Arc<Team> = registry
        .team(&team_name)
        .ok_or_else(|| CliError::UnknownTeam(team_name.clone()))?;

    let cancel = interrupt_token();
    let result = team.run_with_cancel(task, coordinator, &cancel).await;
    registry.shutdown();
    let result = result?;

    println!("{result}");
    let report = json!({
        "team": team.name(),
        "mode": team.mode(),
        "performance": team.performance_metrics(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn ask_agent(path: &Path, agent_name: &str, task: &str) -> Result<(), CliError> {
    let config = load_checked(path)?;
    let agent_config = config
        .agent(agent_name)
        .ok_or_else(|| CliError::UnknownAgent(agent_name.to_string()))?;

    let model: Arc<dyn Model> = Arc::new(CommandModel::from_config(&config.settings.model));
    let agent = build_agent(agent_config, model, &config);

    let cancel = interrupt_token();
    let answer = Coworker::run(&agent, task, &cancel).await?;
    println!("{answer}");
    Ok(())
}

pub fn validate(path: &Path) -> Result<(), CliError> {
    let config = load_checked(path)?;
    println!(
        "Configuration OK: {} agents, {} teams",
        config.settings.agents.len(),
        config.settings.teams.len()
    );
    Ok(())
}

pub fn list(path: &Path) -> Result<(), CliError> {
    let config = CliConfig::load(path)?;
    println!("Agents:");
    for agent in &config.settings.agents {
        println!("  - {}", agent.name);
    }
    println!("\nTeams:");
    for team in &config.settings.teams {
        println!(
            "  - {} ({}): {}",
            team.name,
            team.settings.collaboration_mode,
            team.agents.join(", ")
        );
    }
    Ok(())
}

pub fn get(path: &Path, key: &str) -> Result<(), CliError> {
    let config = CliConfig::load(path)?;
    let value = config
        .value_at(key)
        .ok_or_else(|| CliError::KeyNotFound(key.to_string()))?;
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use covey_core::{GenerationOptions, ModelError};

    struct Fixed;

    #[async_trait]
    impl Model for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, prompt: &str, _: &GenerationOptions) -> Result<String, ModelError> {
            Ok(format!("Final Answer: {} chars", prompt.len()))
        }
    }

    const CONFIG: &str = r#"
model:
  command: unused
agents:
  - name: solo
    tools: [CALCULATE, text_analyze]
    max_iterations: 3
  - name: duo
teams:
  - name: pair
    agents: [duo, solo]
    collaboration_mode: consensus
"#;

    #[test]
    fn test_registry_from_config() {
        let config = CliConfig::parse(CONFIG).unwrap();
        let registry = build_registry(&config, Arc::new(Fixed)).unwrap();

        assert_eq!(registry.agent_names(), vec!["duo", "solo"]);
        let team = registry.team("pair").unwrap();
        assert_eq!(team.agent_names(), vec!["duo", "solo"]);
        assert_eq!(team.mode(), CollaborationMode::Consensus);
    }

    #[test]
    fn test_agent_gets_configured_tools() {
        let config = CliConfig::parse(CONFIG).unwrap();
        let agent = build_agent(config.agent("solo").unwrap(), Arc::new(Fixed), &config);
        assert_eq!(agent.tool_names(), vec!["calculate", "text_analyze"]);
        assert_eq!(agent.max_iterations(), 3);
    }

    #[tokio::test]
    async fn test_configured_team_runs() {
        let config = CliConfig::parse(CONFIG).unwrap();
        let registry = build_registry(&config, Arc::new(Fixed)).unwrap();
        let answer = registry.team("pair").unwrap().run("hello", None).await.unwrap();
        assert!(answer.ends_with(" chars"));
        assert_eq!(registry.team("pair").unwrap().performance_metrics().len(), 2);
    }

    #[test]
    fn test_load_checked_rejects_problems() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covey.yaml");
        std::fs::write(&path, "model:\n  command: x\nagents:\n  - name: a\n    tools: [nope]\n").unwrap();
        assert!(matches!(load_checked(&path), Err(CliError::Invalid(p)) if p.len() == 1));
    }
}
