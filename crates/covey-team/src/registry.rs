//! Named agents and teams owned by one object instead of process-wide state.

use covey_agent::Coworker;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::config::TeamConfig;
use crate::error::{TeamError, TeamResult};
use crate::team::Team;

#[derive(Default)]
struct Entries {
    agents: BTreeMap<String, Arc<dyn Coworker>>,
    teams: BTreeMap<String, Arc<Team>>,
}

/// Lookup tables for agents and teams, shared by reference with whatever
/// serves requests.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<Entries>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the agent's own name, replacing any previous entry.
    pub fn register_agent(&self, agent: Arc<dyn Coworker>) -> Option<Arc<dyn Coworker>> {
        let name = agent.name().to_string();
        let previous = self.write().agents.insert(name.clone(), agent);
        if previous.is_some() {
            warn!(agent = %name, "Replaced registered agent");
        }
        previous
    }

    pub fn agent(&self, name: &str) -> Option<Arc<dyn Coworker>> {
        self.read().agents.get(name).cloned()
    }

    pub fn remove_agent(&self, name: &str) -> Option<Arc<dyn Coworker>> {
        self.write().agents.remove(name)
    }

    /// Registered agent names, sorted.
    pub fn agent_names(&self) -> Vec<String> {
        self.read().agents.keys().cloned().collect()
    }

    pub fn register_team(&self, team: Arc<Team>) -> Option<Arc<Team>> {
        let name = team.name().to_string();
        let previous = self.write().teams.insert(name.clone(), team);
        if let Some(old) = &previous {
            warn!(team = %name, "Replaced registered team");
            old.shutdown();
        }
        previous
    }

    pub fn team(&self, name: &str) -> Option<Arc<Team>> {
        self.read().teams.get(name).cloned()
    }

    pub fn remove_team(&self, name: &str) -> Option<Arc<Team>> {
        self.write().teams.remove(name)
    }

    /// Registered team names, sorted.
    pub fn team_names(&self) -> Vec<String> {
        self.read().teams.keys().cloned().collect()
    }

    /// Create a team from registered agents and register it.
    ///
    /// Fails with [`TeamError::AgentNotFound`] on the first unknown member,
    /// in which case nothing is registered.
    pub fn build_team(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        members: &[impl AsRef<str>],
        config: TeamConfig,
    ) -> TeamResult<Arc<Team>> {
        let roster = {
            let entries = self.read();
            members
                .iter()
                .map(|member| {
                    let member = member.as_ref();
                    entries
                        .agents
                        .get(member)
                        .cloned()
                        .ok_or_else(|| TeamError::AgentNotFound(member.to_string()))
                })
                .collect::<TeamResult<Vec<_>>>()?
        };

        let team = Arc::new(Team::new(name, description, config));
        for agent in roster {
            team.add_agent(agent);
        }
        info!(team = %team.name(), members = team.member_count(), "Team built");
        self.register_team(Arc::clone(&team));
        Ok(team)
    }

    /// Shut down every team and clear the registry.
    pub fn shutdown(&self) {
        let entries = std::mem::take(&mut *self.write());
        for team in entries.teams.values() {
            team.shutdown();
        }
        info!(
            teams = entries.teams.len(),
            agents = entries.agents.len(),
            "Registry shut down"
        );
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("agents", &self.agent_names())
            .field("teams", &self.team_names())
            .finish()
    }
}
