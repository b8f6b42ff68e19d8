//! Coordinator plans.
//!
//! A plan is a JSON array embedded somewhere in the coordinator's reply.
//! Everything from the first `[` to the last `]` is taken as the array, so
//! prose around it is ignored.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// One delegated subtask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub subtask: String,
    #[serde(alias = "agentName")]
    pub agent_name: String,
    /// Indices of earlier steps whose results this step receives.
    #[serde(default, alias = "dependsOn")]
    pub depends_on: Vec<usize>,
}

impl PlanStep {
    pub fn new(subtask: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            subtask: subtask.into(),
            agent_name: agent_name.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn after(mut self, deps: impl IntoIterator<Item = usize>) -> Self {
        self.depends_on.extend(deps);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    /// Extract and check the plan contained in `response`.
    ///
    /// Dependency indices must point at another step of the same plan.
    pub fn parse(response: &str) -> Result<Self, PlanError> {
        let span = extract_array(response)
            .ok_or_else(|| PlanError::NotFound {
                response: response.to_string(),
            })?
            .ok_or_else(|| PlanError::Invalid {
                reason: "closing bracket comes before the opening bracket".to_string(),
                response: response.to_string(),
            })?;

        let steps: Vec<PlanStep> =
            serde_json::from_str(span).map_err(|e| PlanError::Invalid {
                reason: e.to_string(),
                response: response.to_string(),
            })?;

        let plan = Self { steps };
        plan.check_dependencies().map_err(|reason| PlanError::Invalid {
            reason,
            response: response.to_string(),
        })?;
        Ok(plan)
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn check_dependencies(&self) -> Result<(), String> {
        for (idx, step) in self.steps.iter().enumerate() {
            for &dep in &step.depends_on {
                if dep == idx {
                    return Err(format!("step {idx} depends on itself"));
                }
                if dep >= self.steps.len() {
                    return Err(format!("step {idx} depends on missing step {dep}"));
                }
            }
        }
        Ok(())
    }
}

/// `None` when either bracket is missing, `Some(None)` when they are
/// out of order.
fn extract_array(text: &str) -> Option<Option<&str>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    Some((end > start).then(|| &text[start..=end]))
}
