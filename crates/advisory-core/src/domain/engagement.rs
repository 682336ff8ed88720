//! Per-role outcomes and the terminal engagement result.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::artifact::AgentArtifact;
use crate::domain::parameters::RunParameters;
use crate::domain::role::AgentRole;
use crate::metrics::MetricsSnapshot;

/// What happened to one role during an engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoleOutcome {
    /// The agent produced an artifact.
    ///
    /// `persist_error` is set when the artifact could not be written to the
    /// store; the agent itself still counts as completed.
    Completed {
        artifact: AgentArtifact,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        persist_error: Option<String>,
    },
    /// The agent call failed.
    Error { error: String },
}

impl RoleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RoleOutcome::Completed { .. })
    }

    pub fn artifact(&self) -> Option<&AgentArtifact> {
        match self {
            RoleOutcome::Completed { artifact, .. } => Some(artifact),
            RoleOutcome::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RoleOutcome::Completed { .. } => None,
            RoleOutcome::Error { error } => Some(error),
        }
    }
}

/// Insertion-ordered map of role outcomes.
///
/// The scheduler inserts in phase order, then declaration order within a
/// phase; the report assembler relies on that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleResults {
    entries: Vec<(AgentRole, RoleOutcome)>,
}

impl RoleResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the outcome for `role`. A replaced entry keeps its
    /// original position.
    pub fn insert(&mut self, role: AgentRole, outcome: RoleOutcome) -> Option<RoleOutcome> {
        match self.entries.iter_mut().find(|(r, _)| *r == role) {
            Some((_, existing)) => Some(std::mem::replace(existing, outcome)),
            None => {
                self.entries.push((role, outcome));
                None
            }
        }
    }

    pub fn get(&self, role: AgentRole) -> Option<&RoleOutcome> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentRole, &RoleOutcome)> {
        self.entries.iter().map(|(role, outcome)| (*role, outcome))
    }

    pub fn roles(&self) -> Vec<AgentRole> {
        self.entries.iter().map(|(role, _)| *role).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for RoleResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (role, outcome) in &self.entries {
            map.serialize_entry(role, outcome)?;
        }
        map.end()
    }
}

/// Overall run status. A run always completes; degraded runs are visible
/// only through the per-role results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStatus {
    Completed,
}

/// Terminal output of one engagement.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementResult {
    pub engagement_id: Uuid,
    pub subject_name: String,
    pub parameters: RunParameters,
    pub results: RoleResults,
    pub report_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: EngagementStatus,
    /// Counters for this engagement only.
    pub metrics: MetricsSnapshot,
}

impl EngagementResult {
    pub fn completed_roles(&self) -> Vec<AgentRole> {
        self.results
            .iter()
            .filter(|(_, outcome)| outcome.is_completed())
            .map(|(role, _)| role)
            .collect()
    }

    pub fn failed_roles(&self) -> Vec<AgentRole> {
        self.results
            .iter()
            .filter(|(_, outcome)| !outcome.is_completed())
            .map(|(role, _)| role)
            .collect()
    }

    /// True when at least one role failed.
    pub fn is_degraded(&self) -> bool {
        !self.failed_roles().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(role: AgentRole) -> RoleOutcome {
        RoleOutcome::Completed {
            artifact: AgentArtifact::completed(
                role,
                "Acme",
                format!("{role} output"),
                RunParameters::new(),
                vec![],
            ),
            persist_error: None,
        }
    }

    #[test]
    fn test_role_results_preserve_insertion_order() {
        let mut results = RoleResults::new();
        results.insert(AgentRole::RiskAssessor, completed(AgentRole::RiskAssessor));
        results.insert(
            AgentRole::BusinessModelAnalyst,
            completed(AgentRole::BusinessModelAnalyst),
        );
        assert_eq!(
            results.roles(),
            vec![AgentRole::RiskAssessor, AgentRole::BusinessModelAnalyst]
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut results = RoleResults::new();
        results.insert(AgentRole::RiskAssessor, completed(AgentRole::RiskAssessor));
        results.insert(AgentRole::SeniorPartner, completed(AgentRole::SeniorPartner));
        let previous = results.insert(
            AgentRole::RiskAssessor,
            RoleOutcome::Error {
                error: "quota".to_string(),
            },
        );
        assert!(previous.unwrap().is_completed());
        assert_eq!(results.len(), 2);
        assert_eq!(results.roles()[0], AgentRole::RiskAssessor);
        assert_eq!(
            results.get(AgentRole::RiskAssessor).unwrap().error(),
            Some("quota")
        );
    }

    #[test]
    fn test_error_outcome_serializes_with_status_tag() {
        let outcome = RoleOutcome::Error {
            error: "boom".to_string(),
        };
        let raw = serde_json::to_value(&outcome).unwrap();
        assert_eq!(raw, serde_json::json!({"status": "error", "error": "boom"}));
    }

    #[test]
    fn test_results_serialize_as_ordered_object() {
        let mut results = RoleResults::new();
        results.insert(AgentRole::SeniorPartner, completed(AgentRole::SeniorPartner));
        results.insert(
            AgentRole::MarketResearcher,
            RoleOutcome::Error {
                error: "timeout".to_string(),
            },
        );
        let json = serde_json::to_string(&results).unwrap();
        let senior = json.find("\"senior_partner\"").unwrap();
        let market = json.find("\"market_researcher\"").unwrap();
        assert!(senior < market);
    }
}
