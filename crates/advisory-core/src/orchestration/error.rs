//! Error types for engagement orchestration.

use crate::completion::CompletionError;
use crate::domain::role::AgentRole;
use crate::store::StoreError;

/// A hand-specified phase plan that contradicts the dependency graph.
///
/// Phase numbers in messages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("phase {phase} contains no roles")]
    EmptyPhase { phase: usize },

    #[error("role {0} is scheduled more than once")]
    DuplicateRole(AgentRole),

    #[error("role {0} is not scheduled in any phase")]
    MissingRole(AgentRole),

    #[error(
        "role {role} (phase {role_phase}) depends on {dependency} (phase {dependency_phase}), \
         which does not run in an earlier phase"
    )]
    DependencyOrder {
        role: AgentRole,
        dependency: AgentRole,
        role_phase: usize,
        dependency_phase: usize,
    },
}

/// Result type for plan construction.
pub type PlanResult<T> = std::result::Result<T, PlanError>;

/// Failure of a single agent run, tagged with its role.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent {role} could not render its prompt: {reason}")]
    Prompt { role: AgentRole, reason: String },

    #[error("agent {role} completion failed: {source}")]
    Completion {
        role: AgentRole,
        #[source]
        source: CompletionError,
    },

    #[error("agent {role} task panicked: {detail}")]
    Panicked { role: AgentRole, detail: String },
}

impl AgentError {
    pub fn role(&self) -> AgentRole {
        match self {
            AgentError::Prompt { role, .. }
            | AgentError::Completion { role, .. }
            | AgentError::Panicked { role, .. } => *role,
        }
    }
}

/// Errors that escape [`PhaseScheduler::execute`](crate::orchestration::scheduler::PhaseScheduler::execute).
///
/// Agent failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    #[error("failed to write final report: {0}")]
    Report(#[from] StoreError),
}
