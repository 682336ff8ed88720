//! Engagement orchestration.
//!
//! - `plan`: dependency graph and validated phase plan
//! - `agent`: the role-parameterized agent unit
//! - `scheduler`: phased fan-out/fan-in execution
//! - `error`: plan, agent and engagement errors

pub mod agent;
pub mod error;
pub mod plan;
pub mod scheduler;

pub use agent::AgentUnit;
pub use error::{AgentError, EngagementError, PlanError, PlanResult};
pub use plan::{standard_phases, validate_phase_plan, DependencyGraph, PhasePlan};
pub use scheduler::{PhaseScheduler, ENGAGEMENT_METADATA_FILE};
