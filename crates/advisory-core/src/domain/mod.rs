//! Domain models for advisory.
//!
//! - `AgentRole`: the closed set of analyst roles
//! - `RunParameters`: opaque caller parameters
//! - `AgentArtifact`: one role's persisted output
//! - `EngagementResult`: the terminal output of a run

pub mod artifact;
pub mod engagement;
pub mod parameters;
pub mod role;

pub use artifact::{AgentArtifact, ArtifactMetadata, ArtifactStatus};
pub use engagement::{EngagementResult, EngagementStatus, RoleOutcome, RoleResults};
pub use parameters::RunParameters;
pub use role::{AgentRole, UnknownRole};
