//! Advisory Core Library
//!
//! Runs a team of specialised consulting agents against one subject in
//! dependency-ordered phases, persists every agent's artifact, and folds the
//! results into a single strategic report.

pub mod completion;
pub mod domain;
pub mod fakes;
pub mod metrics;
pub mod obs;
pub mod orchestration;
pub mod prompts;
pub mod report;
pub mod store;
pub mod telemetry;

pub use completion::openai::{OpenAiCompletion, OpenAiConfig};
pub use completion::{CompletionError, CompletionRequest, CompletionService};

pub use domain::{
    AgentArtifact, AgentRole, ArtifactMetadata, ArtifactStatus, EngagementResult, EngagementStatus,
    RoleOutcome, RoleResults, RunParameters, UnknownRole,
};

pub use orchestration::{
    AgentError, AgentUnit, DependencyGraph, EngagementError, PhasePlan, PhaseScheduler, PlanError,
};

pub use prompts::{
    AgentSummary, ConfigError, PromptCatalog, PromptProvider, RenderedPrompt, DEFAULT_MODEL,
    DEFAULT_TOKEN_LIMIT,
};

pub use metrics::{Metrics, MetricsSnapshot};

pub use report::{report_file_name, ReportAssembler};

pub use store::fs::FsArtifactStore;
pub use store::{sanitize_subject, ArtifactStore, StoreError};

pub use telemetry::init_tracing;
