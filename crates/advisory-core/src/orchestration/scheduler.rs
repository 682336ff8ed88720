//! Phased fan-out/fan-in execution of the consulting team.
//!
//! Every role of a phase runs in its own tokio task. The phase is a strict
//! barrier: all of its tasks are joined and their artifacts persisted
//! before the next phase starts. A failing or panicking role is recorded
//! and never cancels its siblings or stops later phases.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinError;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::artifact::AgentArtifact;
use crate::domain::engagement::{EngagementResult, EngagementStatus, RoleOutcome, RoleResults};
use crate::domain::parameters::RunParameters;
use crate::domain::role::AgentRole;
use crate::metrics::Metrics;
use crate::obs;
use crate::orchestration::agent::AgentUnit;
use crate::orchestration::error::{AgentError, EngagementError};
use crate::orchestration::plan::PhasePlan;
use crate::report::ReportAssembler;

/// Project-level document holding the serialized [`EngagementResult`].
pub const ENGAGEMENT_METADATA_FILE: &str = "engagement_metadata.json";

pub struct PhaseScheduler {
    plan: PhasePlan,
    agent: Arc<AgentUnit>,
}

impl PhaseScheduler {
    /// The agent's store is used both for persisting artifacts and for the
    /// final report.
    pub fn new(plan: PhasePlan, agent: AgentUnit) -> Self {
        Self {
            plan,
            agent: Arc::new(agent),
        }
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Run every phase in order, then assemble the report.
    ///
    /// Agent and persistence failures are captured in the per-role results;
    /// only a failure to write the report is returned as an error.
    #[instrument(
        skip(self, parameters),
        fields(subject = %self.agent.subject_name(), engagement_id = tracing::field::Empty)
    )]
    pub async fn execute(
        &self,
        parameters: RunParameters,
    ) -> Result<EngagementResult, EngagementError> {
        let engagement_id = Uuid::new_v4();
        let id = engagement_id.to_string();
        tracing::Span::current().record("engagement_id", id.as_str());

        let subject = self.agent.subject_name().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        let metrics = Metrics::new();
        obs::emit_engagement_started(&id, &subject, self.plan.phases().len());

        let mut results = RoleResults::new();
        for (idx, phase) in self.plan.phases().iter().enumerate() {
            self.run_phase(idx + 1, phase, &parameters, &metrics, &mut results)
                .await;
        }

        let store = Arc::clone(self.agent.store());
        let report_path = ReportAssembler::new(&subject, store).assemble(&results, &parameters)?;

        let result = EngagementResult {
            engagement_id,
            subject_name: subject,
            parameters,
            results,
            report_path,
            started_at,
            finished_at: Utc::now(),
            status: EngagementStatus::Completed,
            metrics: metrics.snapshot(),
        };
        self.write_engagement_metadata(&result);

        obs::emit_engagement_finished(
            &id,
            clock.elapsed().as_millis() as u64,
            result.completed_roles().len(),
            result.failed_roles().len(),
        );
        metrics.flush(&id);

        Ok(result)
    }

    async fn run_phase(
        &self,
        number: usize,
        phase: &[AgentRole],
        parameters: &RunParameters,
        metrics: &Metrics,
        results: &mut RoleResults,
    ) {
        obs::emit_phase_started(number, phase);

        let handles = phase.iter().map(|&role| {
            let agent = Arc::clone(&self.agent);
            let parameters = parameters.clone();
            let dependencies = self.plan.graph().dependencies_of(role).to_vec();
            tokio::spawn(async move { agent.run(role, &parameters, &dependencies).await })
        });
        // Barrier: every task of the phase is joined before anything is recorded.
        let joined = join_all(handles).await;

        let (mut completed, mut failed) = (0, 0);
        for (&role, outcome) in phase.iter().zip(joined) {
            let outcome = match outcome {
                Ok(Ok(artifact)) => {
                    completed += 1;
                    self.record_success(artifact, metrics)
                }
                Ok(Err(err)) => {
                    failed += 1;
                    record_failure(err, metrics)
                }
                Err(join_err) => {
                    failed += 1;
                    record_failure(panicked(role, join_err), metrics)
                }
            };
            results.insert(role, outcome);
        }

        obs::emit_phase_finished(number, completed, failed);
    }

    fn record_success(&self, artifact: AgentArtifact, metrics: &Metrics) -> RoleOutcome {
        let role = artifact.role;
        obs::emit_agent_completed(role, artifact.content.len());
        metrics.inc_agents_completed();

        if !artifact.has_content() {
            debug!(role = %role, "empty completion, nothing to persist");
            return RoleOutcome::Completed {
                artifact,
                persist_error: None,
            };
        }

        match self.agent.store().save(&artifact) {
            Ok(path) => {
                obs::emit_artifact_saved(role, &path);
                metrics.inc_artifacts_saved();
                RoleOutcome::Completed {
                    artifact: artifact.stored_at(&path),
                    persist_error: None,
                }
            }
            Err(e) => {
                obs::emit_artifact_save_failed(role, &e);
                RoleOutcome::Completed {
                    artifact,
                    persist_error: Some(e.to_string()),
                }
            }
        }
    }

    fn write_engagement_metadata(&self, result: &EngagementResult) {
        let json = match serde_json::to_string_pretty(result) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize engagement metadata");
                return;
            }
        };
        if let Err(e) = self
            .agent
            .store()
            .write_document(ENGAGEMENT_METADATA_FILE, &json)
        {
            warn!(error = %e, "failed to write engagement metadata");
        }
    }
}

fn record_failure(err: AgentError, metrics: &Metrics) -> RoleOutcome {
    obs::emit_agent_failed(err.role(), &err);
    metrics.inc_agents_failed();
    RoleOutcome::Error {
        error: err.to_string(),
    }
}

fn panicked(role: AgentRole, err: JoinError) -> AgentError {
    let detail = if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        err.to_string()
    };
    AgentError::Panicked { role, detail }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
