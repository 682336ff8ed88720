//! Structured observability hooks for the engagement lifecycle.
//!
//! Emission functions for engagement start and finish, phase barriers,
//! per-agent outcomes, artifact persistence and the report. Events are
//! emitted at `info!` level, failures at `warn!`. They inherit the
//! engagement span opened by `PhaseScheduler::execute`.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::role::AgentRole;

/// Emit event: engagement started.
pub fn emit_engagement_started(engagement_id: &str, subject: &str, phases: usize) {
    info!(
        event = "engagement.started",
        engagement_id = %engagement_id,
        subject = %subject,
        phases = phases,
    );
}

/// Emit event: phase `phase` (1-based) is about to fan out.
pub fn emit_phase_started(phase: usize, roles: &[AgentRole]) {
    let roles: Vec<&str> = roles.iter().map(|role| role.id()).collect();
    info!(event = "phase.started", phase = phase, roles = ?roles);
}

/// Emit event: every task of phase `phase` has been joined.
pub fn emit_phase_finished(phase: usize, completed: usize, failed: usize) {
    info!(
        event = "phase.finished",
        phase = phase,
        completed = completed,
        failed = failed,
    );
}

/// Emit event: an agent produced its artifact.
pub fn emit_agent_completed(role: AgentRole, chars: usize) {
    info!(event = "agent.completed", role = %role, chars = chars);
}

/// Emit event: an agent failed (warning level).
pub fn emit_agent_failed(role: AgentRole, error: &dyn std::fmt::Display) {
    warn!(event = "agent.failed", role = %role, error = %error);
}

/// Emit event: an artifact was written to the store.
pub fn emit_artifact_saved(role: AgentRole, path: &Path) {
    info!(event = "artifact.saved", role = %role, path = %path.display());
}

/// Emit event: an artifact could not be written (warning level).
pub fn emit_artifact_save_failed(role: AgentRole, error: &dyn std::fmt::Display) {
    warn!(event = "artifact.save_failed", role = %role, error = %error);
}

/// Emit event: the aggregate report was written.
pub fn emit_report_written(path: &Path, sections: usize) {
    info!(event = "report.written", path = %path.display(), sections = sections);
}

/// Emit event: engagement finished with duration and per-role tallies.
pub fn emit_engagement_finished(
    engagement_id: &str,
    duration_ms: u64,
    completed: usize,
    failed: usize,
) {
    info!(
        event = "engagement.finished",
        engagement_id = %engagement_id,
        duration_ms = duration_ms,
        completed = completed,
        failed = failed,
    );
}
