//! Agent artifacts and their sidecar metadata.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::parameters::RunParameters;
use crate::domain::role::AgentRole;

/// Status recorded on an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Completed,
}

/// The textual output of one role's single execution.
///
/// Artifacts are never mutated once built. Attaching the storage location
/// after persistence produces a new value via [`AgentArtifact::stored_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentArtifact {
    pub id: Uuid,
    pub role: AgentRole,
    pub subject_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub parameters_used: RunParameters,
    /// Roles whose output was requested as context.
    pub dependencies: Vec<AgentRole>,
    pub status: ArtifactStatus,
    /// Location in the artifact store; `None` until persisted.
    pub storage_path: Option<PathBuf>,
}

impl AgentArtifact {
    /// Build a completed artifact stamped with the current time.
    pub fn completed(
        role: AgentRole,
        subject_name: &str,
        content: String,
        parameters_used: RunParameters,
        dependencies: Vec<AgentRole>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            subject_name: subject_name.to_string(),
            content,
            created_at: Utc::now(),
            parameters_used,
            dependencies,
            status: ArtifactStatus::Completed,
            storage_path: None,
        }
    }

    /// Copy of this artifact with its storage location set.
    pub fn stored_at(self, path: &Path) -> Self {
        Self {
            storage_path: Some(path.to_path_buf()),
            ..self
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// SHA-256 hex digest of the artifact content.
    pub fn content_digest(&self) -> String {
        use sha2::Digest as _;
        hex::encode(sha2::Sha256::digest(self.content.as_bytes()))
    }
}

/// Sidecar record written next to every persisted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: Uuid,
    pub role: AgentRole,
    pub subject_name: String,
    pub created_at: DateTime<Utc>,
    pub parameters_used: RunParameters,
    pub dependencies: Vec<AgentRole>,
    pub status: ArtifactStatus,
    pub storage_path: PathBuf,
    pub content_digest: String,
}

impl ArtifactMetadata {
    pub fn for_artifact(artifact: &AgentArtifact, storage_path: &Path) -> Self {
        Self {
            id: artifact.id,
            role: artifact.role,
            subject_name: artifact.subject_name.clone(),
            created_at: artifact.created_at,
            parameters_used: artifact.parameters_used.clone(),
            dependencies: artifact.dependencies.clone(),
            status: artifact.status,
            storage_path: storage_path.to_path_buf(),
            content_digest: artifact.content_digest(),
        }
    }
}
