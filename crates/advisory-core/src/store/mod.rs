pub mod fs;

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::artifact::AgentArtifact;
use crate::domain::role::AgentRole;

/// Errors from artifact store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document name: {0}")]
    InvalidName(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable, role-partitioned storage for agent artifacts.
///
/// Each role writes only under its own partition, so concurrent saves from
/// one phase never touch the same path.
pub trait ArtifactStore: Send + Sync {
    /// Persist `artifact` and its metadata sidecar. Returns the artifact's
    /// storage path.
    fn save(&self, artifact: &AgentArtifact) -> Result<PathBuf>;

    /// Content of the most recently written artifact for `role`, if any.
    fn latest_content(&self, role: AgentRole) -> Result<Option<String>>;

    /// Write a project-level document, replacing any previous version.
    fn write_document(&self, file_name: &str, content: &str) -> Result<PathBuf>;
}

/// Directory- and file-name-safe form of a subject name.
pub fn sanitize_subject(subject: &str) -> String {
    subject.replace([' ', '/'], "_")
}
