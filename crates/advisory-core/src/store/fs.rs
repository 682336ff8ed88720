use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;
use tracing::warn;

use super::{sanitize_subject, ArtifactStore, Result, StoreError};
use crate::domain::artifact::{AgentArtifact, ArtifactMetadata};
use crate::domain::role::AgentRole;

const ARTIFACT_EXTENSION: &str = "md";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Filesystem-backed artifact store.
///
/// Layout:
/// `<output_dir>/<subject>/agent_outputs/<role>/<role>_<timestamp>.md`
/// with a `<role>_<timestamp>_metadata.json` sidecar next to each artifact.
/// Project-level documents live directly under `<output_dir>/<subject>/`.
pub struct FsArtifactStore {
    project_dir: PathBuf,
}

impl FsArtifactStore {
    /// Create the store for `subject` under `output_dir`, creating the
    /// project directory if needed.
    pub fn new(output_dir: impl AsRef<Path>, subject: &str) -> Result<Self> {
        let project_dir = output_dir.as_ref().join(sanitize_subject(subject));
        fs::create_dir_all(project_dir.join("agent_outputs"))?;
        Ok(Self { project_dir })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Directory holding every artifact written for `role`.
    pub fn role_dir(&self, role: AgentRole) -> PathBuf {
        self.project_dir.join("agent_outputs").join(role.id())
    }

    /// Artifact files for `role`, newest first by modification time.
    pub fn artifact_files(&self, role: AgentRole) -> Result<Vec<PathBuf>> {
        let dir = self.role_dir(role);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            files.push((modified, path));
        }

        // Newest first; ties fall back to the timestamped file name.
        files.sort_by(|a, b| b.cmp(a));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }
}

/// Create `path` with `data` without ever replacing an existing file.
fn write_new(dir: &Path, path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, artifact: &AgentArtifact) -> Result<PathBuf> {
        let dir = self.role_dir(artifact.role);
        fs::create_dir_all(&dir)?;

        let stem = format!(
            "{}_{}",
            artifact.role.id(),
            artifact.created_at.format(TIMESTAMP_FORMAT)
        );
        let artifact_path = dir.join(format!("{stem}.{ARTIFACT_EXTENSION}"));
        write_new(&dir, &artifact_path, artifact.content.as_bytes())?;

        let metadata = ArtifactMetadata::for_artifact(artifact, &artifact_path);
        let metadata_path = dir.join(format!("{stem}_metadata.json"));
        let sidecar = serde_json::to_vec_pretty(&metadata)
            .map_err(StoreError::from)
            .and_then(|json| write_new(&dir, &metadata_path, &json));
        if let Err(e) = sidecar {
            // An artifact without its sidecar must not be readable as output.
            if let Err(cleanup) = fs::remove_file(&artifact_path) {
                warn!(path = %artifact_path.display(), error = %cleanup, "failed to remove orphaned artifact");
            }
            return Err(e);
        }

        Ok(artifact_path)
    }

    fn latest_content(&self, role: AgentRole) -> Result<Option<String>> {
        match self.artifact_files(role)?.first() {
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }

    fn write_document(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name == ".." {
            return Err(StoreError::InvalidName(file_name.to_string()));
        }
        let path = self.project_dir.join(file_name);

        let mut tmp = NamedTempFile::new_in(&self.project_dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(path)
    }
}
