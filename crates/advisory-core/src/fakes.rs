//! In-memory fakes for the engagement seams (testing only).
//!
//! Provides `StubCompletion`, `MemoryArtifactStore` and a small prompt
//! catalog that satisfy the trait contracts without network or disk access.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::completion::{CompletionError, CompletionRequest, CompletionService};
use crate::domain::artifact::AgentArtifact;
use crate::domain::role::AgentRole;
use crate::prompts::PromptCatalog;
use crate::store::{ArtifactStore, Result as StoreResult, StoreError};

// ---------------------------------------------------------------------------
// Prompt catalog
// ---------------------------------------------------------------------------

/// YAML for a catalog whose system prompt for each role starts with
/// `You are the <role_id>.`; [`role_of`] relies on that prefix.
pub fn test_catalog_yaml() -> String {
    let mut yaml = String::from(
        "global:\n  model: stub-model\n  max_completion_tokens: 2000\n\
         system_instructions:\n  general:\n    - Be concise\n  analysis_framework:\n    - Evidence first\n\
         agents:\n",
    );
    for role in AgentRole::ALL {
        yaml.push_str(&format!(
            "  {id}: {{system_prompt: \"You are the {id}.\", user_prompt_template: \"Subject: {{{{company_name}}}}\\nParameters: {{{{analysis_parameters}}}}\\n{{{{dependency_outputs_section}}}}\"}}\n",
            id = role.id()
        ));
    }
    yaml.push_str("token_limits:\n  senior_partner: 6000\n");
    yaml
}

/// A validated catalog built from [`test_catalog_yaml`].
pub fn test_catalog() -> PromptCatalog {
    PromptCatalog::from_yaml_str(&test_catalog_yaml()).expect("test catalog is valid")
}

/// Recover the role a request was rendered for from its system prompt.
pub fn role_of(request: &CompletionRequest) -> Option<AgentRole> {
    AgentRole::ALL.into_iter().find(|role| {
        request
            .system_prompt
            .starts_with(&format!("You are the {}.", role.id()))
    })
}

// ---------------------------------------------------------------------------
// StubCompletion
// ---------------------------------------------------------------------------

type Responder = dyn Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync;

/// Closure-driven completion service that records every request.
pub struct StubCompletion {
    responder: Box<Responder>,
    delay: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubCompletion {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `"<role> output"`.
    pub fn echo_role() -> Self {
        Self::new(|request| {
            role_of(request)
                .map(|role| format!("{role} output"))
                .ok_or_else(|| CompletionError::Provider("unrecognised system prompt".to_string()))
        })
    }

    /// Like [`StubCompletion::echo_role`], but fails for `failing`.
    pub fn failing_for(failing: &[AgentRole]) -> Self {
        let failing: HashSet<AgentRole> = failing.iter().copied().collect();
        Self::new(move |request| match role_of(request) {
            Some(role) if failing.contains(&role) => {
                Err(CompletionError::RateLimited(format!("quota exhausted for {role}")))
            }
            Some(role) => Ok(format!("{role} output")),
            None => Err(CompletionError::Provider("unrecognised system prompt".to_string())),
        })
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The request received for `role`, if any.
    pub fn request_for(&self, role: AgentRole) -> Option<CompletionRequest> {
        self.requests()
            .into_iter()
            .find(|request| role_of(request) == Some(role))
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(request)
    }
}

// ---------------------------------------------------------------------------
// MemoryArtifactStore
// ---------------------------------------------------------------------------

/// In-memory artifact store with injectable save failures.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<HashMap<AgentRole, Vec<AgentArtifact>>>,
    documents: Mutex<BTreeMap<String, String>>,
    failing_roles: HashSet<AgentRole>,
    fail_documents: bool,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `save` for `role` fail with an I/O error.
    pub fn failing_saves_for(mut self, role: AgentRole) -> Self {
        self.failing_roles.insert(role);
        self
    }

    /// Make every `write_document` fail with an I/O error.
    pub fn failing_documents(mut self) -> Self {
        self.fail_documents = true;
        self
    }

    /// Artifacts saved for `role`, oldest first.
    pub fn saved(&self, role: AgentRole) -> Vec<AgentArtifact> {
        self.artifacts
            .lock()
            .unwrap()
            .get(&role)
            .cloned()
            .unwrap_or_default()
    }

    pub fn document(&self, file_name: &str) -> Option<String> {
        self.documents.lock().unwrap().get(file_name).cloned()
    }
}

fn injected_failure(what: &str) -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("injected {what} failure"),
    ))
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, artifact: &AgentArtifact) -> StoreResult<PathBuf> {
        if self.failing_roles.contains(&artifact.role) {
            return Err(injected_failure("save"));
        }
        let mut artifacts = self.artifacts.lock().unwrap();
        let saved = artifacts.entry(artifact.role).or_default();
        saved.push(artifact.clone());
        Ok(PathBuf::from("memory")
            .join(artifact.role.id())
            .join(format!("{}.md", saved.len())))
    }

    fn latest_content(&self, role: AgentRole) -> StoreResult<Option<String>> {
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .get(&role)
            .and_then(|saved| saved.last())
            .map(|artifact| artifact.content.clone()))
    }

    fn write_document(&self, file_name: &str, content: &str) -> StoreResult<PathBuf> {
        if self.fail_documents {
            return Err(injected_failure("document"));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(file_name.to_string(), content.to_string());
        Ok(PathBuf::from("memory").join(file_name))
    }
}
