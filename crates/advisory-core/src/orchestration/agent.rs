//! The agent unit: one generic runner parameterized by role.
//!
//! A run reads its dependencies' latest artifacts from the store, renders
//! one prompt, makes one completion call and returns a new artifact.
//! Persisting that artifact is left to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::completion::{CompletionError, CompletionRequest, CompletionService};
use crate::domain::artifact::AgentArtifact;
use crate::domain::parameters::RunParameters;
use crate::domain::role::AgentRole;
use crate::orchestration::error::AgentError;
use crate::prompts::PromptProvider;
use crate::store::ArtifactStore;

/// Runs any role of the team against one subject.
pub struct AgentUnit {
    subject_name: String,
    model: String,
    prompts: Arc<dyn PromptProvider>,
    completion: Arc<dyn CompletionService>,
    store: Arc<dyn ArtifactStore>,
    timeout: Option<Duration>,
}

impl AgentUnit {
    pub fn new(
        subject_name: &str,
        model: &str,
        prompts: Arc<dyn PromptProvider>,
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            subject_name: subject_name.to_string(),
            model: model.to_string(),
            prompts,
            completion,
            store,
            timeout: None,
        }
    }

    /// Bound each completion call; an expired call fails like any other.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Concatenated latest output of each dependency, each under its role
    /// heading. Dependencies without readable output are skipped.
    pub fn dependency_context(&self, dependencies: &[AgentRole]) -> String {
        let mut sections = Vec::new();
        for dependency in dependencies {
            match self.store.latest_content(*dependency) {
                Ok(Some(content)) if !content.trim().is_empty() => {
                    sections.push(format!("### {}\n\n{}", dependency.display_name(), content));
                }
                Ok(_) => debug!(dependency = %dependency, "no prior output for dependency"),
                Err(e) => {
                    debug!(dependency = %dependency, error = %e, "could not read dependency output")
                }
            }
        }
        sections.join("\n\n")
    }

    /// Execute `role` once and return its artifact.
    ///
    /// Errors are returned tagged with the role and never retried.
    #[instrument(skip(self, parameters, dependencies), fields(role = %role, subject = %self.subject_name))]
    pub async fn run(
        &self,
        role: AgentRole,
        parameters: &RunParameters,
        dependencies: &[AgentRole],
    ) -> Result<AgentArtifact, AgentError> {
        let context = self.dependency_context(dependencies);
        let rendered = self
            .prompts
            .render(
                role,
                &self.subject_name,
                &parameters.to_pretty_json(),
                &context,
            )
            .map_err(|e| AgentError::Prompt {
                role,
                reason: e.to_string(),
            })?;

        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: rendered.system_prompt,
            user_prompt: rendered.user_prompt,
            max_tokens: rendered.token_budget,
        };

        let call = self.completion.complete(&request);
        let response = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(CompletionError::Timeout(limit)),
            },
            None => call.await,
        }
        .map_err(|source| AgentError::Completion { role, source })?;

        debug!(chars = response.len(), "completion received");

        Ok(AgentArtifact::completed(
            role,
            &self.subject_name,
            response,
            parameters.clone(),
            dependencies.to_vec(),
        ))
    }
}
