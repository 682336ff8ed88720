//! Prompt catalog: per-role prompts and token budgets loaded from YAML.
//!
//! The catalog is loaded and validated once, then shared read-only with the
//! agent unit through the [`PromptProvider`] trait.
//!
//! ```yaml
//! global:
//!   model: gpt-5
//!   max_completion_tokens: 4000
//! system_instructions:
//!   general: ["Be specific"]
//!   analysis_framework: ["Start from the customer"]
//! agents:
//!   business_model_analyst:
//!     system_prompt: "You are ..."
//!     user_prompt_template: "Analyze {{company_name}} ... {{dependency_outputs_section}}"
//! token_limits:
//!   senior_partner: 6000
//! ```
//!
//! User prompt templates are Handlebars templates compiled at load time in
//! strict mode, so a template naming anything other than `company_name`,
//! `analysis_parameters` or `dependency_outputs_section` is rejected before
//! any agent runs. Output is not HTML-escaped.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::role::AgentRole;

/// Model used when the catalog does not name one.
pub const DEFAULT_MODEL: &str = "gpt-5";
/// Token budget used when neither the role nor the catalog sets one.
pub const DEFAULT_TOKEN_LIMIT: u32 = 4000;

const REQUIRED_SECTIONS: [&str; 4] = ["global", "system_instructions", "agents", "token_limits"];

/// Errors raised while loading or using the prompt catalog.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("prompt catalog not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read prompt catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in prompt catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("prompt catalog is missing required section: {0}")]
    MissingSection(&'static str),

    #[error("prompt catalog is missing required agent: {0}")]
    MissingAgent(String),

    #[error("agent {agent} is missing {field}")]
    MissingField { agent: String, field: &'static str },

    #[error("agent {agent} has a malformed user prompt template: {reason}")]
    InvalidTemplate { agent: String, reason: String },
}

/// Result type for catalog operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Fully rendered prompt pair for one agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub token_budget: u32,
}

/// Source of per-role prompts.
pub trait PromptProvider: Send + Sync {
    /// Build the system and user prompt for `role`.
    ///
    /// `dependency_context` is the concatenated output of the role's
    /// dependencies; it is empty when none produced output.
    fn render(
        &self,
        role: AgentRole,
        subject_name: &str,
        parameters_json: &str,
        dependency_context: &str,
    ) -> ConfigResult<RenderedPrompt>;
}

/// Prompt texts for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPrompt {
    pub system_prompt: String,
    pub user_prompt_template: String,
}

/// Size summary for one role, shown by `advisory --list-agents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub role: AgentRole,
    pub system_prompt_length: usize,
    pub user_prompt_length: usize,
    pub token_limit: u32,
}

/// Values available to a user prompt template.
#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    company_name: &'a str,
    analysis_parameters: &'a str,
    dependency_outputs_section: &'a str,
}

impl TemplateContext<'static> {
    fn empty() -> Self {
        Self {
            company_name: "",
            analysis_parameters: "",
            dependency_outputs_section: "",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCatalog {
    global: Option<RawGlobal>,
    system_instructions: Option<RawInstructions>,
    agents: Option<BTreeMap<String, RawAgent>>,
    token_limits: Option<BTreeMap<String, u32>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGlobal {
    model: Option<String>,
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInstructions {
    #[serde(default)]
    general: Vec<String>,
    #[serde(default)]
    analysis_framework: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAgent {
    system_prompt: Option<String>,
    user_prompt_template: Option<String>,
}

/// Validated, immutable prompt catalog.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    model: String,
    default_token_limit: u32,
    general_instructions: Vec<String>,
    analysis_framework: Vec<String>,
    agents: HashMap<AgentRole, AgentPrompt>,
    token_limits: HashMap<AgentRole, u32>,
    templates: Handlebars<'static>,
}

impl PromptCatalog {
    /// Load and validate a YAML catalog from disk.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parse and validate a YAML catalog.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let raw: Option<RawCatalog> = serde_yaml::from_str(yaml)?;
        let raw = raw.unwrap_or_default();

        let global = raw.global.ok_or(ConfigError::MissingSection(REQUIRED_SECTIONS[0]))?;
        let instructions = raw
            .system_instructions
            .ok_or(ConfigError::MissingSection(REQUIRED_SECTIONS[1]))?;
        let mut raw_agents = raw.agents.ok_or(ConfigError::MissingSection(REQUIRED_SECTIONS[2]))?;
        let raw_limits = raw
            .token_limits
            .ok_or(ConfigError::MissingSection(REQUIRED_SECTIONS[3]))?;

        let mut templates = Handlebars::new();
        templates.set_strict_mode(true);
        templates.register_escape_fn(handlebars::no_escape);

        let mut agents = HashMap::new();
        for role in AgentRole::ALL {
            let raw_agent = raw_agents
                .remove(role.id())
                .ok_or_else(|| ConfigError::MissingAgent(role.id().to_string()))?;
            let system_prompt = raw_agent.system_prompt.ok_or(ConfigError::MissingField {
                agent: role.id().to_string(),
                field: "system_prompt",
            })?;
            let user_prompt_template =
                raw_agent.user_prompt_template.ok_or(ConfigError::MissingField {
                    agent: role.id().to_string(),
                    field: "user_prompt_template",
                })?;

            let invalid = |reason: String| ConfigError::InvalidTemplate {
                agent: role.id().to_string(),
                reason,
            };
            templates
                .register_template_string(role.id(), &user_prompt_template)
                .map_err(|e| invalid(e.to_string()))?;
            // Strict mode reports unknown placeholders only when rendering.
            templates
                .render(role.id(), &TemplateContext::empty())
                .map_err(|e| invalid(e.to_string()))?;

            agents.insert(
                role,
                AgentPrompt {
                    system_prompt,
                    user_prompt_template,
                },
            );
        }
        for unknown in raw_agents.keys() {
            warn!(agent = %unknown, "ignoring prompt for unknown agent");
        }

        let mut token_limits = HashMap::new();
        for (key, limit) in raw_limits {
            match key.parse::<AgentRole>() {
                Ok(role) => {
                    token_limits.insert(role, limit);
                }
                Err(_) => warn!(agent = %key, "ignoring token limit for unknown agent"),
            }
        }

        Ok(Self {
            model: global.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            default_token_limit: global.max_completion_tokens.unwrap_or(DEFAULT_TOKEN_LIMIT),
            general_instructions: instructions.general,
            analysis_framework: instructions.analysis_framework,
            agents,
            token_limits,
            templates,
        })
    }

    /// Model name from the `global` section.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Role-specific budget, falling back to the global default.
    pub fn token_limit(&self, role: AgentRole) -> u32 {
        self.token_limits
            .get(&role)
            .copied()
            .unwrap_or(self.default_token_limit)
    }

    pub fn agent_prompt(&self, role: AgentRole) -> Option<&AgentPrompt> {
        self.agents.get(&role)
    }

    /// The role's system prompt followed by the shared instruction blocks.
    pub fn enhanced_system_prompt(&self, role: AgentRole) -> Option<String> {
        let prompt = self.agents.get(&role)?;
        let mut out = format!("{}\n\n", prompt.system_prompt);

        if !self.general_instructions.is_empty() {
            out.push_str("General Instructions:\n");
            for instruction in &self.general_instructions {
                out.push_str(&format!("- {instruction}\n"));
            }
            out.push('\n');
        }

        if !self.analysis_framework.is_empty() {
            out.push_str("Analysis Framework:\n");
            for step in &self.analysis_framework {
                out.push_str(&format!("- {step}\n"));
            }
        }

        Some(out)
    }

    /// One summary line per role, in declaration order.
    pub fn agent_summaries(&self) -> Vec<AgentSummary> {
        AgentRole::ALL
            .into_iter()
            .filter_map(|role| {
                self.agents.get(&role).map(|prompt| AgentSummary {
                    role,
                    system_prompt_length: prompt.system_prompt.len(),
                    user_prompt_length: prompt.user_prompt_template.len(),
                    token_limit: self.token_limit(role),
                })
            })
            .collect()
    }
}

impl PromptProvider for PromptCatalog {
    fn render(
        &self,
        role: AgentRole,
        subject_name: &str,
        parameters_json: &str,
        dependency_context: &str,
    ) -> ConfigResult<RenderedPrompt> {
        let system_prompt = self
            .enhanced_system_prompt(role)
            .ok_or_else(|| ConfigError::MissingAgent(role.id().to_string()))?;

        let dependency_section = if dependency_context.trim().is_empty() {
            String::new()
        } else {
            format!("Dependency Outputs:\n\n{dependency_context}")
        };

        let context = TemplateContext {
            company_name: subject_name,
            analysis_parameters: parameters_json,
            dependency_outputs_section: &dependency_section,
        };
        let user_prompt = self
            .templates
            .render(role.id(), &context)
            .map_err(|e| ConfigError::InvalidTemplate {
                agent: role.id().to_string(),
                reason: e.to_string(),
            })?;

        Ok(RenderedPrompt {
            system_prompt,
            user_prompt,
            token_budget: self.token_limit(role),
        })
    }
}
