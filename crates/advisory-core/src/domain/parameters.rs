//! Run parameters: the opaque key/value bag handed to every agent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::role::AgentRole;

/// Caller-supplied parameters, passed unchanged to every agent.
///
/// The scheduler never inspects the contents; agents only see the pretty
/// JSON rendering inside their user prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunParameters(Map<String, Value>);

impl RunParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// The parameter set used for a full strategic engagement.
    pub fn standard_engagement(brief: &str) -> Self {
        let deliverables: Vec<Value> = AgentRole::ALL
            .iter()
            .map(|role| Value::String(role.deliverable().to_string()))
            .collect();

        Self::new()
            .with("analysis_brief", brief)
            .with("engagement_type", "comprehensive_strategic_analysis")
            .with("analysis_depth", "executive_level")
            .with("deliverables", Value::Array(deliverables))
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty JSON rendering, as embedded in prompts and the report.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Map<String, Value>> for RunParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
