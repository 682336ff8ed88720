//! Aggregate report assembly.
//!
//! Folds the per-role outcomes of an engagement into one markdown document
//! at the project root.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::engagement::{RoleOutcome, RoleResults};
use crate::domain::parameters::RunParameters;
use crate::domain::role::AgentRole;
use crate::obs;
use crate::store::{sanitize_subject, ArtifactStore, Result};

const GENERATED_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// One role's contribution to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub role: AgentRole,
    pub content: String,
}

/// File name of the aggregate report for `subject`.
pub fn report_file_name(subject: &str) -> String {
    format!("final_strategic_report_{}.md", sanitize_subject(subject))
}

pub struct ReportAssembler {
    subject_name: String,
    store: Arc<dyn ArtifactStore>,
}

impl ReportAssembler {
    pub fn new(subject_name: &str, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            subject_name: subject_name.to_string(),
            store,
        }
    }

    /// Sections in result order.
    ///
    /// Completed outcomes use their inline content, falling back to the
    /// store's newest artifact for the role when that is empty. Failed roles
    /// and roles with nothing readable are left out.
    pub fn collect_sections(&self, results: &RoleResults) -> Vec<ReportSection> {
        results
            .iter()
            .filter_map(|(role, outcome)| match outcome {
                RoleOutcome::Completed { artifact, .. } if artifact.has_content() => {
                    Some(ReportSection {
                        role,
                        content: artifact.content.clone(),
                    })
                }
                RoleOutcome::Completed { .. } => self.stored_section(role),
                RoleOutcome::Error { .. } => None,
            })
            .collect()
    }

    fn stored_section(&self, role: AgentRole) -> Option<ReportSection> {
        match self.store.latest_content(role) {
            Ok(Some(content)) => Some(ReportSection { role, content }),
            Ok(None) => {
                debug!(role = %role, "no stored artifact to fall back on");
                None
            }
            Err(e) => {
                debug!(role = %role, error = %e, "stored artifact unreadable");
                None
            }
        }
    }

    /// Render the report text. Identical inputs give identical output.
    pub fn render(
        &self,
        sections: &[ReportSection],
        parameters: &RunParameters,
        generated_at: DateTime<Utc>,
    ) -> String {
        let subject = &self.subject_name;
        let detailed = sections
            .iter()
            .map(|section| {
                format!(
                    "## {}\n\n{}\n\n",
                    section.role.display_name(),
                    section.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "# Strategic Analysis Report: {subject}\n\
             \n\
             **Generated:** {generated}\n\
             **Analysis Parameters:** {parameters}\n\
             \n\
             ## Executive Summary\n\
             \n\
             This strategic analysis was produced by a team of specialised \
             consulting agents, each covering one aspect of the engagement.\n\
             \n\
             ## Detailed Analysis\n\
             \n\
             {detailed}\n\
             \n\
             ## Conclusion\n\
             \n\
             The findings above combine the work of every contributing \
             specialist into a strategic assessment with actionable \
             recommendations for {subject}.\n\
             \n\
             ---\n\
             *Report generated by the advisory consulting team*\n",
            generated = generated_at.format(GENERATED_FORMAT),
            parameters = parameters.to_pretty_json(),
        )
    }

    /// Build the report from `results` and write it, replacing any previous
    /// version. Returns the report path.
    pub fn assemble(&self, results: &RoleResults, parameters: &RunParameters) -> Result<PathBuf> {
        let sections = self.collect_sections(results);
        let content = self.render(&sections, parameters, Utc::now());
        let path = self
            .store
            .write_document(&report_file_name(&self.subject_name), &content)?;
        obs::emit_report_written(&path, sections.len());
        Ok(path)
    }
}
