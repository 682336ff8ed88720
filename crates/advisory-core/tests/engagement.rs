//! End-to-end engagements against the filesystem store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use advisory_core::fakes::{role_of, test_catalog, StubCompletion};
use advisory_core::{
    AgentRole, AgentUnit, CompletionError, EngagementStatus, FsArtifactStore, PhasePlan,
    PhaseScheduler, RoleOutcome, RunParameters,
};

fn acme_scheduler(output_dir: &Path, completion: Arc<StubCompletion>) -> PhaseScheduler {
    let store = Arc::new(FsArtifactStore::new(output_dir, "Acme").unwrap());
    let agent = AgentUnit::new(
        "Acme",
        "stub-model",
        Arc::new(test_catalog()),
        completion,
        store,
    );
    PhaseScheduler::new(PhasePlan::standard().unwrap(), agent)
}

fn files_with_suffix(dir: &Path, suffix: &str) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(suffix))
        .count()
}

fn heading_positions(report: &str, roles: &[AgentRole]) -> Vec<usize> {
    roles
        .iter()
        .map(|role| {
            report
                .find(&format!("## {}\n", role.display_name()))
                .unwrap_or_else(|| panic!("missing heading for {role}"))
        })
        .collect()
}

#[tokio::test]
async fn acme_engagement_with_every_agent_succeeding() {
    let dir = tempfile::tempdir().unwrap();
    let completion = Arc::new(StubCompletion::echo_role());
    let result = acme_scheduler(dir.path(), completion)
        .execute(RunParameters::standard_engagement("Assess expansion into Europe"))
        .await
        .unwrap();

    assert_eq!(result.status, EngagementStatus::Completed);
    assert_eq!(result.completed_roles(), AgentRole::ALL.to_vec());

    let project = dir.path().join("Acme");
    for role in AgentRole::ALL {
        let role_dir = project.join("agent_outputs").join(role.id());
        assert_eq!(files_with_suffix(&role_dir, "_metadata.json"), 1, "{role}");
        assert_eq!(files_with_suffix(&role_dir, ".md"), 1, "{role}");

        let artifact = result.results.get(role).unwrap().artifact().unwrap();
        let stored = fs::read_to_string(artifact.storage_path.as_ref().unwrap()).unwrap();
        assert_eq!(stored, format!("{role} output"));
    }

    assert_eq!(result.report_path, project.join("final_strategic_report_Acme.md"));
    let report = fs::read_to_string(&result.report_path).unwrap();
    assert!(report.starts_with("# Strategic Analysis Report: Acme"));
    let positions = heading_positions(&report, &AgentRole::ALL);
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(project.join("engagement_metadata.json").exists());
}

#[tokio::test]
async fn acme_engagement_with_failing_risk_assessor() {
    let dir = tempfile::tempdir().unwrap();
    let completion = Arc::new(StubCompletion::failing_for(&[AgentRole::RiskAssessor]));
    let result = acme_scheduler(dir.path(), completion.clone())
        .execute(RunParameters::standard_engagement("Assess expansion into Europe"))
        .await
        .unwrap();

    assert_eq!(result.status, EngagementStatus::Completed);
    assert_eq!(result.completed_roles().len(), 7);
    assert!(matches!(
        result.results.get(AgentRole::RiskAssessor),
        Some(RoleOutcome::Error { .. })
    ));

    let report = fs::read_to_string(&result.report_path).unwrap();
    assert!(!report.contains("## Risk Assessor"));
    let contributing: Vec<AgentRole> = AgentRole::ALL
        .into_iter()
        .filter(|role| *role != AgentRole::RiskAssessor)
        .collect();
    let positions = heading_positions(&report, &contributing);
    assert_eq!(positions.len(), 7);
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    let risk_dir = dir.path().join("Acme/agent_outputs/risk_assessor");
    assert!(!risk_dir.exists() || files_with_suffix(&risk_dir, ".md") == 0);

    let implementation = completion
        .request_for(AgentRole::ImplementationSpecialist)
        .unwrap();
    assert!(implementation.user_prompt.contains("### Financial Analyst"));
    assert!(!implementation.user_prompt.contains("### Risk Assessor"));
}

#[tokio::test]
async fn senior_partner_sees_every_successful_role() {
    let dir = tempfile::tempdir().unwrap();
    let completion = Arc::new(StubCompletion::echo_role());
    acme_scheduler(dir.path(), completion.clone())
        .execute(RunParameters::new())
        .await
        .unwrap();

    let request = completion.request_for(AgentRole::SeniorPartner).unwrap();
    assert_eq!(request.max_tokens, 6000);
    for role in AgentRole::ALL
        .into_iter()
        .filter(|role| *role != AgentRole::SeniorPartner)
    {
        assert!(
            request.user_prompt.contains(&format!("{role} output")),
            "senior partner prompt lacks {role}"
        );
    }
}

#[tokio::test]
async fn rerun_adds_artifacts_and_replaces_report() {
    let dir = tempfile::tempdir().unwrap();
    let completion = Arc::new(StubCompletion::echo_role());
    let scheduler = acme_scheduler(dir.path(), completion);

    let first = scheduler.execute(RunParameters::new()).await.unwrap();
    let second = scheduler.execute(RunParameters::new()).await.unwrap();

    assert_eq!(first.report_path, second.report_path);
    assert_ne!(first.engagement_id, second.engagement_id);
    let market_dir = dir.path().join("Acme/agent_outputs/market_researcher");
    assert_eq!(files_with_suffix(&market_dir, "_metadata.json"), 2);
    assert_eq!(second.metrics.agents_completed, 8);
    assert_eq!(second.metrics.artifacts_saved, 8);
}

#[tokio::test]
async fn empty_answer_reports_the_previous_stored_analysis() {
    let dir = tempfile::tempdir().unwrap();
    acme_scheduler(dir.path(), Arc::new(StubCompletion::echo_role()))
        .execute(RunParameters::new())
        .await
        .unwrap();

    let silent_financials = Arc::new(StubCompletion::new(|request| {
        let role = role_of(request).ok_or_else(|| CompletionError::Provider("?".into()))?;
        if role == AgentRole::FinancialAnalyst {
            return Ok(String::new());
        }
        Ok(format!("{role} second run"))
    }));
    let result = acme_scheduler(dir.path(), silent_financials.clone())
        .execute(RunParameters::new())
        .await
        .unwrap();

    let outcome = result.results.get(AgentRole::FinancialAnalyst).unwrap();
    assert!(outcome.is_completed());
    assert!(outcome.artifact().unwrap().storage_path.is_none());

    let financial_dir = dir.path().join("Acme/agent_outputs/financial_analyst");
    assert_eq!(files_with_suffix(&financial_dir, ".md"), 1);

    let report = fs::read_to_string(&result.report_path).unwrap();
    assert!(report.contains("## Financial Analyst\n\nfinancial_analyst output"));
    assert!(report.contains("## Market Researcher\n\nmarket_researcher second run"));

    let implementation = silent_financials
        .request_for(AgentRole::ImplementationSpecialist)
        .unwrap();
    assert!(implementation.user_prompt.contains("financial_analyst output"));
}
