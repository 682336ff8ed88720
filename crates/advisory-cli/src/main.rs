//! Advisory - multi-agent strategy consulting CLI
//!
//! The `advisory` command runs the consulting team against one company and
//! writes every agent's analysis plus a final strategic report under
//! `<output-dir>/<company>/`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use advisory_core::{
    AgentUnit, CompletionService, EngagementResult, FsArtifactStore, OpenAiCompletion,
    OpenAiConfig, PhasePlan, PhaseScheduler, PromptCatalog, RunParameters,
};

#[derive(Parser, Debug)]
#[command(name = "advisory")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-agent strategy consulting team", long_about = None)]
struct Cli {
    /// Name of the company to analyze
    #[arg(short, long, required_unless_present = "list_agents")]
    company: Option<String>,

    /// Analysis brief describing what to analyze
    #[arg(short, long, required_unless_present = "list_agents")]
    brief: Option<String>,

    /// Output directory for project files
    #[arg(short, long, default_value = "./consulting_projects")]
    output_dir: PathBuf,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Prompt catalog (YAML)
    #[arg(
        short,
        long,
        env = "ADVISORY_PROMPTS",
        default_value = "config/agent_prompts.yaml"
    )]
    prompts: PathBuf,

    /// Per-call completion timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the configured agents and exit
    #[arg(long)]
    list_agents: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    advisory_core::init_tracing(cli.json, level);

    let catalog = PromptCatalog::load(&cli.prompts)
        .with_context(|| format!("Failed to load prompt catalog {}", cli.prompts.display()))?;

    if cli.list_agents {
        return cmd_list_agents(&catalog, cli.json);
    }

    let company = cli.company.as_deref().context("--company is required")?;
    let brief = cli.brief.as_deref().context("--brief is required")?;

    let mut config = OpenAiConfig::from_env();
    if let Some(key) = cli.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
        config = config.with_api_key(key);
    }
    let completion = OpenAiCompletion::from_config(&config).context(
        "OpenAI API key is required. Set OPENAI_API_KEY or pass --api-key",
    )?;

    let timeout = cli.timeout_secs.map(Duration::from_secs);
    let result = cmd_run(
        catalog,
        Arc::new(completion),
        &cli.output_dir,
        company,
        brief,
        timeout,
    )
    .await?;

    print_summary(&result);
    Ok(())
}

fn cmd_list_agents(catalog: &PromptCatalog, json: bool) -> Result<()> {
    let summaries = catalog.agent_summaries();
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("Model: {}", catalog.model());
    println!(
        "{:<28} {:>14} {:>14} {:>8}",
        "AGENT", "SYSTEM CHARS", "USER CHARS", "TOKENS"
    );
    for summary in summaries {
        println!(
            "{:<28} {:>14} {:>14} {:>8}",
            summary.role.id(),
            summary.system_prompt_length,
            summary.user_prompt_length,
            summary.token_limit
        );
    }
    Ok(())
}

async fn cmd_run(
    catalog: PromptCatalog,
    completion: Arc<dyn CompletionService>,
    output_dir: &Path,
    company: &str,
    brief: &str,
    timeout: Option<Duration>,
) -> Result<EngagementResult> {
    let plan = PhasePlan::standard().context("Invalid phase plan")?;
    let store = FsArtifactStore::new(output_dir, company)
        .with_context(|| format!("Failed to create project directory under {:?}", output_dir))?;
    info!(project_dir = %store.project_dir().display(), "project directory ready");

    let model = catalog.model().to_string();
    let mut agent = AgentUnit::new(
        company,
        &model,
        Arc::new(catalog),
        completion,
        Arc::new(store),
    );
    if let Some(limit) = timeout {
        agent = agent.with_timeout(limit);
    }

    println!("Starting analysis for: {company}");
    println!("Analysis brief: {brief}");

    PhaseScheduler::new(plan, agent)
        .execute(RunParameters::standard_engagement(brief))
        .await
        .context("Consulting engagement failed")
}

fn print_summary(result: &EngagementResult) {
    println!();
    println!(
        "Engagement {} {} ({} of {} agents succeeded)",
        result.engagement_id,
        if result.is_degraded() {
            "completed with failures"
        } else {
            "completed"
        },
        result.completed_roles().len(),
        result.results.len()
    );
    println!("Final report: {}", result.report_path.display());
    if let Some(project_dir) = result.report_path.parent() {
        println!("All outputs saved to: {}", project_dir.display());
    }

    for role in result.failed_roles() {
        let error = result
            .results
            .get(role)
            .and_then(|outcome| outcome.error())
            .unwrap_or("unknown error");
        println!("  failed: {role}: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisory_core::fakes::{test_catalog, StubCompletion};
    use advisory_core::AgentRole;

    #[test]
    fn test_company_and_brief_are_required() {
        assert!(Cli::try_parse_from(["advisory", "--company", "Acme"]).is_err());
        assert!(Cli::try_parse_from(["advisory", "--brief", "grow"]).is_err());
    }

    #[test]
    fn test_list_agents_needs_no_company() {
        let cli = Cli::try_parse_from(["advisory", "--list-agents"]).unwrap();
        assert!(cli.list_agents);
        assert!(cli.company.is_none());
    }

    #[test]
    fn test_short_flags_and_defaults() {
        let cli = Cli::try_parse_from([
            "advisory",
            "-c",
            "Acme Corp",
            "-b",
            "Assess expansion",
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.company.as_deref(), Some("Acme Corp"));
        assert_eq!(cli.brief.as_deref(), Some("Assess expansion"));
        assert_eq!(cli.output_dir, PathBuf::from("./consulting_projects"));
        assert_eq!(cli.timeout_secs, Some(30));
    }

    #[test]
    fn test_default_prompts_path_is_the_shipped_catalog() {
        if std::env::var_os("ADVISORY_PROMPTS").is_some() {
            return;
        }
        let cli = Cli::try_parse_from(["advisory", "--list-agents"]).unwrap();
        assert_eq!(cli.prompts, PathBuf::from("config/agent_prompts.yaml"));

        // Relative to the workspace root, where the binary is run from.
        let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let catalog = PromptCatalog::load(repo_root.join(&cli.prompts)).unwrap();
        assert_eq!(catalog.agent_summaries().len(), 8);
    }

    #[tokio::test]
    async fn test_cmd_run_writes_project_under_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let completion = Arc::new(StubCompletion::failing_for(&[AgentRole::RiskAssessor]));

        let result = cmd_run(
            test_catalog(),
            completion,
            dir.path(),
            "Acme Corp",
            "Assess expansion",
            None,
        )
        .await
        .unwrap();

        assert_eq!(
            result.report_path,
            dir.path()
                .join("Acme_Corp")
                .join("final_strategic_report_Acme_Corp.md")
        );
        assert_eq!(result.failed_roles(), vec![AgentRole::RiskAssessor]);
        assert_eq!(
            result.parameters.get("analysis_brief"),
            Some(&serde_json::json!("Assess expansion"))
        );
    }
}
