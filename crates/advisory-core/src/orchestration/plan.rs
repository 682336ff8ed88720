//! Dependency graph and phase plan.
//!
//! The phase plan is hand-specified rather than derived from the graph.
//! [`PhasePlan::new`] checks the two against each other so a bad plan is
//! rejected before any agent runs.

use std::collections::{BTreeMap, HashMap};

use crate::domain::role::AgentRole;
use crate::orchestration::error::{PlanError, PlanResult};

/// Static `role → roles whose output it consumes` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<AgentRole, Vec<AgentRole>>,
}

impl DependencyGraph {
    /// Build a graph from explicit entries. Roles without an entry have no
    /// dependencies.
    pub fn from_entries(entries: impl IntoIterator<Item = (AgentRole, Vec<AgentRole>)>) -> Self {
        Self {
            dependencies: entries.into_iter().collect(),
        }
    }

    /// The consulting team's dependency table.
    ///
    /// Phase-1 analysts stand alone; financial and risk analysts read the
    /// phase-1 work; the implementation specialist reads everything before
    /// it; the storyteller reads all six analytic roles; the senior partner
    /// reads everyone.
    pub fn standard() -> Self {
        use AgentRole::*;

        let core = vec![BusinessModelAnalyst, MarketResearcher, CompetitiveAnalyst];
        let mut analytic = core.clone();
        analytic.extend([FinancialAnalyst, RiskAssessor]);
        let mut all_analytic = analytic.clone();
        all_analytic.push(ImplementationSpecialist);
        let everyone_else: Vec<AgentRole> = AgentRole::ALL
            .into_iter()
            .filter(|role| *role != SeniorPartner)
            .collect();

        Self::from_entries([
            (BusinessModelAnalyst, vec![]),
            (MarketResearcher, vec![]),
            (CompetitiveAnalyst, vec![]),
            (FinancialAnalyst, core.clone()),
            (RiskAssessor, core),
            (ImplementationSpecialist, analytic),
            (StrategyStoryteller, all_analytic),
            (SeniorPartner, everyone_else),
        ])
    }

    /// Roles whose output `role` consumes, in declared order.
    pub fn dependencies_of(&self, role: AgentRole) -> &[AgentRole] {
        self.dependencies
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// The five-phase shape used by the consulting team.
pub fn standard_phases() -> Vec<Vec<AgentRole>> {
    use AgentRole::*;
    vec![
        vec![BusinessModelAnalyst, MarketResearcher, CompetitiveAnalyst],
        vec![FinancialAnalyst, RiskAssessor],
        vec![ImplementationSpecialist],
        vec![StrategyStoryteller],
        vec![SeniorPartner],
    ]
}

/// An ordered, validated sequence of role sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    phases: Vec<Vec<AgentRole>>,
    graph: DependencyGraph,
}

impl PhasePlan {
    /// Validate `phases` against `graph` and build the plan.
    pub fn new(phases: Vec<Vec<AgentRole>>, graph: DependencyGraph) -> PlanResult<Self> {
        validate_phase_plan(&phases, &graph)?;
        Ok(Self { phases, graph })
    }

    /// The standard five-phase plan over the standard graph.
    pub fn standard() -> PlanResult<Self> {
        Self::new(standard_phases(), DependencyGraph::standard())
    }

    pub fn phases(&self) -> &[Vec<AgentRole>] {
        &self.phases
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// 0-based index of the phase that runs `role`.
    pub fn phase_of(&self, role: AgentRole) -> Option<usize> {
        self.phases.iter().position(|phase| phase.contains(&role))
    }

    /// Every role in execution order: phase by phase, declared order inside
    /// a phase.
    pub fn ordered_roles(&self) -> Vec<AgentRole> {
        self.phases.iter().flatten().copied().collect()
    }
}

/// Check a hand-specified phase list against the dependency graph.
///
/// Rejects empty phases, roles scheduled twice, roles never scheduled, and
/// any role whose dependency does not run in a strictly earlier phase.
/// The last rule also rules out cycles.
pub fn validate_phase_plan(phases: &[Vec<AgentRole>], graph: &DependencyGraph) -> PlanResult<()> {
    let mut phase_index: HashMap<AgentRole, usize> = HashMap::new();

    for (idx, phase) in phases.iter().enumerate() {
        if phase.is_empty() {
            return Err(PlanError::EmptyPhase { phase: idx + 1 });
        }
        for role in phase {
            if phase_index.insert(*role, idx).is_some() {
                return Err(PlanError::DuplicateRole(*role));
            }
        }
    }

    if let Some(missing) = AgentRole::ALL
        .into_iter()
        .find(|role| !phase_index.contains_key(role))
    {
        return Err(PlanError::MissingRole(missing));
    }

    for (idx, phase) in phases.iter().enumerate() {
        for role in phase {
            for dependency in graph.dependencies_of(*role) {
                let dependency_idx = phase_index[dependency];
                if dependency_idx >= idx {
                    return Err(PlanError::DependencyOrder {
                        role: *role,
                        dependency: *dependency,
                        role_phase: idx + 1,
                        dependency_phase: dependency_idx + 1,
                    });
                }
            }
        }
    }

    Ok(())
}
