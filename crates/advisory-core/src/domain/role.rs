//! The closed set of analyst roles in a consulting engagement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The eight analyst roles of the consulting team.
///
/// Variants are declared in phase order, so `AgentRole::ALL` doubles as the
/// canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    BusinessModelAnalyst,
    MarketResearcher,
    CompetitiveAnalyst,
    FinancialAnalyst,
    RiskAssessor,
    ImplementationSpecialist,
    StrategyStoryteller,
    SeniorPartner,
}

impl AgentRole {
    /// Every role, in declaration order.
    pub const ALL: [AgentRole; 8] = [
        AgentRole::BusinessModelAnalyst,
        AgentRole::MarketResearcher,
        AgentRole::CompetitiveAnalyst,
        AgentRole::FinancialAnalyst,
        AgentRole::RiskAssessor,
        AgentRole::ImplementationSpecialist,
        AgentRole::StrategyStoryteller,
        AgentRole::SeniorPartner,
    ];

    /// Stable snake_case identifier, used for directories, file names and
    /// prompt catalog keys.
    pub fn id(&self) -> &'static str {
        match self {
            AgentRole::BusinessModelAnalyst => "business_model_analyst",
            AgentRole::MarketResearcher => "market_researcher",
            AgentRole::CompetitiveAnalyst => "competitive_analyst",
            AgentRole::FinancialAnalyst => "financial_analyst",
            AgentRole::RiskAssessor => "risk_assessor",
            AgentRole::ImplementationSpecialist => "implementation_specialist",
            AgentRole::StrategyStoryteller => "strategy_storyteller",
            AgentRole::SeniorPartner => "senior_partner",
        }
    }

    /// Humanized name used for report headings, e.g. `"Risk Assessor"`.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::BusinessModelAnalyst => "Business Model Analyst",
            AgentRole::MarketResearcher => "Market Researcher",
            AgentRole::CompetitiveAnalyst => "Competitive Analyst",
            AgentRole::FinancialAnalyst => "Financial Analyst",
            AgentRole::RiskAssessor => "Risk Assessor",
            AgentRole::ImplementationSpecialist => "Implementation Specialist",
            AgentRole::StrategyStoryteller => "Strategy Storyteller",
            AgentRole::SeniorPartner => "Senior Partner",
        }
    }

    /// Identifier of the deliverable this role produces.
    pub fn deliverable(&self) -> &'static str {
        match self {
            AgentRole::BusinessModelAnalyst => "business_model_analysis",
            AgentRole::MarketResearcher => "market_research",
            AgentRole::CompetitiveAnalyst => "competitive_analysis",
            AgentRole::FinancialAnalyst => "financial_analysis",
            AgentRole::RiskAssessor => "risk_assessment",
            AgentRole::ImplementationSpecialist => "implementation_plan",
            AgentRole::StrategyStoryteller => "strategy_narrative",
            AgentRole::SeniorPartner => "senior_partner_review",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown role identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for AgentRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::ALL
            .into_iter()
            .find(|role| role.id() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
