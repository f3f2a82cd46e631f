//! Constrained portfolio allocation over a universe of scored deals.

mod simplex;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scoring::{DealId, ScoredDeal};
use simplex::{Constraint, LinearProgram, LpOutcome, Relation};

/// Decimal places kept on reported weights.
pub const WEIGHT_PRECISION: i32 = 4;
/// Rounded weights below this are left out of the reported holdings.
pub const MIN_REPORTED_WEIGHT: f64 = 0.001;

/// Portfolio metric the allocator maximizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Weighted-average alpha over hurdle.
    Aha,
    /// Weighted-average Bay Score.
    BayScore,
}

impl Objective {
    pub const fn label(self) -> &'static str {
        match self {
            Objective::Aha => "AHA",
            Objective::BayScore => "Bay Score",
        }
    }

    fn metric(self, deal: &ScoredDeal) -> f64 {
        match self {
            Objective::Aha => deal.aha,
            Objective::BayScore => deal.bay_score,
        }
    }
}

impl FromStr for Objective {
    type Err = UnknownObjective;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "aha" => Ok(Self::Aha),
            "bay_score" | "bayscore" => Ok(Self::BayScore),
            _ => Err(UnknownObjective(value.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown objective '{0}' (expected 'aha' or 'bay_score')")]
pub struct UnknownObjective(pub String);

/// User-chosen limits applied before and during the solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationConstraints {
    pub min_bay_score: f64,
    pub max_volatility: f64,
    pub max_illiquidity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Optimal,
    Infeasible,
    Unbounded,
    SolverError,
    NoEligibleDeals,
}

impl AllocationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AllocationStatus::Optimal => "optimal",
            AllocationStatus::Infeasible => "infeasible",
            AllocationStatus::Unbounded => "unbounded",
            AllocationStatus::SolverError => "solver_error",
            AllocationStatus::NoEligibleDeals => "no_eligible_deals",
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reported position after rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub deal_id: DealId,
    pub weight: f64,
    pub bay_score: f64,
    pub aha: f64,
    pub volatility: f64,
    pub illiquidity_premium: f64,
}

/// Raw solver output over the eligible deals, before rounding or dropping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSolution {
    /// Eligible deal ids, aligned with `weights`.
    pub deal_ids: Vec<DealId>,
    pub weights: Vec<f64>,
    pub objective_value: f64,
    pub weighted_volatility: f64,
    pub weighted_illiquidity: f64,
    pub weighted_aha: f64,
    pub weighted_bay_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub status: AllocationStatus,
    pub objective: Objective,
    pub constraints: AllocationConstraints,
    pub eligible_count: usize,
    pub holdings: Vec<Holding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<PortfolioSolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AllocationResult {
    fn without_solution(
        status: AllocationStatus,
        objective: Objective,
        constraints: AllocationConstraints,
        eligible_count: usize,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            objective,
            constraints,
            eligible_count,
            holdings: Vec::new(),
            solution: None,
            detail: Some(detail.into()),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == AllocationStatus::Optimal
    }

    pub fn summary(&self) -> String {
        match self.status {
            AllocationStatus::Optimal => format!(
                "optimal {} allocation across {} of {} eligible deals",
                self.objective.label(),
                self.holdings.len(),
                self.eligible_count
            ),
            _ => match &self.detail {
                Some(detail) => format!("{}: {}", self.status, detail),
                None => self.status.to_string(),
            },
        }
    }
}

/// Select weights over deals clearing `min_bay_score` that maximize `objective`
/// while keeping weighted volatility and illiquidity within their limits.
pub fn allocate(
    universe: &[ScoredDeal],
    constraints: &AllocationConstraints,
    objective: Objective,
) -> AllocationResult {
    let eligible: Vec<&ScoredDeal> = universe
        .iter()
        .filter(|deal| deal.bay_score >= constraints.min_bay_score)
        .collect();

    debug!(
        universe = universe.len(),
        eligible = eligible.len(),
        objective = objective.label(),
        "filtered allocation universe"
    );

    if eligible.is_empty() {
        return AllocationResult::without_solution(
            AllocationStatus::NoEligibleDeals,
            objective,
            *constraints,
            0,
            format!(
                "no deals meet the minimum Bay Score of {:.2}",
                constraints.min_bay_score
            ),
        );
    }

    let program = build_program(&eligible, constraints, objective);

    let result = match program.solve() {
        Ok(LpOutcome::Optimal { values, objective: value }) => {
            let solution = summarize_solution(&eligible, values, value);
            let holdings = report_holdings(&eligible, &solution.weights);
            AllocationResult {
                status: AllocationStatus::Optimal,
                objective,
                constraints: *constraints,
                eligible_count: eligible.len(),
                holdings,
                solution: Some(solution),
                detail: None,
            }
        }
        Ok(LpOutcome::Infeasible) => AllocationResult::without_solution(
            AllocationStatus::Infeasible,
            objective,
            *constraints,
            eligible.len(),
            "volatility and illiquidity limits cannot be met by any fully invested mix; relax the constraints",
        ),
        Ok(LpOutcome::Unbounded) => AllocationResult::without_solution(
            AllocationStatus::Unbounded,
            objective,
            *constraints,
            eligible.len(),
            "objective is unbounded over the eligible deals",
        ),
        Err(err) => {
            warn!(error = %err, "allocation solve failed");
            AllocationResult::without_solution(
                AllocationStatus::SolverError,
                objective,
                *constraints,
                eligible.len(),
                err.to_string(),
            )
        }
    };

    debug!(status = %result.status, holdings = result.holdings.len(), "allocation solved");
    result
}

fn build_program(
    eligible: &[&ScoredDeal],
    constraints: &AllocationConstraints,
    objective: Objective,
) -> LinearProgram {
    let column = |extract: fn(&ScoredDeal) -> f64| -> Vec<f64> {
        eligible.iter().map(|deal| extract(deal)).collect()
    };

    LinearProgram {
        objective: eligible.iter().map(|deal| objective.metric(deal)).collect(),
        constraints: vec![
            Constraint {
                coefficients: vec![1.0; eligible.len()],
                relation: Relation::Equal,
                rhs: 1.0,
            },
            Constraint {
                coefficients: column(|deal| deal.deal.volatility),
                relation: Relation::LessOrEqual,
                rhs: constraints.max_volatility,
            },
            Constraint {
                coefficients: column(|deal| deal.deal.illiquidity_premium),
                relation: Relation::LessOrEqual,
                rhs: constraints.max_illiquidity,
            },
        ],
    }
}

fn weighted(eligible: &[&ScoredDeal], weights: &[f64], extract: fn(&ScoredDeal) -> f64) -> f64 {
    eligible
        .iter()
        .zip(weights)
        .map(|(deal, weight)| extract(deal) * weight)
        .sum()
}

fn summarize_solution(
    eligible: &[&ScoredDeal],
    weights: Vec<f64>,
    objective_value: f64,
) -> PortfolioSolution {
    PortfolioSolution {
        deal_ids: eligible.iter().map(|deal| deal.id().clone()).collect(),
        weighted_volatility: weighted(eligible, &weights, |deal| deal.deal.volatility),
        weighted_illiquidity: weighted(eligible, &weights, |deal| deal.deal.illiquidity_premium),
        weighted_aha: weighted(eligible, &weights, |deal| deal.aha),
        weighted_bay_score: weighted(eligible, &weights, |deal| deal.bay_score),
        objective_value,
        weights,
    }
}

fn round_weight(weight: f64) -> f64 {
    let scale = 10f64.powi(WEIGHT_PRECISION);
    (weight * scale).round() / scale
}

/// Rounded holdings; the dropped remainder means these need not sum to exactly one.
fn report_holdings(eligible: &[&ScoredDeal], weights: &[f64]) -> Vec<Holding> {
    eligible
        .iter()
        .zip(weights)
        .filter_map(|(deal, weight)| {
            let rounded = round_weight(*weight);
            (rounded >= MIN_REPORTED_WEIGHT).then(|| Holding {
                deal_id: deal.id().clone(),
                weight: rounded,
                bay_score: deal.bay_score,
                aha: deal.aha,
                volatility: deal.deal.volatility,
                illiquidity_premium: deal.deal.illiquidity_premium,
            })
        })
        .collect()
}
