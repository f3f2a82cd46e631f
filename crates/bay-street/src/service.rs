use std::io::Read;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocation::{AllocationConstraints, AllocationResult, Objective};
use crate::config::PortfolioConfig;
use crate::ingest::{log_range_violations, DealImporter, IngestError};
use crate::scoring::{Deal, ScoreCard, ScoredDeal, ScoringEngine};
use crate::universe::{DealStore, StoreError, StoredDeal, Universe};

/// Service composing the scoring engine, the deal store and the allocator.
pub struct DealService<S> {
    store: Arc<S>,
    engine: Arc<ScoringEngine>,
    portfolio: PortfolioConfig,
}

/// Allocation parameters; omitted fields fall back to the configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    #[serde(default)]
    pub min_bay_score: Option<f64>,
    #[serde(default)]
    pub max_volatility: Option<f64>,
    #[serde(default)]
    pub max_illiquidity: Option<f64>,
    #[serde(default)]
    pub objective: Option<Objective>,
}

impl AllocationRequest {
    pub fn resolve(&self, defaults: &PortfolioConfig) -> (AllocationConstraints, Objective) {
        let constraints = AllocationConstraints {
            min_bay_score: self
                .min_bay_score
                .unwrap_or(defaults.constraints.min_bay_score),
            max_volatility: self
                .max_volatility
                .unwrap_or(defaults.constraints.max_volatility),
            max_illiquidity: self
                .max_illiquidity
                .unwrap_or(defaults.constraints.max_illiquidity),
        };
        (constraints, self.objective.unwrap_or(defaults.objective))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub recorded_at: DateTime<Utc>,
    pub deals: Vec<ScoredDeal>,
}

impl<S> DealService<S>
where
    S: DealStore + 'static,
{
    pub fn new(store: Arc<S>, engine: ScoringEngine, portfolio: PortfolioConfig) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
            portfolio,
        }
    }

    pub fn portfolio_defaults(&self) -> &PortfolioConfig {
        &self.portfolio
    }

    /// Score a deal without adding it to the universe.
    pub fn preview(&self, deal: &Deal) -> ScoreCard {
        log_range_violations(deal);
        self.engine.evaluate(deal)
    }

    /// Score a single deal and append it to the universe.
    pub fn add(&self, deal: Deal) -> Result<StoredDeal, DealServiceError> {
        log_range_violations(&deal);
        let stored = StoredDeal {
            scored: self.engine.score(deal),
            recorded_at: Utc::now(),
        };

        self.store.append(std::slice::from_ref(&stored))?;
        info!(
            deal = %stored.scored.id(),
            bay_score = stored.scored.bay_score,
            "deal added to universe"
        );
        Ok(stored)
    }

    /// Validate, score and append a CSV batch; nothing is stored if any row fails.
    pub fn import<R: Read>(&self, reader: R) -> Result<ImportSummary, DealServiceError> {
        let scored = DealImporter::from_reader(reader, &self.engine)?;
        let recorded_at = Utc::now();
        let stored: Vec<StoredDeal> = scored
            .iter()
            .cloned()
            .map(|scored| StoredDeal {
                scored,
                recorded_at,
            })
            .collect();

        self.store.append(&stored)?;
        info!(imported = stored.len(), "deal batch imported");

        Ok(ImportSummary {
            imported: scored.len(),
            recorded_at,
            deals: scored,
        })
    }

    pub fn universe(&self) -> Result<Universe, DealServiceError> {
        let deals = self.store.load()?;
        Ok(deals.into_iter().map(|stored| stored.scored).collect::<Vec<_>>().into())
    }

    /// Allocate over the current universe snapshot.
    pub fn allocate(
        &self,
        request: &AllocationRequest,
    ) -> Result<AllocationResult, DealServiceError> {
        let (constraints, objective) = request.resolve(&self.portfolio);
        let universe = self.universe()?;
        let result = universe.allocate(&constraints, objective);

        info!(
            status = %result.status,
            eligible = result.eligible_count,
            holdings = result.holdings.len(),
            "portfolio allocation complete"
        );
        Ok(result)
    }
}

/// Error raised by the deal service.
#[derive(Debug, thiserror::Error)]
pub enum DealServiceError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
