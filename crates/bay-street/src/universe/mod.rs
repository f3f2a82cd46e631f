//! Session-owned collection of scored deals.

pub mod store;

pub use store::{CsvDealStore, DealStore, ScoredDealRow, StoreError, StoredDeal};

use crate::allocation::{self, AllocationConstraints, AllocationResult, Objective};
use crate::scoring::ScoredDeal;
use serde::{Deserialize, Serialize};

/// Append-only, insertion-ordered collection of scored deals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Universe {
    deals: Vec<ScoredDeal>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, deal: ScoredDeal) {
        self.deals.push(deal);
    }

    pub fn deals(&self) -> &[ScoredDeal] {
        &self.deals
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredDeal> {
        self.deals.iter()
    }

    /// Deals ordered by Bay Score, highest first; ties keep insertion order.
    pub fn ranked(&self) -> Vec<&ScoredDeal> {
        let mut ranked: Vec<&ScoredDeal> = self.deals.iter().collect();
        ranked.sort_by(|left, right| right.bay_score.total_cmp(&left.bay_score));
        ranked
    }

    pub fn allocate(
        &self,
        constraints: &AllocationConstraints,
        objective: Objective,
    ) -> AllocationResult {
        allocation::allocate(&self.deals, constraints, objective)
    }
}

impl From<Vec<ScoredDeal>> for Universe {
    fn from(deals: Vec<ScoredDeal>) -> Self {
        Self { deals }
    }
}

impl Extend<ScoredDeal> for Universe {
    fn extend<I: IntoIterator<Item = ScoredDeal>>(&mut self, iter: I) {
        self.deals.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Universe {
    type Item = &'a ScoredDeal;
    type IntoIter = std::slice::Iter<'a, ScoredDeal>;

    fn into_iter(self) -> Self::IntoIter {
        self.deals.iter()
    }
}
