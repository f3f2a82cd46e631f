//! Bulk CSV ingestion of deal rows.
//!
//! A batch is validated as a whole: a missing required column or a malformed
//! cell anywhere rejects every row before any scoring happens.

mod indicator;
mod normalizer;
mod parser;

pub use indicator::Indicator;

use crate::scoring::{Deal, ScoredDeal, ScoringEngine};
use std::io::Read;
use std::path::Path;
use tracing::warn;

use parser::ParseFailure;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read deal upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("invalid deal row: {0}")]
    Csv(#[from] csv::Error),
}

impl IngestError {
    pub fn missing_columns(&self) -> Option<&[String]> {
        match self {
            IngestError::MissingColumns(columns) => Some(columns),
            _ => None,
        }
    }
}

impl From<ParseFailure> for IngestError {
    fn from(failure: ParseFailure) -> Self {
        match failure {
            ParseFailure::MissingColumns(columns) => IngestError::MissingColumns(
                columns
                    .into_iter()
                    .map(|column| column.display_name().to_string())
                    .collect(),
            ),
            ParseFailure::Csv(err) => IngestError::Csv(err),
        }
    }
}

pub struct DealImporter;

impl DealImporter {
    /// Parse and validate every row without scoring.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<Deal>, IngestError> {
        let deals = parser::parse_deals(reader)?;
        for deal in &deals {
            log_range_violations(deal);
        }
        Ok(deals)
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        engine: &ScoringEngine,
    ) -> Result<Vec<ScoredDeal>, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, engine)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        engine: &ScoringEngine,
    ) -> Result<Vec<ScoredDeal>, IngestError> {
        let deals = Self::parse(reader)?;
        Ok(deals.into_iter().map(|deal| engine.score(deal)).collect())
    }
}

pub(crate) fn log_range_violations(deal: &Deal) {
    for violation in deal.range_violations() {
        warn!(deal = %deal.id, %violation, "deal attribute outside expected range");
    }
}
