use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Weight assigned to each Bay Score component.
///
/// The nine weights must add up to 1.0 for the score to read as "out of 100".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub irr: f64,
    pub coc_yield: f64,
    pub aha: f64,
    pub bas: f64,
    pub esg: f64,
    pub sponsor_coinvest: f64,
    pub operational_leverage: f64,
    pub brand_repositioning: f64,
    pub management_transition: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            irr: 0.25,
            coc_yield: 0.15,
            aha: 0.20,
            bas: 0.20,
            esg: 0.10,
            sponsor_coinvest: 0.05,
            operational_leverage: 0.02,
            brand_repositioning: 0.02,
            management_transition: 0.01,
        }
    }
}

impl WeightTable {
    pub fn weight(&self, factor: ScoreFactor) -> f64 {
        match factor {
            ScoreFactor::Irr => self.irr,
            ScoreFactor::CocYield => self.coc_yield,
            ScoreFactor::Aha => self.aha,
            ScoreFactor::Bas => self.bas,
            ScoreFactor::Esg => self.esg,
            ScoreFactor::SponsorCoinvest => self.sponsor_coinvest,
            ScoreFactor::OperationalLeverage => self.operational_leverage,
            ScoreFactor::BrandRepositioning => self.brand_repositioning,
            ScoreFactor::ManagementTransition => self.management_transition,
        }
    }

    pub fn total(&self) -> f64 {
        ScoreFactor::ordered()
            .into_iter()
            .map(|factor| self.weight(factor))
            .sum()
    }

    pub fn validate(&self) -> Result<(), WeightTableError> {
        if let Some(factor) = ScoreFactor::ordered()
            .into_iter()
            .find(|factor| !self.weight(*factor).is_finite())
        {
            return Err(WeightTableError::NonFinite(factor));
        }

        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightTableError::DoesNotSumToOne { total });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightTableError {
    #[error("weights must sum to 1.0 (found {total:.6})")]
    DoesNotSumToOne { total: f64 },
    #[error("weight for {0:?} is not a finite number")]
    NonFinite(ScoreFactor),
}

/// Components contributing to the Bay Score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Irr,
    CocYield,
    Aha,
    Bas,
    Esg,
    SponsorCoinvest,
    OperationalLeverage,
    BrandRepositioning,
    ManagementTransition,
}

impl ScoreFactor {
    pub const fn ordered() -> [ScoreFactor; 9] {
        [
            ScoreFactor::Irr,
            ScoreFactor::CocYield,
            ScoreFactor::Aha,
            ScoreFactor::Bas,
            ScoreFactor::Esg,
            ScoreFactor::SponsorCoinvest,
            ScoreFactor::OperationalLeverage,
            ScoreFactor::BrandRepositioning,
            ScoreFactor::ManagementTransition,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ScoreFactor::Irr => "IRR",
            ScoreFactor::CocYield => "CoC Yield",
            ScoreFactor::Aha => "AHA",
            ScoreFactor::Bas => "BAS",
            ScoreFactor::Esg => "ESG",
            ScoreFactor::SponsorCoinvest => "Sponsor Co-Invest",
            ScoreFactor::OperationalLeverage => "OpLev",
            ScoreFactor::BrandRepositioning => "BrandRep",
            ScoreFactor::ManagementTransition => "MgmtTrans",
        }
    }
}

/// One line of the Bay Score audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    /// Sub-score before weighting; capped at 1.0 for capped factors, never floored.
    pub normalized: f64,
    pub weight: f64,
    /// Points contributed to the 0-100 Bay Score.
    pub points: f64,
}
