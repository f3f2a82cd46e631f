//! Deterministic Bay Score evaluation for a single deal.

pub mod domain;
mod rules;
mod weights;

pub use domain::{
    AssetType, Deal, DealId, Listing, Opportunities, RangeViolation, Region, ScoredDeal,
    UnknownCategory,
};
pub use weights::{ScoreComponent, ScoreFactor, WeightTable, WeightTableError};

use serde::{Deserialize, Serialize};

/// Composite benchmark IRR, in percent, that every deal must clear.
pub const BENCHMARK_HURDLE_RATE: f64 = 8.0;

/// Stateless scorer applying the hurdle rate and weight table to a deal.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    hurdle_rate: f64,
    weights: WeightTable,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            hurdle_rate: BENCHMARK_HURDLE_RATE,
            weights: WeightTable::default(),
        }
    }
}

impl ScoringEngine {
    pub fn with_weights(weights: WeightTable) -> Result<Self, WeightTableError> {
        weights.validate()?;
        Ok(Self {
            hurdle_rate: BENCHMARK_HURDLE_RATE,
            weights,
        })
    }

    pub fn hurdle_rate(&self) -> f64 {
        self.hurdle_rate
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn score(&self, deal: Deal) -> ScoredDeal {
        self.evaluate(&deal).scored
    }

    /// Score a deal and keep the per-component contributions for audit.
    pub fn evaluate(&self, deal: &Deal) -> ScoreCard {
        let aha = rules::alpha_over_hurdle(deal, self.hurdle_rate);
        let bas = rules::benchmark_adjusted_sharpe(aha, deal.volatility);
        let (components, bay_score) = rules::score_components(deal, aha, bas, &self.weights);

        ScoreCard {
            scored: ScoredDeal {
                deal: deal.clone(),
                aha,
                bas,
                bay_score,
            },
            components,
        }
    }
}

/// Scored deal plus the breakdown that produced its Bay Score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    #[serde(flatten)]
    pub scored: ScoredDeal,
    pub components: Vec<ScoreComponent>,
}

/// Score a deal with the standard hurdle rate and weight table.
pub fn score(deal: Deal) -> ScoredDeal {
    ScoringEngine::default().score(deal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn baseline_deal() -> Deal {
        Deal {
            id: DealId("Harbourfront Hotel".to_string()),
            asset_type: Some(AssetType::Hotel),
            region: Some(Region::Americas),
            listing: Some(Listing::Private),
            projected_irr: 12.0,
            coc_yield: 6.0,
            volatility: 10.0,
            illiquidity_premium: 2.0,
            esg_score: 3,
            sponsor_coinvest: 5.0,
            opportunities: Opportunities::default(),
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        let weights = WeightTable::default();
        assert!((weights.total() - 1.0).abs() < TOLERANCE);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn baseline_deal_matches_reference_scores() {
        let scored = score(baseline_deal());

        assert!((scored.aha - 2.0).abs() < TOLERANCE);
        assert!((scored.bas - 0.2).abs() < TOLERANCE);

        let expected = 100.0
            * (0.8 * 0.25 + 0.75 * 0.15 + 0.5 * 0.20 + (0.2 / 0.6) * 0.20 + 0.6 * 0.10 + 0.5 * 0.05);
        assert!((scored.bay_score - expected).abs() < TOLERANCE);
        assert!((scored.bay_score - 56.42).abs() < 0.01);
    }

    #[test]
    fn aha_nets_out_hurdle_and_illiquidity() {
        let mut deal = baseline_deal();
        deal.projected_irr = 9.5;
        deal.illiquidity_premium = 3.25;

        let scored = score(deal);

        assert_eq!(scored.aha, 9.5 - 8.0 - 3.25);
    }

    #[test]
    fn zero_volatility_falls_back_to_zero_bas() {
        let mut deal = baseline_deal();
        deal.volatility = 0.0;
        deal.projected_irr = 10.0;
        deal.illiquidity_premium = 2.0;

        let scored = score(deal.clone());
        assert_eq!(scored.aha, 0.0);
        assert_eq!(scored.bas, 0.0);
        assert!(scored.bay_score.is_finite());

        deal.projected_irr = 4.0;
        let negative = score(deal);
        assert!(negative.aha < 0.0);
        assert_eq!(negative.bas, 0.0);
    }

    #[test]
    fn negative_alpha_can_pull_score_below_zero() {
        let mut deal = baseline_deal();
        deal.projected_irr = -40.0;
        deal.coc_yield = -20.0;
        deal.volatility = 1.0;
        deal.esg_score = 1;
        deal.sponsor_coinvest = 0.0;

        let scored = score(deal);

        assert!(scored.aha < 0.0);
        assert!(scored.bay_score < 0.0, "no floor is applied to the Bay Score");
    }

    #[test]
    fn capped_components_saturate_and_flags_add_full_weight() {
        let deal = Deal {
            projected_irr: 40.0,
            coc_yield: 20.0,
            volatility: 5.0,
            illiquidity_premium: 1.0,
            esg_score: 5,
            sponsor_coinvest: 50.0,
            opportunities: Opportunities {
                operational_leverage: true,
                brand_repositioning: true,
                management_transition: true,
            },
            ..baseline_deal()
        };

        let card = ScoringEngine::default().evaluate(&deal);

        assert!((card.scored.bay_score - 100.0).abs() < TOLERANCE);
        assert!(card
            .components
            .iter()
            .all(|component| component.normalized <= 1.0));
    }

    #[test]
    fn esg_above_range_pushes_score_past_one_hundred() {
        let deal = Deal {
            projected_irr: 40.0,
            coc_yield: 20.0,
            volatility: 5.0,
            illiquidity_premium: 1.0,
            esg_score: 10,
            sponsor_coinvest: 50.0,
            opportunities: Opportunities {
                operational_leverage: true,
                brand_repositioning: true,
                management_transition: true,
            },
            ..baseline_deal()
        };

        let scored = score(deal.clone());

        assert!(scored.bay_score > 100.0);
        assert!(deal
            .range_violations()
            .iter()
            .any(|violation| violation.field == "esg_score"));
    }

    #[test]
    fn components_sum_to_bay_score() {
        let card = ScoringEngine::default().evaluate(&baseline_deal());

        assert_eq!(card.components.len(), 9);
        let points: f64 = card.components.iter().map(|component| component.points).sum();
        assert!((points - card.scored.bay_score).abs() < TOLERANCE);

        let bas = card
            .components
            .iter()
            .find(|component| component.factor == ScoreFactor::Bas)
            .expect("bas component present");
        assert!((bas.normalized - 0.2 / 0.6).abs() < TOLERANCE);
    }

    #[test]
    fn custom_weights_must_sum_to_one() {
        let weights = WeightTable {
            irr: 0.30,
            ..WeightTable::default()
        };

        match ScoringEngine::with_weights(weights) {
            Err(WeightTableError::DoesNotSumToOne { total }) => {
                assert!((total - 1.05).abs() < 1e-9);
            }
            other => panic!("expected weight sum error, got {other:?}"),
        }

        let rebalanced = WeightTable {
            irr: 0.30,
            coc_yield: 0.10,
            ..WeightTable::default()
        };
        let engine = ScoringEngine::with_weights(rebalanced).expect("balanced weights accepted");
        assert_eq!(engine.hurdle_rate(), BENCHMARK_HURDLE_RATE);
    }

    #[test]
    fn valid_deal_reports_no_range_violations() {
        assert!(baseline_deal().range_violations().is_empty());

        let mut deal = baseline_deal();
        deal.illiquidity_premium = 12.0;
        deal.volatility = f64::NAN;
        let fields: Vec<_> = deal
            .range_violations()
            .into_iter()
            .map(|violation| violation.field)
            .collect();
        assert_eq!(fields, vec!["volatility", "illiquidity_premium"]);
    }

    #[test]
    fn non_finite_inputs_do_not_earn_full_marks() {
        let mut deal = baseline_deal();
        deal.projected_irr = f64::NAN;

        let card = ScoringEngine::default().evaluate(&deal);

        assert!(card.scored.aha.is_nan());
        assert!(card.scored.bay_score.is_nan());
        let irr = card
            .components
            .iter()
            .find(|component| component.factor == ScoreFactor::Irr)
            .expect("irr component present");
        assert!(irr.normalized.is_nan());
    }

    #[test]
    fn json_esg_accepts_whole_floats_only() {
        let body = |esg: &str| {
            format!(
                r#"{{"id":"Harbourfront","projected_irr":12,"coc_yield":6,"volatility":10,"illiquidity_premium":2,"esg_score":{esg},"sponsor_coinvest":5}}"#
            )
        };

        let deal: Deal = serde_json::from_str(&body("3.0")).expect("whole float accepted");
        assert_eq!(deal.esg_score, 3);
        let deal: Deal = serde_json::from_str(&body("4")).expect("integer accepted");
        assert_eq!(deal.esg_score, 4);
        assert!(serde_json::from_str::<Deal>(&body("3.5")).is_err());
        assert!(serde_json::from_str::<Deal>(&body("-1")).is_err());
    }
}
