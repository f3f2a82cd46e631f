use super::domain::Deal;
use super::weights::{ScoreComponent, ScoreFactor, WeightTable};

const IRR_TARGET: f64 = 15.0;
const COC_TARGET: f64 = 8.0;
const AHA_TARGET: f64 = 4.0;
const BAS_TARGET: f64 = 0.6;
const ESG_MAX: f64 = 5.0;
const COINVEST_TARGET: f64 = 10.0;

pub(crate) fn alpha_over_hurdle(deal: &Deal, hurdle_rate: f64) -> f64 {
    deal.projected_irr - (hurdle_rate + deal.illiquidity_premium)
}

/// AHA per unit of volatility.
///
/// A volatility of exactly zero yields 0.0 rather than an infinite or NaN
/// ratio, for positive and negative AHA alike.
pub(crate) fn benchmark_adjusted_sharpe(aha: f64, volatility: f64) -> f64 {
    if volatility == 0.0 {
        0.0
    } else {
        aha / volatility
    }
}

/// `min(x, 1)` that keeps NaN as NaN instead of promoting it to a full mark.
fn capped(value: f64) -> f64 {
    if value.is_nan() {
        value
    } else {
        value.min(1.0)
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn normalized(factor: ScoreFactor, deal: &Deal, aha: f64, bas: f64) -> f64 {
    let levers = &deal.opportunities;
    match factor {
        ScoreFactor::Irr => capped(deal.projected_irr / IRR_TARGET),
        ScoreFactor::CocYield => capped(deal.coc_yield / COC_TARGET),
        ScoreFactor::Aha => capped(aha / AHA_TARGET),
        ScoreFactor::Bas => capped(bas / BAS_TARGET),
        // ESG is bounded by its input range, so it is left uncapped.
        ScoreFactor::Esg => f64::from(deal.esg_score) / ESG_MAX,
        ScoreFactor::SponsorCoinvest => capped(deal.sponsor_coinvest / COINVEST_TARGET),
        ScoreFactor::OperationalLeverage => indicator(levers.operational_leverage),
        ScoreFactor::BrandRepositioning => indicator(levers.brand_repositioning),
        ScoreFactor::ManagementTransition => indicator(levers.management_transition),
    }
}

pub(crate) fn score_components(
    deal: &Deal,
    aha: f64,
    bas: f64,
    weights: &WeightTable,
) -> (Vec<ScoreComponent>, f64) {
    let mut components = Vec::with_capacity(ScoreFactor::ordered().len());
    let mut weighted_sum = 0.0;

    for factor in ScoreFactor::ordered() {
        let normalized = normalized(factor, deal, aha, bas);
        let weight = weights.weight(factor);
        let contribution = normalized * weight;
        weighted_sum += contribution;

        components.push(ScoreComponent {
            factor,
            normalized,
            weight,
            points: contribution * 100.0,
        });
    }

    (components, weighted_sum * 100.0)
}
