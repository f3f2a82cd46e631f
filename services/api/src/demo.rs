use crate::infra::InMemoryDealStore;
use bay_street::allocation::{AllocationResult, Objective};
use bay_street::config::{AppConfig, PortfolioConfig};
use bay_street::error::AppError;
use bay_street::ingest::DealImporter;
use bay_street::scoring::{
    AssetType, Deal, DealId, Listing, Opportunities, Region, ScoreCard, ScoredDeal,
};
use bay_street::service::ImportSummary;
use bay_street::universe::{CsvDealStore, DealStore};
use bay_street::{AllocationRequest, DealService, ScoringEngine, Universe};
use chrono::Local;
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Deal identifier
    #[arg(long)]
    pub(crate) id: String,
    /// Hotel, Platform or Mixed
    #[arg(long)]
    pub(crate) asset_type: Option<AssetType>,
    /// Americas, Europe, APAC, ME or ASEAN
    #[arg(long)]
    pub(crate) region: Option<Region>,
    /// Public or Private
    #[arg(long)]
    pub(crate) listing: Option<Listing>,
    /// Projected IRR (%)
    #[arg(long, allow_hyphen_values = true, value_parser = finite_number)]
    pub(crate) irr: f64,
    /// Cash-on-cash yield (%)
    #[arg(long, allow_hyphen_values = true, value_parser = finite_number)]
    pub(crate) coc_yield: f64,
    /// Volatility estimate (%)
    #[arg(long, value_parser = finite_number)]
    pub(crate) volatility: f64,
    /// Illiquidity premium (%)
    #[arg(long = "illiquidity-premium", visible_alias = "lsd", value_parser = finite_number)]
    pub(crate) illiquidity_premium: f64,
    /// ESG impact score (1-5)
    #[arg(long)]
    pub(crate) esg: u8,
    /// Sponsor co-investment (%)
    #[arg(long, value_parser = finite_number)]
    pub(crate) sponsor_coinvest: f64,
    /// Operational leverage opportunity
    #[arg(long)]
    pub(crate) op_lev: bool,
    /// Brand repositioning opportunity
    #[arg(long)]
    pub(crate) brand_rep: bool,
    /// Management transition opportunity
    #[arg(long)]
    pub(crate) mgmt_trans: bool,
    /// Print the score card as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn finite_number(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("'{raw}' is not a number ({err})"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

impl ScoreArgs {
    fn into_deal(self) -> Deal {
        Deal {
            id: DealId(self.id),
            asset_type: self.asset_type,
            region: self.region,
            listing: self.listing,
            projected_irr: self.irr,
            coc_yield: self.coc_yield,
            volatility: self.volatility,
            illiquidity_premium: self.illiquidity_premium,
            esg_score: self.esg,
            sponsor_coinvest: self.sponsor_coinvest,
            opportunities: Opportunities {
                operational_leverage: self.op_lev,
                brand_repositioning: self.brand_rep,
                management_transition: self.mgmt_trans,
            },
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Deal CSV to score
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Append the scored batch to this CSV deal store
    #[arg(long)]
    pub(crate) store: Option<PathBuf>,
    /// Print the scored batch as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// Deal CSV to score and allocate across
    #[arg(long, conflicts_with = "store", required_unless_present = "store")]
    pub(crate) csv: Option<PathBuf>,
    /// Previously written CSV deal store to allocate across
    #[arg(long)]
    pub(crate) store: Option<PathBuf>,
    /// Minimum Bay Score for eligibility (defaults to BAY_MIN_SCORE)
    #[arg(long, value_parser = finite_number)]
    pub(crate) min_score: Option<f64>,
    /// Weighted volatility cap in percent (defaults to BAY_MAX_VOLATILITY)
    #[arg(long, value_parser = finite_number)]
    pub(crate) max_volatility: Option<f64>,
    /// Weighted illiquidity cap in percent (defaults to BAY_MAX_ILLIQUIDITY)
    #[arg(long, value_parser = finite_number)]
    pub(crate) max_illiquidity: Option<f64>,
    /// aha or bay_score (defaults to BAY_OBJECTIVE)
    #[arg(long)]
    pub(crate) objective: Option<Objective>,
    /// Print the allocation result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Deal CSV to use instead of the built-in deck
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Stop after scoring and ranking
    #[arg(long)]
    pub(crate) skip_allocation: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let json = args.json;
    let deal = args.into_deal();
    let service = DealService::new(
        Arc::new(InMemoryDealStore::default()),
        ScoringEngine::default(),
        PortfolioConfig::default(),
    );
    let card = service.preview(&deal);

    if json {
        print_json(&card);
    } else {
        render_scorecard(&card);
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let ImportArgs { csv, store, json } = args;

    match store {
        Some(path) => {
            let service = DealService::new(
                Arc::new(CsvDealStore::new(path.clone())),
                ScoringEngine::default(),
                PortfolioConfig::default(),
            );
            let summary = service.import(File::open(&csv)?)?;
            if json {
                print_json(&summary);
            } else {
                render_import(&summary, Some(&path));
            }
        }
        None => {
            let scored = DealImporter::from_path(&csv, &ScoringEngine::default())?;
            let universe = Universe::from(scored);
            if json {
                print_json(&universe);
            } else {
                println!("Scored {} deals from {}", universe.len(), csv.display());
                render_ranking(&universe.ranked());
            }
        }
    }

    Ok(())
}

pub(crate) fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let request = AllocationRequest {
        min_bay_score: args.min_score,
        max_volatility: args.max_volatility,
        max_illiquidity: args.max_illiquidity,
        objective: args.objective,
    };
    let (constraints, objective) = request.resolve(&config.portfolio);

    let universe = match (args.csv, args.store) {
        (Some(csv), _) => Universe::from(DealImporter::from_path(csv, &ScoringEngine::default())?),
        (None, Some(store)) => CsvDealStore::new(store)
            .load()?
            .into_iter()
            .map(|stored| stored.scored)
            .collect::<Vec<_>>()
            .into(),
        (None, None) => Universe::new(),
    };

    let result = universe.allocate(&constraints, objective);
    if args.json {
        print_json(&result);
    } else {
        render_allocation(&result);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        csv,
        skip_allocation,
    } = args;

    println!("Bay Street deal scoring demo");
    let service = DealService::new(
        Arc::new(InMemoryDealStore::default()),
        ScoringEngine::default(),
        PortfolioConfig::default(),
    );

    match csv {
        Some(path) => {
            let summary = service.import(File::open(&path)?)?;
            render_import(&summary, None);
        }
        None => {
            let deck = demo_deck();
            if let Some(first) = deck.first() {
                println!("\nScore card for the first deal in the deck");
                render_scorecard(&service.preview(first));
            }
            for deal in deck {
                service.add(deal)?;
            }
            let universe = service.universe()?;
            println!("\nUniverse ranked by Bay Score ({} deals)", universe.len());
            render_ranking(&universe.ranked());
        }
    }

    if skip_allocation {
        return Ok(());
    }

    let defaults = *service.portfolio_defaults();
    for objective in [Objective::Aha, Objective::BayScore] {
        let request = AllocationRequest {
            objective: Some(objective),
            ..AllocationRequest::default()
        };
        let result = service.allocate(&request)?;
        render_allocation(&result);
    }

    let strict = AllocationRequest {
        max_volatility: Some(defaults.constraints.max_volatility / 4.0),
        ..AllocationRequest::default()
    };
    println!("\nTightening the volatility cap to a quarter of the default");
    render_allocation(&service.allocate(&strict)?);

    Ok(())
}

fn demo_deck() -> Vec<Deal> {
    let deal = |id: &str,
                asset_type: AssetType,
                region: Region,
                listing: Listing,
                metrics: [f64; 5],
                esg_score: u8,
                flags: [bool; 3]| Deal {
        id: DealId(id.to_string()),
        asset_type: Some(asset_type),
        region: Some(region),
        listing: Some(listing),
        projected_irr: metrics[0],
        coc_yield: metrics[1],
        volatility: metrics[2],
        illiquidity_premium: metrics[3],
        esg_score,
        sponsor_coinvest: metrics[4],
        opportunities: Opportunities {
            operational_leverage: flags[0],
            brand_repositioning: flags[1],
            management_transition: flags[2],
        },
    };

    vec![
        deal(
            "Harbourfront Hotel",
            AssetType::Hotel,
            Region::Americas,
            Listing::Private,
            [12.0, 6.0, 10.0, 2.0, 5.0],
            3,
            [false, false, false],
        ),
        deal(
            "Lisbon Platform",
            AssetType::Platform,
            Region::Europe,
            Listing::Private,
            [16.0, 7.5, 14.0, 3.0, 12.0],
            4,
            [true, true, false],
        ),
        deal(
            "Bali Resort",
            AssetType::Hotel,
            Region::Asean,
            Listing::Private,
            [18.0, 5.0, 22.0, 4.0, 8.0],
            5,
            [true, false, true],
        ),
        deal(
            "Dubai Mixed-Use",
            AssetType::Mixed,
            Region::MiddleEast,
            Listing::Public,
            [11.0, 8.5, 8.0, 1.0, 15.0],
            3,
            [false, true, false],
        ),
        deal(
            "Tokyo Select",
            AssetType::Hotel,
            Region::Apac,
            Listing::Public,
            [9.5, 6.5, 6.0, 0.5, 3.0],
            2,
            [false, false, true],
        ),
    ]
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => println!("JSON output unavailable: {}", err),
    }
}

pub(crate) fn render_scorecard(card: &ScoreCard) {
    let scored = &card.scored;
    println!("Deal {}", scored.id());
    println!(
        "- Bay Score {:.2} | AHA {:+.2} pts over hurdle | BAS {:.3}",
        scored.bay_score, scored.aha, scored.bas
    );
    println!("Components:");
    for component in &card.components {
        println!(
            "  - {}: {:.3} x {:.2} = {:.2} pts",
            component.factor.label(),
            component.normalized,
            component.weight,
            component.points
        );
    }
}

pub(crate) fn render_ranking(deals: &[&ScoredDeal]) {
    if deals.is_empty() {
        println!("  (no deals)");
        return;
    }

    for (rank, scored) in deals.iter().enumerate() {
        let deal = &scored.deal;
        println!(
            "  {}. {} [{} / {} / {}] Bay Score {:.2} | AHA {:+.2} | BAS {:.3} | vol {:.1}% | illiquidity {:.1}%",
            rank + 1,
            deal.id,
            deal.asset_type.map(AssetType::label).unwrap_or("-"),
            deal.region.map(Region::label).unwrap_or("-"),
            deal.listing.map(Listing::label).unwrap_or("-"),
            scored.bay_score,
            scored.aha,
            scored.bas,
            deal.volatility,
            deal.illiquidity_premium
        );
    }
}

fn render_import(summary: &ImportSummary, store: Option<&PathBuf>) {
    let recorded = summary.recorded_at.with_timezone(&Local);
    match store {
        Some(path) => println!(
            "Imported {} deals into {} at {}",
            summary.imported,
            path.display(),
            recorded.format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!(
            "Imported {} deals at {}",
            summary.imported,
            recorded.format("%Y-%m-%d %H:%M:%S")
        ),
    }

    let universe = Universe::from(summary.deals.clone());
    render_ranking(&universe.ranked());
}

pub(crate) fn render_allocation(result: &AllocationResult) {
    let constraints = &result.constraints;
    println!("\nAllocation maximizing {}", result.objective.label());
    println!(
        "- Limits: Bay Score >= {:.1} | volatility <= {:.1}% | illiquidity <= {:.1}%",
        constraints.min_bay_score, constraints.max_volatility, constraints.max_illiquidity
    );
    println!("- Status: {}", result.summary());

    let Some(solution) = &result.solution else {
        return;
    };
    println!(
        "- Portfolio: AHA {:+.2} | Bay Score {:.2} | volatility {:.2}% | illiquidity {:.2}%",
        solution.weighted_aha,
        solution.weighted_bay_score,
        solution.weighted_volatility,
        solution.weighted_illiquidity
    );
    println!("Holdings:");
    for holding in &result.holdings {
        println!(
            "  - {}: {:.2}% (Bay Score {:.2}, AHA {:+.2})",
            holding.deal_id,
            holding.weight * 100.0,
            holding.bay_score,
            holding.aha
        );
    }
}
