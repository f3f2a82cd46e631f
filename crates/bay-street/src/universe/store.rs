use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{AssetType, Deal, DealId, Listing, Opportunities, Region, ScoredDeal};

/// A scored deal as persisted, stamped with the time it entered the universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDeal {
    #[serde(flatten)]
    pub scored: ScoredDeal,
    pub recorded_at: DateTime<Utc>,
}

/// Row-oriented persistence for the universe (spreadsheet, file or database).
pub trait DealStore: Send + Sync {
    fn append(&self, deals: &[StoredDeal]) -> Result<(), StoreError>;
    fn load(&self) -> Result<Vec<StoredDeal>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("deal store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("deal store row invalid: {0}")]
    Csv(#[from] csv::Error),
    #[error("deal store unavailable: {0}")]
    Unavailable(String),
}

/// Flat, fixed-schema row keyed by the column names of the deal table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDealRow {
    #[serde(rename = "Deal")]
    pub deal: String,
    #[serde(rename = "Asset Type")]
    pub asset_type: Option<AssetType>,
    #[serde(rename = "Region")]
    pub region: Option<Region>,
    #[serde(rename = "Public/Private")]
    pub listing: Option<Listing>,
    #[serde(rename = "IRR")]
    pub irr: f64,
    #[serde(rename = "CoC Yield")]
    pub coc_yield: f64,
    #[serde(rename = "Volatility")]
    pub volatility: f64,
    #[serde(rename = "Illiquidity Premium")]
    pub illiquidity_premium: f64,
    #[serde(rename = "ESG")]
    pub esg: u8,
    #[serde(rename = "Sponsor Co-Invest")]
    pub sponsor_coinvest: f64,
    #[serde(rename = "OpLev")]
    pub op_lev: bool,
    #[serde(rename = "BrandRep")]
    pub brand_rep: bool,
    #[serde(rename = "MgmtTrans")]
    pub mgmt_trans: bool,
    #[serde(rename = "AHA")]
    pub aha: f64,
    #[serde(rename = "BAS")]
    pub bas: f64,
    #[serde(rename = "Bay Score")]
    pub bay_score: f64,
    #[serde(rename = "Recorded At")]
    pub recorded_at: DateTime<Utc>,
}

impl From<&StoredDeal> for ScoredDealRow {
    fn from(stored: &StoredDeal) -> Self {
        let ScoredDeal {
            deal,
            aha,
            bas,
            bay_score,
        } = &stored.scored;

        Self {
            deal: deal.id.0.clone(),
            asset_type: deal.asset_type,
            region: deal.region,
            listing: deal.listing,
            irr: deal.projected_irr,
            coc_yield: deal.coc_yield,
            volatility: deal.volatility,
            illiquidity_premium: deal.illiquidity_premium,
            esg: deal.esg_score,
            sponsor_coinvest: deal.sponsor_coinvest,
            op_lev: deal.opportunities.operational_leverage,
            brand_rep: deal.opportunities.brand_repositioning,
            mgmt_trans: deal.opportunities.management_transition,
            aha: *aha,
            bas: *bas,
            bay_score: *bay_score,
            recorded_at: stored.recorded_at,
        }
    }
}

impl From<ScoredDealRow> for StoredDeal {
    fn from(row: ScoredDealRow) -> Self {
        StoredDeal {
            scored: ScoredDeal {
                deal: Deal {
                    id: DealId(row.deal),
                    asset_type: row.asset_type,
                    region: row.region,
                    listing: row.listing,
                    projected_irr: row.irr,
                    coc_yield: row.coc_yield,
                    volatility: row.volatility,
                    illiquidity_premium: row.illiquidity_premium,
                    esg_score: row.esg,
                    sponsor_coinvest: row.sponsor_coinvest,
                    opportunities: Opportunities {
                        operational_leverage: row.op_lev,
                        brand_repositioning: row.brand_rep,
                        management_transition: row.mgmt_trans,
                    },
                },
                aha: row.aha,
                bas: row.bas,
                bay_score: row.bay_score,
            },
            recorded_at: row.recorded_at,
        }
    }
}

/// Append-only CSV file holding one [`ScoredDealRow`] per line.
#[derive(Debug)]
pub struct CsvDealStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvDealStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DealStore for CsvDealStore {
    fn append(&self, deals: &[StoredDeal]) -> Result<(), StoreError> {
        if deals.is_empty() {
            return Ok(());
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for deal in deals {
            writer.serialize(ScoredDealRow::from(deal))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<StoredDeal>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let mut deals = Vec::new();
        for row in reader.deserialize::<ScoredDealRow>() {
            deals.push(StoredDeal::from(row?));
        }
        Ok(deals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::score;
    use chrono::TimeZone;

    fn temp_store(name: &str) -> CsvDealStore {
        let path = std::env::temp_dir().join(format!(
            "bay-street-{name}-{}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        CsvDealStore::new(path)
    }

    fn stored(id: &str, region: Option<Region>) -> StoredDeal {
        StoredDeal {
            scored: score(Deal {
                id: DealId(id.to_string()),
                asset_type: Some(AssetType::Platform),
                region,
                listing: None,
                projected_irr: 13.5,
                coc_yield: 7.0,
                volatility: 9.0,
                illiquidity_premium: 1.5,
                esg_score: 4,
                sponsor_coinvest: 12.0,
                opportunities: Opportunities {
                    operational_leverage: true,
                    brand_repositioning: false,
                    management_transition: true,
                },
            }),
            recorded_at: Utc
                .with_ymd_and_hms(2025, 9, 24, 10, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn load_returns_empty_when_file_absent() {
        let store = temp_store("absent");
        assert!(store.load().expect("load succeeds").is_empty());
    }

    #[test]
    fn appends_accumulate_with_a_single_header() {
        let store = temp_store("append");
        store
            .append(&[stored("Harbourfront", Some(Region::Apac))])
            .expect("first append");
        store
            .append(&[stored("Summit", None)])
            .expect("second append");

        let loaded = store.load().expect("load succeeds");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], stored("Harbourfront", Some(Region::Apac)));
        assert_eq!(loaded[1].scored.deal.region, None);

        let contents = std::fs::read_to_string(store.path()).expect("file readable");
        assert_eq!(contents.matches("Bay Score").count(), 1);
        assert!(contents.contains("APAC"));

        let _ = std::fs::remove_file(store.path());
    }
}
