use super::indicator::Indicator;
use super::normalizer::normalize_header;
use crate::scoring::domain::whole_score;
use crate::scoring::{AssetType, Deal, DealId, Listing, Opportunities, Region};
use serde::{de, Deserialize, Deserializer};
use std::io::Read;
use std::str::FromStr;

/// Columns recognised in a bulk upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column {
    Deal,
    Irr,
    CocYield,
    Volatility,
    IlliquidityPremium,
    Esg,
    SponsorCoinvest,
    OperationalLeverage,
    BrandRepositioning,
    ManagementTransition,
    AssetType,
    Region,
    Listing,
}

impl Column {
    const ALL: [Column; 13] = [
        Column::Deal,
        Column::Irr,
        Column::CocYield,
        Column::Volatility,
        Column::IlliquidityPremium,
        Column::Esg,
        Column::SponsorCoinvest,
        Column::OperationalLeverage,
        Column::BrandRepositioning,
        Column::ManagementTransition,
        Column::AssetType,
        Column::Region,
        Column::Listing,
    ];

    /// Header shown to users when the column is missing.
    pub(crate) const fn display_name(self) -> &'static str {
        match self {
            Column::Deal => "Deal",
            Column::Irr => "IRR",
            Column::CocYield => "CoC Yield",
            Column::Volatility => "Volatility",
            Column::IlliquidityPremium => "Illiquidity Premium",
            Column::Esg => "ESG",
            Column::SponsorCoinvest => "Sponsor Co-Invest",
            Column::OperationalLeverage => "OpLev",
            Column::BrandRepositioning => "BrandRep",
            Column::ManagementTransition => "MgmtTrans",
            Column::AssetType => "Asset Type",
            Column::Region => "Region",
            Column::Listing => "Public/Private",
        }
    }

    /// Field name the row deserializer expects.
    const fn key(self) -> &'static str {
        match self {
            Column::Deal => "deal",
            Column::Irr => "irr",
            Column::CocYield => "coc_yield",
            Column::Volatility => "volatility",
            Column::IlliquidityPremium => "illiquidity_premium",
            Column::Esg => "esg",
            Column::SponsorCoinvest => "sponsor_coinvest",
            Column::OperationalLeverage => "op_lev",
            Column::BrandRepositioning => "brand_rep",
            Column::ManagementTransition => "mgmt_trans",
            Column::AssetType => "asset_type",
            Column::Region => "region",
            Column::Listing => "listing",
        }
    }

    /// Normalized header spellings accepted for the column.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Deal => &["deal", "deal name", "deal id", "deal identifier"],
            Column::Irr => &["irr", "projected irr", "projected irr (%)"],
            Column::CocYield => &["coc yield", "coc", "cash-on-cash yield", "cash-on-cash yield (%)"],
            Column::Volatility => &["volatility", "volatility estimate", "volatility (%)"],
            Column::IlliquidityPremium => &[
                "illiquidity premium",
                "illiquidity premium (%)",
                "lsd",
            ],
            Column::Esg => &["esg", "esg score", "esg impact score"],
            Column::SponsorCoinvest => &[
                "sponsor co-invest",
                "sponsor co-investment",
                "sponsor co-investment (%)",
                "coinvest",
            ],
            Column::OperationalLeverage => &["oplev", "operational leverage"],
            Column::BrandRepositioning => &["brandrep", "brand repositioning"],
            Column::ManagementTransition => &["mgmttrans", "management transition"],
            Column::AssetType => &["asset type", "asset_type"],
            Column::Region => &["region"],
            Column::Listing => &["public/private", "public or private", "listing"],
        }
    }

    const fn required(self) -> bool {
        !matches!(self, Column::AssetType | Column::Region | Column::Listing)
    }

    fn resolve(header: &str) -> Option<Column> {
        let normalized = normalize_header(header);
        Column::ALL
            .into_iter()
            .find(|column| column.aliases().contains(&normalized.as_str()))
    }
}

/// Rewrite raw headers to deserializer keys, or list the required columns absent.
pub(crate) fn canonical_headers(
    headers: &csv::StringRecord,
) -> Result<csv::StringRecord, Vec<Column>> {
    let resolved: Vec<Option<Column>> = headers.iter().map(Column::resolve).collect();

    let missing: Vec<Column> = Column::ALL
        .into_iter()
        .filter(|column| column.required() && !resolved.contains(&Some(*column)))
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    Ok(resolved
        .iter()
        .zip(headers.iter())
        .map(|(column, raw)| match column {
            Some(column) => column.key().to_string(),
            None => normalize_header(raw),
        })
        .collect())
}

pub(crate) enum ParseFailure {
    MissingColumns(Vec<Column>),
    Csv(csv::Error),
}

impl From<csv::Error> for ParseFailure {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub(crate) fn parse_deals<R: Read>(reader: R) -> Result<Vec<Deal>, ParseFailure> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let headers = canonical_headers(&headers).map_err(ParseFailure::MissingColumns)?;

    let mut deals = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row: DealRow = record.deserialize(Some(&headers))?;
        deals.push(row.into_deal());
    }

    Ok(deals)
}

#[derive(Debug, Deserialize)]
struct DealRow {
    deal: String,
    #[serde(deserialize_with = "finite")]
    irr: f64,
    #[serde(deserialize_with = "finite")]
    coc_yield: f64,
    #[serde(deserialize_with = "finite")]
    volatility: f64,
    #[serde(deserialize_with = "finite")]
    illiquidity_premium: f64,
    #[serde(deserialize_with = "whole_score")]
    esg: u8,
    #[serde(deserialize_with = "finite")]
    sponsor_coinvest: f64,
    #[serde(deserialize_with = "indicator")]
    op_lev: bool,
    #[serde(deserialize_with = "indicator")]
    brand_rep: bool,
    #[serde(deserialize_with = "indicator")]
    mgmt_trans: bool,
    #[serde(default, deserialize_with = "optional_category")]
    asset_type: Option<AssetType>,
    #[serde(default, deserialize_with = "optional_category")]
    region: Option<Region>,
    #[serde(default, deserialize_with = "optional_category")]
    listing: Option<Listing>,
}

impl DealRow {
    fn into_deal(self) -> Deal {
        Deal {
            id: DealId(self.deal),
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

fn indicator<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Indicator::parse(&raw).is_yes())
}

fn finite<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(de::Error::custom(format!("'{value}' is not a finite number")))
    }
}

fn optional_category<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| value.parse::<T>().map_err(de::Error::custom))
        .transpose()
}

#[cfg(test)]
pub(crate) fn resolve_for_tests(header: &str) -> Option<Column> {
    Column::resolve(header)
}
