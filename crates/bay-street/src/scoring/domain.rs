use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Identifier wrapper for a deal within a scoring session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub String);

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Hotel,
    Platform,
    Mixed,
}

impl AssetType {
    pub const fn label(self) -> &'static str {
        match self {
            AssetType::Hotel => "Hotel",
            AssetType::Platform => "Platform",
            AssetType::Mixed => "Mixed",
        }
    }
}

impl FromStr for AssetType {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hotel" => Ok(Self::Hotel),
            "platform" => Ok(Self::Platform),
            "mixed" => Ok(Self::Mixed),
            _ => Err(UnknownCategory::new("asset type", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Americas,
    Europe,
    #[serde(rename = "APAC")]
    Apac,
    #[serde(rename = "ME")]
    MiddleEast,
    #[serde(rename = "ASEAN")]
    Asean,
}

impl Region {
    pub const fn label(self) -> &'static str {
        match self {
            Region::Americas => "Americas",
            Region::Europe => "Europe",
            Region::Apac => "APAC",
            Region::MiddleEast => "ME",
            Region::Asean => "ASEAN",
        }
    }
}

impl FromStr for Region {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "americas" => Ok(Self::Americas),
            "europe" => Ok(Self::Europe),
            "apac" => Ok(Self::Apac),
            "me" | "middle east" => Ok(Self::MiddleEast),
            "asean" => Ok(Self::Asean),
            _ => Err(UnknownCategory::new("region", value)),
        }
    }
}

/// Whether the opportunity is a listed security or a private deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Listing {
    Public,
    Private,
}

impl Listing {
    pub const fn label(self) -> &'static str {
        match self {
            Listing::Public => "Public",
            Listing::Private => "Private",
        }
    }
}

impl FromStr for Listing {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            _ => Err(UnknownCategory::new("public/private", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct UnknownCategory {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownCategory {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.trim().to_string(),
        }
    }
}

/// The three yes/no upside levers captured for each deal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunities {
    pub operational_leverage: bool,
    pub brand_repositioning: bool,
    pub management_transition: bool,
}

/// Raw deal attributes as supplied by manual entry, bulk upload or a store.
///
/// Percent fields are expressed in percentage points (`12.0` means 12 %).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    #[serde(default)]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub listing: Option<Listing>,
    pub projected_irr: f64,
    pub coc_yield: f64,
    pub volatility: f64,
    #[serde(alias = "lsd")]
    pub illiquidity_premium: f64,
    #[serde(deserialize_with = "whole_score")]
    pub esg_score: u8,
    pub sponsor_coinvest: f64,
    #[serde(default)]
    pub opportunities: Opportunities,
}

/// Accept `3` and `3.0` alike; fractional or out-of-range scores are malformed.
pub(crate) fn whole_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return Err(de::Error::custom(format!("'{value}' is not a whole score")));
    }
    Ok(value as u8)
}

impl Deal {
    /// Attributes outside their documented input bounds.
    ///
    /// Scoring never rejects these; callers decide whether to warn or refuse.
    pub fn range_violations(&self) -> Vec<RangeViolation> {
        let checks = [
            ("projected_irr", self.projected_irr, 0.0, 100.0),
            ("coc_yield", self.coc_yield, 0.0, 100.0),
            ("volatility", self.volatility, 0.0, 100.0),
            ("illiquidity_premium", self.illiquidity_premium, 0.0, 10.0),
            ("esg_score", f64::from(self.esg_score), 1.0, 5.0),
            ("sponsor_coinvest", self.sponsor_coinvest, 0.0, 100.0),
        ];

        checks
            .into_iter()
            .filter(|(_, value, min, max)| !(value >= min && value <= max))
            .map(|(field, value, min, max)| RangeViolation {
                field,
                value,
                min,
                max,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} outside [{}, {}]",
            self.field, self.value, self.min, self.max
        )
    }
}

/// A deal together with its derived benchmark metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDeal {
    #[serde(flatten)]
    pub deal: Deal,
    /// Alpha over hurdle: IRR net of the benchmark hurdle and illiquidity premium.
    pub aha: f64,
    /// Benchmark-adjusted Sharpe: AHA per unit of volatility.
    pub bas: f64,
    pub bay_score: f64,
}

impl ScoredDeal {
    pub fn id(&self) -> &DealId {
        &self.deal.id
    }
}
