//! Bay Street hospitality deal scoring and portfolio allocation.
//!
//! [`scoring`] turns raw deal attributes into AHA, BAS and the composite Bay
//! Score; [`allocation`] picks a volatility- and illiquidity-constrained mix of
//! scored deals. The remaining modules are the ingestion, storage and HTTP
//! boundaries around those two.

pub mod allocation;
pub mod config;
pub mod error;
pub mod ingest;
pub mod router;
pub mod scoring;
pub mod service;
pub mod telemetry;
pub mod universe;

pub use allocation::{allocate, AllocationConstraints, AllocationResult, AllocationStatus, Objective};
pub use router::deal_router;
pub use scoring::{score, Deal, ScoredDeal, ScoringEngine};
pub use service::{AllocationRequest, DealService, DealServiceError};
pub use universe::Universe;
