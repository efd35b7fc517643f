//! Collaborator seams: where snapshots come from and where decisions go.

use crate::domain::{OfferSet, ProductId, VendorConfig, VendorId};
use crate::engine::RepriceOutcome;
use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

pub mod mock;

pub use mock::{MockSnapshotSource, RecordingSink};

/// Everything the engine needs for one product, read at one instant.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub offers: OfferSet,
    /// Operator vendors in a non-error state.
    pub active_vendors: Vec<VendorId>,
    pub configs: Vec<VendorConfig>,
    /// Overrides the URL derived from `CONTEXT_URL_BASE`.
    pub context_url: Option<String>,
}

/// Source of product snapshots (marketplace scrape plus operator settings).
///
/// Implementations own rate limiting and retries against the marketplace.
#[async_trait]
pub trait SnapshotSource: Send + Sync + fmt::Debug {
    /// Products due for evaluation in this run.
    async fn list_products(&self) -> Result<Vec<ProductId>, SourceError>;

    async fn fetch_snapshot(&self, product_id: ProductId) -> Result<ProductSnapshot, SourceError>;
}

/// Destination for decisions: the results log and the price-update API.
#[async_trait]
pub trait DecisionSink: Send + Sync + fmt::Debug {
    /// Record every decision of one product, including IGNORE_* ones.
    async fn record(&self, run_id: Uuid, outcome: &RepriceOutcome) -> Result<(), SourceError>;
}

/// Error type for collaborator operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Product unknown to the source
    NotFound(ProductId),
    /// Upstream temporarily unavailable (timeouts, 5xx, rate limits)
    Unavailable(String),
    /// Upstream returned data that could not be read
    ParseError(String),
    Other(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(id) => write!(f, "Product not found: {}", id),
            SourceError::Unavailable(msg) => write!(f, "Source unavailable: {}", msg),
            SourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}
