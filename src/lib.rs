pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod legacy;
pub mod normalize;
pub mod orchestration;

pub use config::Config;
pub use datasource::{DecisionSink, MockSnapshotSource, ProductSnapshot, RecordingSink, SnapshotSource, SourceError};
pub use domain::{
    Category, Decimal, Decision, MinQty, OfferSet, PriceTier, ProductId, VendorConfig, VendorId,
    VendorOffer,
};
pub use engine::{EngineSettings, RepriceOutcome, RepriceRequest, Repricer};
pub use error::AppError;
pub use orchestration::{BatchRunner, BatchSummary};
