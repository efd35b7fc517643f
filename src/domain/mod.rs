//! Domain types for the repricing engine.
//!
//! This module provides:
//! - Lossless money handling via the Decimal wrapper
//! - Domain primitives: ProductId, VendorId, MinQty
//! - Normalized offers, operator policy and the decision taxonomy

pub mod decimal;
pub mod decision;
pub mod offer;
pub mod primitives;
pub mod vendor_config;

pub use decimal::Decimal;
pub use decision::{extract_tags, tags, Category, Decision};
pub use offer::{OfferSet, PriceTier, VendorOffer};
pub use primitives::{MinQty, ProductId, VendorId};
pub use vendor_config::{
    BadgePolicy, HandlingTimeGroup, PriceDirection, PriceStrategy, VendorConfig,
};
