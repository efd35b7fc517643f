//! Offer normalization: raw marketplace records into canonical domain values.
//!
//! Upstream feeds disagree on field names and frequently send numbers as
//! strings. Everything numeric goes through [`parse_decimal`] /
//! [`parse_integer`], which return `None` instead of guessing a zero.

use crate::domain::{Decimal, MinQty, OfferSet, PriceTier, VendorId, VendorOffer};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod sourced;

pub use sourced::{
    parse_vendor_list, resolve_configs, RawVendorConfig, SourcedVendorConfig, VendorSource,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidField(String, String),
    #[error("Expected a JSON object")]
    NotAnObject,
}

/// Normalize one product's raw offers.
///
/// Records that cannot be attributed to a vendor are dropped with a warning;
/// a repeated vendor keeps its first record.
pub fn normalize_offers(raw: &[Value]) -> OfferSet {
    let mut offers = OfferSet::new();
    for record in raw {
        match parse_offer(record) {
            Ok(offer) => {
                let vendor_id = offer.vendor_id;
                if !offers.insert(offer) {
                    debug!("Duplicate offer for vendor {} ignored", vendor_id);
                }
            }
            Err(e) => warn!("Failed to parse offer: {}", e),
        }
    }
    offers
}

/// Parse a single raw offer record.
pub fn parse_offer(record: &Value) -> Result<VendorOffer, NormalizeError> {
    if !record.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let vendor_id = field(record, &["vendorId", "vendor_id"])
        .ok_or_else(|| NormalizeError::MissingField("vendorId".to_string()))
        .and_then(|v| {
            parse_integer(v)
                .map(VendorId)
                .ok_or_else(|| NormalizeError::InvalidField("vendorId".to_string(), v.to_string()))
        })?;

    let vendor_name = field(record, &["vendorName", "vendor_name"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let tiers = match field(record, &["priceBreaks", "tiers", "price_breaks"]) {
        Some(Value::Array(items)) => items.iter().filter_map(parse_tier).collect(),
        _ => Vec::new(),
    };

    Ok(VendorOffer {
        vendor_id,
        vendor_name,
        in_stock: field(record, &["inStock", "in_stock"])
            .and_then(parse_flag)
            .unwrap_or(false),
        standard_shipping: field(record, &["standardShipping", "standard_shipping"])
            .and_then(parse_decimal),
        shipping_days: field(record, &["shippingTime", "shippingDays", "shipping_days"])
            .and_then(parse_integer)
            .and_then(|days| u32::try_from(days).ok()),
        inventory: field(record, &["inventory"]).and_then(parse_integer),
        badge_id: field(record, &["badgeId", "badge_id"]).and_then(parse_integer),
        badge_name: field(record, &["badgeName", "badge_name"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty()),
        free_shipping_gap: field(record, &["freeShippingGap", "free_shipping_gap"])
            .and_then(parse_decimal),
        free_shipping_threshold: field(
            record,
            &["freeShippingThreshold", "free_shipping_threshold"],
        )
        .and_then(parse_decimal),
        buy_box: field(record, &["isLowestTotalPrice", "buyBox", "buy_box"])
            .and_then(parse_flag)
            .unwrap_or(false),
        tiers,
    })
}

/// A tier without a usable minimum quantity is dropped; an unparseable price
/// is kept as `None`.
fn parse_tier(raw: &Value) -> Option<PriceTier> {
    let min_qty = field(raw, &["minQty", "min_qty"])
        .and_then(parse_integer)
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q > 0);
    let Some(min_qty) = min_qty else {
        warn!("Dropping price break without a valid minQty: {}", raw);
        return None;
    };

    Some(PriceTier {
        min_qty: MinQty(min_qty),
        unit_price: field(raw, &["unitPrice", "unit_price", "price"]).and_then(parse_decimal),
        active: field(raw, &["active"]).and_then(parse_flag).unwrap_or(true),
        expires_at: field(raw, &["promoExpiresAt", "expiresAt", "expires_at"])
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

fn field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| record.get(*name))
        .find(|v| !v.is_null())
}

/// Parse a JSON number or numeric string into a Decimal.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str_canonical(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str_canonical(s).ok(),
        _ => None,
    }
}

/// Parse a JSON integer or integral string.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse booleans sent as `true`, `"true"`, `"Y"`, `1` and friends.
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "y" | "yes" | "1" => Some(true),
            "false" | "n" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
