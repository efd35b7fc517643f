//! Operator vendor settings as stored per product, keyed by vendor source.

use super::{parse_decimal, parse_integer, NormalizeError};
use crate::domain::{
    BadgePolicy, Decimal, HandlingTimeGroup, PriceDirection, PriceStrategy, VendorConfig, VendorId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// The operator's own vendor accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VendorSource {
    Tradent,
    Frontier,
    Mvp,
    TopDent,
    FirstDent,
    Triad,
    BiteSupply,
}

/// Settings for one operator vendor, tagged by which account they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "details", rename_all = "camelCase")]
pub enum SourcedVendorConfig {
    Tradent(RawVendorConfig),
    Frontier(RawVendorConfig),
    Mvp(RawVendorConfig),
    TopDent(RawVendorConfig),
    FirstDent(RawVendorConfig),
    Triad(RawVendorConfig),
    BiteSupply(RawVendorConfig),
}

impl SourcedVendorConfig {
    pub fn split(&self) -> (VendorSource, &RawVendorConfig) {
        match self {
            SourcedVendorConfig::Tradent(raw) => (VendorSource::Tradent, raw),
            SourcedVendorConfig::Frontier(raw) => (VendorSource::Frontier, raw),
            SourcedVendorConfig::Mvp(raw) => (VendorSource::Mvp, raw),
            SourcedVendorConfig::TopDent(raw) => (VendorSource::TopDent, raw),
            SourcedVendorConfig::FirstDent(raw) => (VendorSource::FirstDent, raw),
            SourcedVendorConfig::Triad(raw) => (VendorSource::Triad, raw),
            SourcedVendorConfig::BiteSupply(raw) => (VendorSource::BiteSupply, raw),
        }
    }

    pub fn source(&self) -> VendorSource {
        self.split().0
    }

    pub fn raw(&self) -> &RawVendorConfig {
        self.split().1
    }
}

/// Settings as persisted: loosely typed numbers and comma-separated id lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVendorConfig {
    pub vendor_id: Value,
    pub floor_price: Value,
    pub max_price: Value,
    pub direction: Option<String>,
    pub price_strategy: Option<String>,
    pub activated: Option<bool>,
    pub sister_vendor_id: Option<String>,
    pub exclude_vendors: Option<String>,
    pub compete_all: bool,
    pub floor_compete_with_next: bool,
    pub own_vendor_threshold: Value,
    pub inventory_threshold: Value,
    pub standard_shipping: Value,
    pub free_shipping_threshold: Value,
    pub include_inactive_vendors: bool,
    pub handling_time_group: Option<String>,
    pub badge_indicator: Option<String>,
    pub percentage_down: Value,
}

impl RawVendorConfig {
    pub fn to_config(&self) -> Result<VendorConfig, NormalizeError> {
        let vendor_id = parse_integer(&self.vendor_id)
            .map(VendorId)
            .ok_or_else(|| invalid("vendorId", &self.vendor_id))?;
        let floor_price =
            parse_decimal(&self.floor_price).ok_or_else(|| invalid("floorPrice", &self.floor_price))?;
        let max_price =
            parse_decimal(&self.max_price).ok_or_else(|| invalid("maxPrice", &self.max_price))?;

        Ok(VendorConfig {
            vendor_id,
            floor_price,
            max_price,
            direction: parse_direction(self.direction.as_deref())?,
            strategy: parse_strategy(self.price_strategy.as_deref())?,
            enabled: self.activated.unwrap_or(true),
            sister_vendors: parse_vendor_list(self.sister_vendor_id.as_deref().unwrap_or("")),
            excluded_vendors: parse_vendor_list(self.exclude_vendors.as_deref().unwrap_or("")),
            compete_with_all_vendors: self.compete_all,
            floor_compete_with_next: self.floor_compete_with_next,
            own_inventory_threshold: optional_integer(&self.own_vendor_threshold, "ownVendorThreshold")?,
            competitor_inventory_threshold: optional_integer(
                &self.inventory_threshold,
                "inventoryThreshold",
            )?,
            standard_shipping: optional_decimal(&self.standard_shipping, "standardShipping")?
                .unwrap_or_else(Decimal::zero),
            free_shipping_threshold: optional_decimal(
                &self.free_shipping_threshold,
                "freeShippingThreshold",
            )?,
            include_inactive_vendors: self.include_inactive_vendors,
            handling_time_group: parse_handling_group(self.handling_time_group.as_deref())?,
            badge_policy: parse_badge_policy(self.badge_indicator.as_deref())?,
            percentage_down: optional_decimal(&self.percentage_down, "percentageDown")?,
        })
    }
}

/// Resolve every sourced record into a VendorConfig.
///
/// Records that fail to parse are skipped with a warning, so the vendor is
/// treated as unconfigured for this run. The first record per vendor wins.
pub fn resolve_configs(details: &[SourcedVendorConfig]) -> Vec<VendorConfig> {
    let mut seen = HashSet::new();
    let mut configs = Vec::with_capacity(details.len());
    for detail in details {
        let (source, raw) = detail.split();
        match raw.to_config() {
            Ok(config) => {
                if seen.insert(config.vendor_id) {
                    configs.push(config);
                } else {
                    warn!(
                        "Duplicate settings for vendor {} from {:?} ignored",
                        config.vendor_id, source
                    );
                }
            }
            Err(e) => warn!("Skipping {:?} settings: {}", source, e),
        }
    }
    configs
}

/// Parse a comma-separated vendor id list. Blank and non-numeric entries are
/// ignored; an empty list is valid.
pub fn parse_vendor_list(raw: &str) -> Vec<VendorId> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match part.parse::<VendorId>() {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => warn!("Ignoring non-numeric vendor id {:?}", part),
        }
    }
    ids
}

fn invalid(name: &str, value: &Value) -> NormalizeError {
    NormalizeError::InvalidField(name.to_string(), value.to_string())
}

fn optional_decimal(value: &Value, name: &str) -> Result<Option<Decimal>, NormalizeError> {
    if is_blank(value) {
        return Ok(None);
    }
    parse_decimal(value).map(Some).ok_or_else(|| invalid(name, value))
}

fn optional_integer(value: &Value, name: &str) -> Result<Option<i64>, NormalizeError> {
    if is_blank(value) {
        return Ok(None);
    }
    parse_integer(value).map(Some).ok_or_else(|| invalid(name, value))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn normalized(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

fn parse_direction(raw: Option<&str>) -> Result<PriceDirection, NormalizeError> {
    match raw.map(normalized).as_deref() {
        None | Some("") | Some("UP/DOWN") | Some("BOTH") | Some("UP_DOWN") => {
            Ok(PriceDirection::Both)
        }
        Some("UP") => Ok(PriceDirection::Up),
        Some("DOWN") => Ok(PriceDirection::Down),
        Some(other) => Err(NormalizeError::InvalidField(
            "direction".to_string(),
            other.to_string(),
        )),
    }
}

fn parse_strategy(raw: Option<&str>) -> Result<PriceStrategy, NormalizeError> {
    match raw.map(normalized).as_deref() {
        None | Some("") | Some("UNIT") => Ok(PriceStrategy::Unit),
        Some("TOTAL") => Ok(PriceStrategy::Total),
        Some("BUY_BOX") | Some("BUYBOX") => Ok(PriceStrategy::BuyBox),
        Some(other) => Err(NormalizeError::InvalidField(
            "priceStrategy".to_string(),
            other.to_string(),
        )),
    }
}

fn parse_handling_group(raw: Option<&str>) -> Result<HandlingTimeGroup, NormalizeError> {
    match raw.map(normalized).as_deref() {
        None | Some("") | Some("ALL") => Ok(HandlingTimeGroup::All),
        Some("FAST_SHIPPING") => Ok(HandlingTimeGroup::FastShipping),
        Some("STOCKED") => Ok(HandlingTimeGroup::Stocked),
        Some("LONG_HANDLING") => Ok(HandlingTimeGroup::LongHandling),
        Some(other) => Err(NormalizeError::InvalidField(
            "handlingTimeGroup".to_string(),
            other.to_string(),
        )),
    }
}

fn parse_badge_policy(raw: Option<&str>) -> Result<BadgePolicy, NormalizeError> {
    match raw.map(normalized).as_deref() {
        None | Some("") | Some("ALL") | Some("ALL_ZERO") => Ok(BadgePolicy::All),
        Some("BADGE_ONLY") => Ok(BadgePolicy::BadgeOnly),
        Some("NON_BADGE_ONLY") => Ok(BadgePolicy::NonBadgeOnly),
        Some(other) => Err(NormalizeError::InvalidField(
            "badgeIndicator".to_string(),
            other.to_string(),
        )),
    }
}
