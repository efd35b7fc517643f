//! Normalized vendor offers and their quantity price tiers.

use crate::domain::{Decimal, MinQty, VendorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A quantity break on a vendor listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub min_qty: MinQty,
    /// `None` when the upstream value could not be parsed.
    pub unit_price: Option<Decimal>,
    pub active: bool,
    /// End of a time-boxed promotional price, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PriceTier {
    pub fn new(min_qty: MinQty, unit_price: Decimal) -> Self {
        Self {
            min_qty,
            unit_price: Some(unit_price),
            active: true,
            expires_at: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Active with a usable price.
    pub fn is_quotable(&self) -> bool {
        self.active && self.unit_price.is_some()
    }
}

/// One vendor's listing for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorOffer {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub in_stock: bool,
    pub standard_shipping: Option<Decimal>,
    /// Shipping/handling speed class in days.
    pub shipping_days: Option<u32>,
    pub inventory: Option<i64>,
    pub badge_id: Option<i64>,
    pub badge_name: Option<String>,
    pub free_shipping_gap: Option<Decimal>,
    pub free_shipping_threshold: Option<Decimal>,
    /// Marketplace marks this offer as the current lowest-total (buy box) holder.
    #[serde(default)]
    pub buy_box: bool,
    pub tiers: Vec<PriceTier>,
}

impl VendorOffer {
    /// Create an in-stock offer with no shipping details.
    pub fn new(vendor_id: VendorId, vendor_name: impl Into<String>) -> Self {
        Self {
            vendor_id,
            vendor_name: vendor_name.into(),
            in_stock: true,
            standard_shipping: Some(Decimal::zero()),
            shipping_days: None,
            inventory: None,
            badge_id: None,
            badge_name: None,
            free_shipping_gap: None,
            free_shipping_threshold: None,
            buy_box: false,
            tiers: Vec::new(),
        }
    }

    pub fn with_tier(mut self, tier: PriceTier) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn with_price(self, min_qty: u32, unit_price: Decimal) -> Self {
        self.with_tier(PriceTier::new(MinQty::new(min_qty), unit_price))
    }

    pub fn has_badge(&self) -> bool {
        self.badge_id.is_some_and(|id| id > 0)
            || self.badge_name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    pub fn has_active_tiers(&self) -> bool {
        self.tiers.iter().any(PriceTier::is_quotable)
    }

    /// The tier listed at exactly `min_qty`.
    ///
    /// Duplicates resolve to the first active entry, then the first entry.
    pub fn tier(&self, min_qty: MinQty) -> Option<&PriceTier> {
        self.tiers
            .iter()
            .find(|t| t.min_qty == min_qty && t.active)
            .or_else(|| self.tiers.iter().find(|t| t.min_qty == min_qty))
    }

    /// The active tier a buyer of `qty` units would be charged: the quotable
    /// tier with the greatest minimum quantity not above `qty`.
    pub fn applicable_tier(&self, qty: MinQty) -> Option<&PriceTier> {
        let mut best: Option<&PriceTier> = None;
        for tier in self.tiers.iter().filter(|t| t.is_quotable()) {
            if tier.min_qty > qty {
                continue;
            }
            // strict comparison keeps the first-seen duplicate
            if best.map(|b| tier.min_qty > b.min_qty).unwrap_or(true) {
                best = Some(tier);
            }
        }
        best
    }

    /// Distinct minimum quantities across all tiers, ascending.
    pub fn tier_quantities(&self) -> Vec<MinQty> {
        let mut qtys: Vec<MinQty> = self.tiers.iter().map(|t| t.min_qty).collect();
        qtys.sort();
        qtys.dedup();
        qtys
    }
}

/// All normalized offers for one product snapshot, keyed by vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSet {
    offers: BTreeMap<VendorId, VendorOffer>,
}

impl OfferSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an offer unless the vendor is already present (first wins).
    ///
    /// Returns false when the offer was ignored as a duplicate.
    pub fn insert(&mut self, offer: VendorOffer) -> bool {
        if self.offers.contains_key(&offer.vendor_id) {
            return false;
        }
        self.offers.insert(offer.vendor_id, offer);
        true
    }

    pub fn get(&self, vendor_id: VendorId) -> Option<&VendorOffer> {
        self.offers.get(&vendor_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VendorOffer> {
        self.offers.values()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl FromIterator<VendorOffer> for OfferSet {
    fn from_iter<I: IntoIterator<Item = VendorOffer>>(iter: I) -> Self {
        let mut set = OfferSet::new();
        for offer in iter {
            set.insert(offer);
        }
        set
    }
}
