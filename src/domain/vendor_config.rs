//! Operator-controlled repricing policy for one (product, operator vendor) pair.

use crate::domain::{Decimal, VendorId};
use serde::{Deserialize, Serialize};

/// Which way the engine may move the operator's price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceDirection {
    Up,
    Down,
    #[default]
    Both,
}

impl PriceDirection {
    pub fn allows_up(&self) -> bool {
        matches!(self, PriceDirection::Up | PriceDirection::Both)
    }

    pub fn allows_down(&self) -> bool {
        matches!(self, PriceDirection::Down | PriceDirection::Both)
    }

    /// Whether moving from `existing` to `target` is permitted.
    pub fn allows_move(&self, existing: Decimal, target: Decimal) -> bool {
        if target > existing {
            self.allows_up()
        } else if target < existing {
            self.allows_down()
        } else {
            true
        }
    }
}

/// How competitor prices are compared against the operator's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceStrategy {
    #[default]
    Unit,
    Total,
    BuyBox,
}

/// Shipping-speed band competitors must fall into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandlingTimeGroup {
    #[default]
    All,
    /// Ships within 2 days.
    FastShipping,
    /// Ships within 5 days.
    Stocked,
    /// Ships in 6 days or more.
    LongHandling,
}

impl HandlingTimeGroup {
    /// Unknown speed never matches a restricted band.
    pub fn admits(&self, shipping_days: Option<u32>) -> bool {
        match (self, shipping_days) {
            (HandlingTimeGroup::All, _) => true,
            (_, None) => false,
            (HandlingTimeGroup::FastShipping, Some(days)) => days <= 2,
            (HandlingTimeGroup::Stocked, Some(days)) => days <= 5,
            (HandlingTimeGroup::LongHandling, Some(days)) => days >= 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BadgePolicy {
    #[default]
    All,
    BadgeOnly,
    NonBadgeOnly,
}

impl BadgePolicy {
    pub fn admits(&self, has_badge: bool) -> bool {
        match self {
            BadgePolicy::All => true,
            BadgePolicy::BadgeOnly => has_badge,
            BadgePolicy::NonBadgeOnly => !has_badge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorConfig {
    pub vendor_id: VendorId,
    pub floor_price: Decimal,
    pub max_price: Decimal,
    pub direction: PriceDirection,
    pub strategy: PriceStrategy,
    pub enabled: bool,
    pub sister_vendors: Vec<VendorId>,
    pub excluded_vendors: Vec<VendorId>,
    pub compete_with_all_vendors: bool,
    pub floor_compete_with_next: bool,
    pub own_inventory_threshold: Option<i64>,
    pub competitor_inventory_threshold: Option<i64>,
    pub standard_shipping: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub include_inactive_vendors: bool,
    pub handling_time_group: HandlingTimeGroup,
    pub badge_policy: BadgePolicy,
    /// Fraction to undercut by on the base tier, e.g. `0.03`.
    pub percentage_down: Option<Decimal>,
}

impl VendorConfig {
    /// A permissive policy between `floor_price` and `max_price`.
    pub fn new(vendor_id: VendorId, floor_price: Decimal, max_price: Decimal) -> Self {
        Self {
            vendor_id,
            floor_price,
            max_price,
            direction: PriceDirection::Both,
            strategy: PriceStrategy::Unit,
            enabled: true,
            sister_vendors: Vec::new(),
            excluded_vendors: Vec::new(),
            compete_with_all_vendors: false,
            floor_compete_with_next: false,
            own_inventory_threshold: None,
            competitor_inventory_threshold: None,
            standard_shipping: Decimal::zero(),
            free_shipping_threshold: None,
            include_inactive_vendors: false,
            handling_time_group: HandlingTimeGroup::All,
            badge_policy: BadgePolicy::All,
            percentage_down: None,
        }
    }

    pub fn is_sister(&self, vendor_id: VendorId) -> bool {
        self.sister_vendors.contains(&vendor_id)
    }

    pub fn is_excluded(&self, vendor_id: VendorId) -> bool {
        self.excluded_vendors.contains(&vendor_id)
    }

    /// Floor must not exceed max.
    pub fn is_consistent(&self) -> bool {
        self.floor_price <= self.max_price
    }

    /// Positive percentage-down, if configured.
    pub fn effective_percentage_down(&self) -> Option<Decimal> {
        self.percentage_down.filter(|p| p.is_positive())
    }
}
