//! Floor, ceiling and direction enforcement.

use super::context::ResolvedPrice;
use crate::domain::{Category, Decimal, MinQty, PriceDirection, VendorConfig};

/// Why a tier keeps its current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// The move contradicts the configured direction.
    Direction,
    /// Candidate is under the floor.
    Floor,
    /// Candidate is over max and clamping to max would move the wrong way.
    MaxBlocked,
    /// No competitors and already at max.
    AlreadyMaxed,
    SisterLowest,
    AlreadyLowest,
}

impl HoldReason {
    pub fn category(&self) -> Category {
        match self {
            HoldReason::Direction | HoldReason::MaxBlocked => Category::IgnoreSettings,
            HoldReason::Floor => Category::IgnoreFloor,
            HoldReason::AlreadyMaxed | HoldReason::AlreadyLowest => Category::IgnoreLowest,
            HoldReason::SisterLowest => Category::IgnoreSisterLowest,
        }
    }
}

/// Why a tier above the base should be deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveReason {
    NoReference,
    NotCheaperThanBase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampOutcome {
    Change { price: Decimal, hit_max: bool },
    Hold(HoldReason),
    Remove(RemoveReason),
}

impl ClampOutcome {
    pub fn suggested_price(&self) -> Option<Decimal> {
        match self {
            ClampOutcome::Change { price, .. } => Some(*price),
            _ => None,
        }
    }
}

/// Apply the vendor's constraints to a resolved price.
///
/// `existing` is the operator's current price on an active tier, or `None`
/// when the tier is not live.
pub fn clamp(
    resolved: &ResolvedPrice,
    existing: Option<Decimal>,
    qty: MinQty,
    config: &VendorConfig,
) -> ClampOutcome {
    match resolved {
        ResolvedPrice::NoCompetitor => clamp_without_competitors(existing, qty, config),
        ResolvedPrice::SisterLowest { .. } => ClampOutcome::Hold(HoldReason::SisterLowest),
        ResolvedPrice::Candidate(candidate) => {
            let price = candidate.price.round_to_cent();

            if let Some(existing) = existing {
                let blocked = match config.direction {
                    PriceDirection::Down => price >= existing,
                    PriceDirection::Up => price <= existing,
                    PriceDirection::Both => false,
                };
                if blocked {
                    return ClampOutcome::Hold(HoldReason::Direction);
                }
            }

            if price < config.floor_price {
                return ClampOutcome::Hold(HoldReason::Floor);
            }

            let (price, hit_max) = if price > config.max_price {
                if let Some(existing) = existing {
                    if !config.direction.allows_move(existing, config.max_price) {
                        return ClampOutcome::Hold(HoldReason::MaxBlocked);
                    }
                }
                (config.max_price, true)
            } else {
                (price, false)
            };

            if let Some(existing) = existing {
                if existing <= candidate.reference_price || price == existing {
                    return ClampOutcome::Hold(HoldReason::AlreadyLowest);
                }
            }

            ClampOutcome::Change { price, hit_max }
        }
    }
}

fn clamp_without_competitors(
    existing: Option<Decimal>,
    qty: MinQty,
    config: &VendorConfig,
) -> ClampOutcome {
    if !qty.is_base() {
        return ClampOutcome::Remove(RemoveReason::NoReference);
    }
    match existing {
        Some(existing) if existing >= config.max_price => ClampOutcome::Hold(HoldReason::AlreadyMaxed),
        Some(_) if !config.direction.allows_up() => ClampOutcome::Hold(HoldReason::Direction),
        _ => ClampOutcome::Change {
            price: config.max_price,
            hit_max: true,
        },
    }
}
