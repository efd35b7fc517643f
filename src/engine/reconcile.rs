//! Quantity-break reconciliation.
//!
//! Aligns the operator's prior tier listing with the decisions of one run and
//! produces the resulting listing. Applying the same decisions to that
//! resulting listing yields an empty delta.

use super::categorize::TierContext;
use super::TierScope;
use crate::domain::{tags, Category, Decimal, Decision, MinQty, PriceTier, ProductId, VendorId};
use serde::Serialize;
use std::collections::BTreeMap;

/// A tier and the unit price it should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPrice {
    pub min_qty: MinQty,
    pub unit_price: Decimal,
}

/// Listing changes implied by one run's decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDelta {
    /// Tiers to create or reactivate.
    pub added: Vec<TierPrice>,
    /// Active tiers whose price changes.
    pub updated: Vec<TierPrice>,
    pub deactivated: Vec<MinQty>,
}

impl TierDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deactivated.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub vendor_id: VendorId,
    pub delta: TierDelta,
    /// Listing after the delta is applied, ascending by minimum quantity.
    pub listing: Vec<PriceTier>,
    /// Removals issued for active tiers that received no decision.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub synthesized: Vec<Decision>,
}

/// Reconcile `prior` against `decisions` for one operator vendor.
///
/// Only tiers inside `scope` are touched. Decisions for other vendors are
/// ignored.
pub fn reconcile(
    prior: &[PriceTier],
    decisions: &[Decision],
    scope: TierScope,
    product_id: ProductId,
    vendor_id: VendorId,
    context_url: &str,
) -> Reconciliation {
    let mut listing = dedupe_listing(prior);
    let decisions: Vec<&Decision> = decisions.iter().filter(|d| d.vendor_id == vendor_id).collect();

    let synthesized: Vec<Decision> = listing
        .values()
        .filter(|tier| tier.active && scope.includes(tier.min_qty))
        .filter(|tier| !decisions.iter().any(|d| d.min_qty == tier.min_qty))
        .map(|tier| {
            let ctx = TierContext {
                product_id,
                vendor_id,
                min_qty: tier.min_qty,
                existing: tier.unit_price,
                listed: true,
                context_url,
            };
            ctx.decision(
                Category::ChangeRemoved,
                None,
                "active tier was not evaluated this run; deactivate tier",
                &[tags::NOT_EVALUATED],
            )
        })
        .collect();

    let mut delta = TierDelta::default();
    for decision in decisions.into_iter().chain(synthesized.iter()) {
        if !scope.includes(decision.min_qty) {
            continue;
        }
        apply(&mut listing, &mut delta, decision);
    }

    Reconciliation {
        vendor_id,
        delta,
        listing: listing.into_values().collect(),
        synthesized,
    }
}

fn apply(listing: &mut BTreeMap<MinQty, PriceTier>, delta: &mut TierDelta, decision: &Decision) {
    let qty = decision.min_qty;
    match decision.category {
        Category::ChangeUp | Category::ChangeDown | Category::ChangeNew => {
            let Some(price) = decision.suggested_price else {
                return;
            };
            match listing.get_mut(&qty) {
                Some(tier) if tier.active => {
                    if tier.unit_price != Some(price) {
                        tier.unit_price = Some(price);
                        delta.updated.push(TierPrice { min_qty: qty, unit_price: price });
                    }
                }
                Some(tier) => {
                    tier.active = true;
                    tier.unit_price = Some(price);
                    tier.expires_at = None;
                    delta.added.push(TierPrice { min_qty: qty, unit_price: price });
                }
                None => {
                    listing.insert(qty, PriceTier::new(qty, price));
                    delta.added.push(TierPrice { min_qty: qty, unit_price: price });
                }
            }
        }
        Category::ChangeRemoved => {
            if let Some(tier) = listing.get_mut(&qty) {
                if tier.active {
                    tier.active = false;
                    delta.deactivated.push(qty);
                }
            }
        }
        _ => {}
    }
}

/// One entry per minimum quantity: first active entry, else first entry.
fn dedupe_listing(prior: &[PriceTier]) -> BTreeMap<MinQty, PriceTier> {
    let mut listing: BTreeMap<MinQty, PriceTier> = BTreeMap::new();
    for tier in prior {
        match listing.get(&tier.min_qty) {
            Some(seen) if seen.active || !tier.active => {}
            _ => {
                listing.insert(tier.min_qty, tier.clone());
            }
        }
    }
    listing
}
