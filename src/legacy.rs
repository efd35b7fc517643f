//! Translation to and from the previous engine's freeform result strings.
//!
//! The old engine reported outcomes as text such as `IGNORE #HITFLOOR` and
//! classified them by substring. This adapter exists for side-by-side
//! comparison runs only; [`Decision`] is the primary representation.

use crate::domain::{Category, Decision, MinQty, VendorId};
use serde::Serialize;

/// Render a decision the way the previous engine would have reported it.
pub fn to_legacy_result(decision: &Decision) -> String {
    let head = match decision.category {
        Category::ChangeUp => "CHANGE #UP",
        Category::ChangeDown => "CHANGE #DOWN",
        Category::ChangeNew => "CHANGE #NEW",
        Category::ChangeRemoved => "CHANGE #REMOVED",
        Category::IgnoreFloor => "IGNORE #HITFLOOR",
        Category::IgnoreLowest => "IGNORE #LOWEST",
        Category::IgnoreSisterLowest => "IGNORE #SISTERLOWEST",
        Category::IgnoreSettings => "IGNORE #SETTINGS",
        Category::IgnoreShortExpiry => "IGNORE #SHORTEXPIRY",
        Category::Error => "ERROR",
    };

    let mut result = head.to_string();
    for tag in &decision.tags {
        let upper = tag.to_uppercase();
        if !result.split_whitespace().any(|t| t == upper) {
            result.push(' ');
            result.push_str(&upper);
        }
    }
    if let Some(price) = decision.suggested_price {
        result.push_str(" @ ");
        result.push_str(&price.to_money_string());
    }
    result
}

/// Classify a legacy result string. Unrecognized text is an error.
pub fn classify(result: &str) -> Category {
    let upper = result.to_uppercase();
    let has = |needle: &str| upper.contains(needle);

    if has("ERROR") {
        return Category::Error;
    }
    if has("IGNORE") {
        return if has("#SHORTEXPIRY") {
            Category::IgnoreShortExpiry
        } else if has("#HITFLOOR") {
            Category::IgnoreFloor
        } else if has("#SISTER") {
            Category::IgnoreSisterLowest
        } else if has("#LOWEST") {
            Category::IgnoreLowest
        } else {
            Category::IgnoreSettings
        };
    }
    if has("CHANGE") {
        if has("#REMOVED") {
            return Category::ChangeRemoved;
        }
        if has("#NEW") {
            return Category::ChangeNew;
        }
        if has("#UP") {
            return Category::ChangeUp;
        }
        if has("#DOWN") {
            return Category::ChangeDown;
        }
    }
    Category::Error
}

/// One result reported by the previous engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyResult {
    pub vendor_id: VendorId,
    pub min_qty: MinQty,
    pub result: String,
}

/// A tier on which the two engines disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub vendor_id: VendorId,
    pub min_qty: MinQty,
    /// `None` when the engine produced no decision for the tier.
    pub current: Option<Category>,
    pub legacy: Option<Category>,
}

/// Compare current decisions against legacy results, tier by tier.
pub fn compare(decisions: &[Decision], legacy: &[LegacyResult]) -> Vec<Mismatch> {
    let mut keys: Vec<(VendorId, MinQty)> = decisions
        .iter()
        .map(|d| (d.vendor_id, d.min_qty))
        .chain(legacy.iter().map(|l| (l.vendor_id, l.min_qty)))
        .collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|(vendor_id, min_qty)| {
            let current = decisions
                .iter()
                .find(|d| d.vendor_id == vendor_id && d.min_qty == min_qty)
                .map(|d| d.category);
            let old = legacy
                .iter()
                .find(|l| l.vendor_id == vendor_id && l.min_qty == min_qty)
                .map(|l| classify(&l.result));
            (current != old).then_some(Mismatch {
                vendor_id,
                min_qty,
                current,
                legacy: old,
            })
        })
        .collect()
}
