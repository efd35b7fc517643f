//! Maps clamp outcomes onto the decision taxonomy and renders explanations.
//!
//! Explanation format: `CATEGORY: detail | #Tag #Tag | ctx=url`. Tags are
//! parsed back out of the rendered string, so the string is the single source
//! of truth for both humans and downstream consumers.

use super::clamp::{ClampOutcome, HoldReason, RemoveReason};
use super::context::{PriceKind, ResolvedPrice};
use crate::domain::{tags, Category, Decimal, Decision, MinQty, ProductId, VendorConfig, VendorId};

/// Bookkeeping for the tier under evaluation.
#[derive(Debug, Clone, Copy)]
pub struct TierContext<'a> {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub min_qty: MinQty,
    /// Current price when the operator actively lists this tier.
    pub existing: Option<Decimal>,
    /// Whether the operator actively lists this tier.
    pub listed: bool,
    pub context_url: &'a str,
}

impl TierContext<'_> {
    /// Build a decision from parts; tags are extracted from the explanation.
    pub fn decision(
        &self,
        category: Category,
        suggested: Option<Decimal>,
        detail: &str,
        tag_list: &[&str],
    ) -> Decision {
        let explanation = render_explanation(category, detail, tag_list, self.context_url);
        Decision::new(
            self.product_id,
            self.vendor_id,
            self.min_qty,
            self.existing,
            suggested,
            category,
            explanation,
        )
    }
}

pub fn render_explanation(category: Category, detail: &str, tag_list: &[&str], context_url: &str) -> String {
    let mut parts = vec![format!("{}: {}", category.as_str(), detail)];
    if !tag_list.is_empty() {
        parts.push(tag_list.join(" "));
    }
    if !context_url.is_empty() {
        parts.push(format!("ctx={}", context_url));
    }
    parts.join(" | ")
}

/// Classify one tier evaluation.
///
/// Returns `None` for a tier the operator does not list when nothing is
/// proposed for it: there is no price to hold and nothing to remove.
pub fn categorize(
    ctx: &TierContext<'_>,
    resolved: &ResolvedPrice,
    outcome: &ClampOutcome,
    config: &VendorConfig,
) -> Option<Decision> {
    match outcome {
        ClampOutcome::Change { price, hit_max } => {
            let category = match ctx.existing {
                Some(existing) if ctx.listed => {
                    if *price > existing {
                        Category::ChangeUp
                    } else {
                        Category::ChangeDown
                    }
                }
                _ => Category::ChangeNew,
            };

            let mut tag_list = resolved_tags(resolved);
            if *hit_max {
                tag_list.push(tags::HIT_MAX);
            }
            if category == Category::ChangeNew {
                tag_list.push(tags::NEW_TIER);
            }

            let movement = match ctx.existing {
                Some(existing) if ctx.listed => format!(
                    "{} -> {}",
                    existing.to_money_string(),
                    price.to_money_string()
                ),
                _ => format!("list at {}", price.to_money_string()),
            };
            let detail = format!("{} {}", movement, reference_text(resolved));
            Some(ctx.decision(category, Some(*price), detail.trim_end(), &tag_list))
        }
        ClampOutcome::Hold(reason) => {
            if !ctx.listed {
                return None;
            }
            let (detail, tag_list) = hold_detail(*reason, resolved, config);
            Some(ctx.decision(reason.category(), None, &detail, &tag_list))
        }
        ClampOutcome::Remove(reason) => {
            if !ctx.listed {
                return None;
            }
            let (detail, tag) = match reason {
                RemoveReason::NoReference => (
                    "no eligible competitor quotes this quantity; deactivate tier".to_string(),
                    tags::NO_REFERENCE,
                ),
                RemoveReason::NotCheaperThanBase => (
                    "tier price would not undercut the single-unit price; deactivate tier".to_string(),
                    tags::NOT_CHEAPER_THAN_BASE,
                ),
            };
            Some(ctx.decision(Category::ChangeRemoved, None, &detail, &[tag]))
        }
    }
}

fn kind_tag(kind: PriceKind) -> &'static str {
    match kind {
        PriceKind::Offset => tags::OFFSET,
        PriceKind::Percentage => tags::PERCENTAGE,
        PriceKind::FloorOffset => tags::FLOOR_OFFSET,
    }
}

fn resolved_tags(resolved: &ResolvedPrice) -> Vec<&'static str> {
    match resolved {
        ResolvedPrice::NoCompetitor => vec![tags::NO_COMPETITORS],
        ResolvedPrice::SisterLowest { .. } => vec![tags::SISTER],
        ResolvedPrice::Candidate(c) => {
            let mut list = vec![kind_tag(c.kind)];
            if c.competed_with_next {
                list.push(tags::COMPETE_WITH_NEXT);
            }
            list
        }
    }
}

fn reference_text(resolved: &ResolvedPrice) -> String {
    match resolved {
        ResolvedPrice::NoCompetitor => "(no eligible competitors)".to_string(),
        ResolvedPrice::SisterLowest {
            sister,
            sister_price,
            ..
        } => format!("(sister {} at {})", sister, sister_price.to_money_string()),
        ResolvedPrice::Candidate(c) => {
            let name = if c.reference_name.is_empty() {
                c.reference_vendor.to_string()
            } else {
                format!("{} [{}]", c.reference_name, c.reference_vendor)
            };
            format!("(vs {} at {})", name, c.reference_price.round_to_cent().to_money_string())
        }
    }
}

fn hold_detail(
    reason: HoldReason,
    resolved: &ResolvedPrice,
    config: &VendorConfig,
) -> (String, Vec<&'static str>) {
    let candidate = match resolved {
        ResolvedPrice::Candidate(c) => Some(c.price.round_to_cent().to_money_string()),
        _ => None,
    };
    let reference = reference_text(resolved);

    match reason {
        HoldReason::Floor => {
            let mut tag_list = vec![tags::HIT_FLOOR];
            tag_list.extend(resolved_tags(resolved));
            (
                format!(
                    "candidate {} is below floor {} {}",
                    candidate.unwrap_or_default(),
                    config.floor_price.to_money_string(),
                    reference
                ),
                tag_list,
            )
        }
        HoldReason::Direction => (
            format!(
                "direction {:?} does not allow moving to {} {}",
                config.direction,
                candidate.unwrap_or_else(|| config.max_price.to_money_string()),
                reference
            ),
            vec![tags::DIRECTION],
        ),
        HoldReason::MaxBlocked => (
            format!(
                "candidate above max {} and direction {:?} blocks clamping {}",
                config.max_price.to_money_string(),
                config.direction,
                reference
            ),
            vec![tags::HIT_MAX, tags::DIRECTION],
        ),
        HoldReason::AlreadyMaxed => (
            "already maxed, no competitors".to_string(),
            vec![tags::NO_COMPETITORS, tags::ALREADY_MAXED],
        ),
        HoldReason::SisterLowest => (
            format!("sister vendor is lowest {}", reference),
            vec![tags::SISTER],
        ),
        HoldReason::AlreadyLowest => (
            format!("already lowest {}", reference),
            vec![tags::LOWEST],
        ),
    }
}
