//! Context price resolution: reference competitor price and candidate price.

use super::eligibility::EligibleSet;
use super::EngineSettings;
use crate::domain::{Decimal, MinQty, PriceStrategy, VendorConfig, VendorId, VendorOffer};
use serde::Serialize;
use tracing::debug;

/// How a candidate price was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceKind {
    Offset,
    Percentage,
    /// Percentage pricing was attempted but landed at or below floor.
    FloorOffset,
}

/// A proposed price anchored to one competitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub reference_vendor: VendorId,
    pub reference_name: String,
    /// Competitor price in the operator's per-unit terms.
    pub reference_price: Decimal,
    pub price: Decimal,
    pub kind: PriceKind,
    /// A cheaper competitor was skipped because it sits under our floor.
    pub competed_with_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPrice {
    NoCompetitor,
    SisterLowest {
        sister: VendorId,
        sister_price: Decimal,
        competitor_price: Option<Decimal>,
    },
    Candidate(Candidate),
}

/// A competitor's price for the target quantity, strategy-adjusted.
#[derive(Debug, Clone)]
struct Quote<'a> {
    offer: &'a VendorOffer,
    price: Decimal,
    /// Operator shipping per unit folded into `price` (total-order only).
    shipping_adjustment: Decimal,
}

/// Resolve the reference price and candidate for one tier.
pub fn resolve(
    eligible: &EligibleSet<'_>,
    config: &VendorConfig,
    settings: &EngineSettings,
    qty: MinQty,
) -> ResolvedPrice {
    let general = ranked_quotes(&eligible.competitors, config, settings, qty);
    let sisters = ranked_quotes(&eligible.sisters, config, settings, qty);

    if let Some(sister) = sisters.first() {
        let best_general = general.first().map(|q| q.price);
        let sister_cheapest = best_general.map(|p| sister.price < p).unwrap_or(true);
        if sister_cheapest && !config.floor_compete_with_next {
            return ResolvedPrice::SisterLowest {
                sister: sister.offer.vendor_id,
                sister_price: sister.price,
                competitor_price: best_general,
            };
        }
    }

    if general.is_empty() {
        return ResolvedPrice::NoCompetitor;
    }

    let ordered = reference_order(general, config.strategy);
    let mut chosen = 0;
    if config.floor_compete_with_next {
        chosen = ordered
            .iter()
            .position(|q| {
                q.price
                    .checked_sub(settings.fixed_offset)
                    .is_some_and(|p| p.round_to_cent() >= config.floor_price)
            })
            .unwrap_or(0);
    }

    let quote = &ordered[chosen];
    let Some((price, kind)) = candidate_price(
        quote.price,
        quote.shipping_adjustment,
        qty,
        config.floor_price,
        config.effective_percentage_down(),
        settings.fixed_offset,
    ) else {
        return ResolvedPrice::NoCompetitor;
    };

    ResolvedPrice::Candidate(Candidate {
        reference_vendor: quote.offer.vendor_id,
        reference_name: quote.offer.vendor_name.clone(),
        reference_price: quote.price,
        price,
        kind,
        competed_with_next: chosen > 0,
    })
}

/// Compute the candidate from a reference price.
///
/// The offset path subtracts the global fixed offset. On the base tier a
/// configured percentage-down takes precedence when it stays above floor;
/// otherwise the offset price is kept and reported as `FloorOffset`.
/// Returns `None` when the reference is too large to price against.
pub fn candidate_price(
    reference: Decimal,
    shipping_adjustment: Decimal,
    qty: MinQty,
    floor: Decimal,
    percentage_down: Option<Decimal>,
    fixed_offset: Decimal,
) -> Option<(Decimal, PriceKind)> {
    let offset_candidate = reference.checked_sub(fixed_offset)?;

    match percentage_down {
        Some(percentage) if qty.is_base() => {
            let landed = reference.checked_add(shipping_adjustment)?;
            let discounted = subtract_percentage(landed, percentage).checked_sub(shipping_adjustment)?;
            if discounted > floor {
                Some((discounted, PriceKind::Percentage))
            } else {
                Some((offset_candidate, PriceKind::FloorOffset))
            }
        }
        _ => Some((offset_candidate, PriceKind::Offset)),
    }
}

/// A quote the candidate arithmetic can handle without leaving the decimal range.
fn priceable(quote: &Quote<'_>, settings: &EngineSettings) -> bool {
    let ok = quote.price.checked_sub(settings.fixed_offset).is_some()
        && quote.price.checked_add(quote.shipping_adjustment).is_some();
    if !ok {
        debug!(
            "Dropping vendor {}: price {} out of range",
            quote.offer.vendor_id, quote.price
        );
    }
    ok
}

/// Subtract a fractional percentage and floor to the cent.
///
/// Computed in binary floating point to stay identical to the legacy
/// engine, so `10 - 3%` is `9.69`, not `9.70`.
pub fn subtract_percentage(value: Decimal, percentage: Decimal) -> Decimal {
    let v = value.to_f64();
    let p = percentage.to_f64();
    let cents = ((v - v * p) * 100.0).floor();
    if !cents.is_finite() {
        return value;
    }
    Decimal::from_cents(cents as i64)
}

fn ranked_quotes<'a>(
    offers: &[&'a VendorOffer],
    config: &VendorConfig,
    settings: &EngineSettings,
    qty: MinQty,
) -> Vec<Quote<'a>> {
    let mut quotes: Vec<Quote<'a>> = offers
        .iter()
        .filter_map(|offer| quote(offer, config, qty))
        .filter(|q| priceable(q, settings))
        .collect();
    quotes.sort_by(|a, b| {
        a.price
            .cmp(&b.price)
            .then_with(|| a.offer.vendor_id.cmp(&b.offer.vendor_id))
    });
    quotes
}

/// Buy-box strategy anchors on the current buy-box holder when one is eligible.
fn reference_order(mut quotes: Vec<Quote<'_>>, strategy: PriceStrategy) -> Vec<Quote<'_>> {
    if strategy == PriceStrategy::BuyBox {
        if let Some(pos) = quotes.iter().position(|q| q.offer.buy_box) {
            let holder = quotes.remove(pos);
            quotes.insert(0, holder);
        }
    }
    quotes
}

/// `None` when the offer has no price for `qty`, lacks shipping under the
/// total strategy, or its landed total overflows.
fn quote<'a>(offer: &'a VendorOffer, config: &VendorConfig, qty: MinQty) -> Option<Quote<'a>> {
    let unit = offer.applicable_tier(qty)?.unit_price?;

    match config.strategy {
        PriceStrategy::Unit | PriceStrategy::BuyBox => Some(Quote {
            offer,
            price: unit,
            shipping_adjustment: Decimal::zero(),
        }),
        PriceStrategy::Total => {
            let shipping = offer.standard_shipping?;
            let subtotal = unit.checked_times(qty.get())?;
            let ships_free = offer.free_shipping_threshold.is_some_and(|t| subtotal >= t);
            let total = if ships_free {
                subtotal
            } else {
                subtotal.checked_add(shipping)?
            };

            let own_ships_free = config.free_shipping_threshold.is_some_and(|t| total >= t);
            let own_shipping = if own_ships_free {
                Decimal::zero()
            } else {
                config.standard_shipping
            };

            Some(Quote {
                offer,
                price: total.checked_sub(own_shipping)?.per(qty.get()),
                shipping_adjustment: own_shipping.per(qty.get()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OfferSet, PriceTier};
    use crate::engine::eligibility::select_eligible;

    const OWN: VendorId = VendorId(100);

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn offer(id: i64, price: &str) -> VendorOffer {
        VendorOffer::new(VendorId(id), format!("v{}", id)).with_price(1, d(price))
    }

    fn config(floor: &str) -> VendorConfig {
        VendorConfig::new(OWN, d(floor), d("100"))
    }

    fn resolve_with(offers: Vec<VendorOffer>, cfg: &VendorConfig, qty: u32) -> ResolvedPrice {
        let set: OfferSet = offers.into_iter().collect();
        let eligible = select_eligible(&set, cfg, MinQty(qty));
        resolve(&eligible, cfg, &EngineSettings::default(), MinQty(qty))
    }

    fn expect_candidate(resolved: ResolvedPrice) -> Candidate {
        match resolved {
            ResolvedPrice::Candidate(c) => c,
            other => panic!("expected candidate, got {:?}", other),
        }
    }

    #[test]
    fn test_subtract_percentage_floors_to_cent() {
        assert_eq!(subtract_percentage(d("10"), d("0.03")), d("9.69"));
        assert_eq!(subtract_percentage(d("50"), d("0")), d("50.00"));
        assert_eq!(subtract_percentage(d("100"), d("1.5")), d("-50.00"));
        assert_eq!(subtract_percentage(d("50"), d("0")).to_money_string(), "50.00");
    }

    #[test]
    fn test_offset_candidate() {
        let (price, kind) =
            candidate_price(d("10"), Decimal::zero(), MinQty::BASE, d("5"), None, d("0.01")).unwrap();
        assert_eq!(price, d("9.99"));
        assert_eq!(kind, PriceKind::Offset);
    }

    #[test]
    fn test_percentage_candidate_above_floor() {
        let (price, kind) =
            candidate_price(d("10"), Decimal::zero(), MinQty::BASE, d("5"), Some(d("0.03")), d("0.01")).unwrap();
        assert_eq!(price, d("9.69"));
        assert_eq!(kind, PriceKind::Percentage);
    }

    #[test]
    fn test_percentage_rejected_by_floor_keeps_offset_price() {
        let (price, kind) =
            candidate_price(d("10"), Decimal::zero(), MinQty::BASE, d("9.50"), Some(d("0.10")), d("0.01")).unwrap();
        assert_eq!(price, d("9.99"));
        assert_eq!(kind, PriceKind::FloorOffset);
    }

    #[test]
    fn test_percentage_only_on_base_tier() {
        let (price, kind) =
            candidate_price(d("10"), Decimal::zero(), MinQty(6), d("5"), Some(d("0.03")), d("0.01")).unwrap();
        assert_eq!(price, d("9.99"));
        assert_eq!(kind, PriceKind::Offset);
    }

    #[test]
    fn test_percentage_with_shipping_adjustment() {
        // landed 12.00, 25% off is 9.00, minus 2.00 shipping
        let (price, kind) =
            candidate_price(d("10"), d("2"), MinQty::BASE, d("5"), Some(d("0.25")), d("0.01")).unwrap();
        assert_eq!(price, d("7.00"));
        assert_eq!(kind, PriceKind::Percentage);
    }

    #[test]
    fn test_reference_is_lowest_eligible_price() {
        let cfg = config("1");
        let c = expect_candidate(resolve_with(
            vec![offer(100, "11"), offer(1, "12"), offer(2, "10.50"), offer(3, "10.50")],
            &cfg,
            1,
        ));
        assert_eq!(c.reference_vendor, VendorId(2));
        assert_eq!(c.reference_price, d("10.50"));
        assert_eq!(c.price, d("10.49"));
        assert!(!c.competed_with_next);
    }

    #[test]
    fn test_no_competitor_signal() {
        let cfg = config("1");
        assert_eq!(resolve_with(vec![offer(100, "11")], &cfg, 1), ResolvedPrice::NoCompetitor);
    }

    #[test]
    fn test_competitor_without_quotable_tier_is_ignored() {
        let cfg = config("1");
        let mut broken = VendorOffer::new(VendorId(1), "broken");
        broken.tiers.push(PriceTier {
            min_qty: MinQty::BASE,
            unit_price: None,
            active: true,
            expires_at: None,
        });
        assert_eq!(resolve_with(vec![broken], &cfg, 1), ResolvedPrice::NoCompetitor);
    }

    #[test]
    fn test_sister_lowest_signal() {
        let mut cfg = config("1");
        cfg.sister_vendors = vec![VendorId(7)];
        let resolved = resolve_with(vec![offer(7, "7"), offer(1, "15")], &cfg, 1);
        assert_eq!(
            resolved,
            ResolvedPrice::SisterLowest {
                sister: VendorId(7),
                sister_price: d("7"),
                competitor_price: Some(d("15")),
            }
        );
    }

    #[test]
    fn test_sister_not_cheapest_is_ignored() {
        let mut cfg = config("1");
        cfg.sister_vendors = vec![VendorId(7)];
        let c = expect_candidate(resolve_with(vec![offer(7, "16"), offer(1, "15")], &cfg, 1));
        assert_eq!(c.reference_vendor, VendorId(1));
    }

    #[test]
    fn test_floor_compete_with_next_skips_sister_and_sub_floor_competitors() {
        let mut cfg = config("9");
        cfg.sister_vendors = vec![VendorId(7)];
        cfg.floor_compete_with_next = true;
        let c = expect_candidate(resolve_with(
            vec![offer(7, "7"), offer(1, "8"), offer(2, "12")],
            &cfg,
            1,
        ));
        assert_eq!(c.reference_vendor, VendorId(2));
        assert_eq!(c.price, d("11.99"));
        assert!(c.competed_with_next);
    }

    #[test]
    fn test_floor_compete_with_next_falls_back_to_cheapest() {
        let mut cfg = config("20");
        cfg.floor_compete_with_next = true;
        let c = expect_candidate(resolve_with(vec![offer(1, "8"), offer(2, "12")], &cfg, 1));
        assert_eq!(c.reference_vendor, VendorId(1));
        assert!(!c.competed_with_next);
    }

    #[test]
    fn test_total_strategy_includes_shipping() {
        let mut cfg = config("1");
        cfg.strategy = PriceStrategy::Total;
        cfg.standard_shipping = d("2");
        let mut competitor = offer(1, "10");
        competitor.standard_shipping = Some(d("5"));
        let c = expect_candidate(resolve_with(vec![competitor], &cfg, 1));
        // 10 + 5 shipping, less our 2 shipping
        assert_eq!(c.reference_price, d("13"));
        assert_eq!(c.price, d("12.99"));
    }

    #[test]
    fn test_total_strategy_respects_free_shipping_thresholds() {
        let mut cfg = config("1");
        cfg.strategy = PriceStrategy::Total;
        cfg.standard_shipping = d("2");
        cfg.free_shipping_threshold = Some(d("30"));
        let mut competitor = VendorOffer::new(VendorId(1), "v1").with_price(4, d("10"));
        competitor.standard_shipping = Some(d("5"));
        competitor.free_shipping_threshold = Some(d("35"));
        let c = expect_candidate(resolve_with(vec![competitor], &cfg, 4));
        // 40 ships free for them; 40 also clears our threshold
        assert_eq!(c.reference_price, d("10"));
    }

    #[test]
    fn test_total_strategy_skips_unknown_shipping() {
        let mut cfg = config("1");
        cfg.strategy = PriceStrategy::Total;
        let mut competitor = offer(1, "10");
        competitor.standard_shipping = None;
        assert_eq!(resolve_with(vec![competitor], &cfg, 1), ResolvedPrice::NoCompetitor);
    }

    #[test]
    fn test_buy_box_strategy_anchors_on_holder() {
        let mut cfg = config("1");
        cfg.strategy = PriceStrategy::BuyBox;
        let mut holder = offer(2, "11");
        holder.buy_box = true;
        let c = expect_candidate(resolve_with(vec![offer(1, "10"), holder], &cfg, 1));
        assert_eq!(c.reference_vendor, VendorId(2));
        assert_eq!(c.price, d("10.99"));

        let c = expect_candidate(resolve_with(vec![offer(1, "10"), offer(2, "11")], &cfg, 1));
        assert_eq!(c.reference_vendor, VendorId(1));
    }

    #[test]
    fn test_quantity_tier_uses_applicable_break() {
        let cfg = config("1");
        let competitor = offer(1, "10").with_price(6, d("9"));
        let c = expect_candidate(resolve_with(vec![competitor.clone()], &cfg, 6));
        assert_eq!(c.reference_price, d("9"));
        let c = expect_candidate(resolve_with(vec![competitor], &cfg, 5));
        assert_eq!(c.reference_price, d("10"));
    }
}
