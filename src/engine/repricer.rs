//! Per-product driver: evaluates every operator vendor and tier of a snapshot.

use super::categorize::{categorize, TierContext};
use super::clamp::{clamp, ClampOutcome, RemoveReason};
use super::context::resolve;
use super::eligibility::select_eligible;
use super::reconcile::{reconcile, Reconciliation};
use super::{EngineSettings, TierScope};
use crate::domain::{
    tags, Category, Decision, MinQty, OfferSet, ProductId, VendorConfig, VendorId, VendorOffer,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// One consistent snapshot of a product and the operator's policies.
#[derive(Debug, Clone)]
pub struct RepriceRequest {
    pub product_id: ProductId,
    pub offers: OfferSet,
    /// Operator vendors in a non-error state, in output order.
    pub active_vendors: Vec<VendorId>,
    pub configs: Vec<VendorConfig>,
    pub slow_cron: bool,
    /// Only used when rendering explanations.
    pub context_url: String,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepriceOutcome {
    pub product_id: ProductId,
    pub decisions: Vec<Decision>,
    pub reconciliations: Vec<Reconciliation>,
}

impl RepriceOutcome {
    pub fn changes(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| d.should_apply)
    }
}

/// The repricing engine. Stateless apart from run-wide settings.
#[derive(Debug, Clone, Default)]
pub struct Repricer {
    settings: EngineSettings,
}

impl Repricer {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn reprice(&self, req: &RepriceRequest) -> RepriceOutcome {
        let scope = TierScope::for_pass(req.slow_cron);
        let mut decisions = Vec::new();
        let mut reconciliations = Vec::new();
        let mut seen = BTreeSet::new();

        for &vendor_id in &req.active_vendors {
            if !seen.insert(vendor_id) {
                continue;
            }
            let Some(config) = req.configs.iter().find(|c| c.vendor_id == vendor_id) else {
                warn!(
                    "No vendor config for vendor {} on product {}; skipping",
                    vendor_id, req.product_id
                );
                continue;
            };
            let Some(own) = req.offers.get(vendor_id) else {
                debug!("Vendor {} has no listing on product {}", vendor_id, req.product_id);
                continue;
            };

            let mut vendor_decisions = self.evaluate_vendor(req, config, own, scope);
            let reconciliation = reconcile(
                &own.tiers,
                &vendor_decisions,
                scope,
                req.product_id,
                vendor_id,
                &req.context_url,
            );
            vendor_decisions.extend(reconciliation.synthesized.iter().cloned());
            vendor_decisions.sort_by_key(|d| d.min_qty);

            decisions.extend(vendor_decisions);
            reconciliations.push(reconciliation);
        }

        let changes = decisions.iter().filter(|d| d.should_apply).count();
        info!(
            "Repriced product {}: {} decisions, {} changes across {} vendors",
            req.product_id,
            decisions.len(),
            changes,
            reconciliations.len()
        );

        RepriceOutcome {
            product_id: req.product_id,
            decisions,
            reconciliations,
        }
    }

    fn evaluate_vendor(
        &self,
        req: &RepriceRequest,
        config: &VendorConfig,
        own: &VendorOffer,
        scope: TierScope,
    ) -> Vec<Decision> {
        let mut decisions = Vec::new();
        let mut base_price = own
            .tier(MinQty::BASE)
            .filter(|t| t.active)
            .and_then(|t| t.unit_price);

        for qty in tier_quantities(&req.offers, config, own, scope) {
            let own_tier = own.tier(qty);
            let listed = own_tier.is_some_and(|t| t.active);
            let existing = own_tier.filter(|t| t.active).and_then(|t| t.unit_price);
            let ctx = TierContext {
                product_id: req.product_id,
                vendor_id: config.vendor_id,
                min_qty: qty,
                existing,
                listed,
                context_url: &req.context_url,
            };

            if let Some(decision) = self.precheck(&ctx, config, own, req.evaluated_at) {
                decisions.push(decision);
                continue;
            }
            let gated =
                !config.enabled || !config.is_consistent() || low_own_inventory(config, own).is_some();
            if !listed && gated {
                continue;
            }

            let eligible = select_eligible(&req.offers, config, qty);
            let resolved = resolve(&eligible, config, &self.settings, qty);
            let mut outcome = clamp(&resolved, existing, qty, config);

            if !qty.is_base() {
                if let (Some(price), Some(base)) = (outcome.suggested_price(), base_price) {
                    if price >= base {
                        outcome = ClampOutcome::Remove(RemoveReason::NotCheaperThanBase);
                    }
                }
            }

            debug!(
                "Vendor {} qty {}: {:?} -> {:?}",
                config.vendor_id, qty, resolved, outcome
            );

            if let Some(decision) = categorize(&ctx, &resolved, &outcome, config) {
                if qty.is_base() {
                    if let Some(price) = decision.suggested_price {
                        base_price = Some(price);
                    }
                }
                decisions.push(decision);
            }
        }

        decisions
    }

    /// Checks that stop a listed tier from being priced at all.
    fn precheck(
        &self,
        ctx: &TierContext<'_>,
        config: &VendorConfig,
        own: &VendorOffer,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        if !ctx.listed {
            return None;
        }

        if !config.is_consistent() {
            return Some(ctx.decision(
                Category::Error,
                None,
                &format!(
                    "floor {} exceeds max {}",
                    config.floor_price.to_money_string(),
                    config.max_price.to_money_string()
                ),
                &[tags::INVALID_CONFIG],
            ));
        }

        if !config.enabled {
            return Some(ctx.decision(
                Category::IgnoreSettings,
                None,
                "repricing disabled for vendor",
                &[tags::DISABLED],
            ));
        }

        if ctx.existing.is_none() {
            return Some(ctx.decision(
                Category::Error,
                None,
                "listed tier has no usable unit price",
                &[tags::BAD_PRICE],
            ));
        }

        if let Some((inventory, threshold)) = low_own_inventory(config, own) {
            return Some(ctx.decision(
                Category::IgnoreSettings,
                None,
                &format!("own inventory {} below threshold {}", inventory, threshold),
                &[tags::LOW_OWN_INVENTORY],
            ));
        }

        let expiry = own
            .tier(ctx.min_qty)
            .and_then(|t| t.expires_at)
            .filter(|expires_at| *expires_at - now <= self.settings.short_expiry);
        if let Some(expires_at) = expiry {
            return Some(ctx.decision(
                Category::IgnoreShortExpiry,
                None,
                &format!("promotional price expires at {}", expires_at.to_rfc3339()),
                &[tags::SHORT_EXPIRY],
            ));
        }

        None
    }
}

/// Own inventory and threshold when known inventory sits below the threshold.
fn low_own_inventory(config: &VendorConfig, own: &VendorOffer) -> Option<(i64, i64)> {
    match (own.inventory, config.own_inventory_threshold) {
        (Some(inventory), Some(threshold)) if inventory < threshold => Some((inventory, threshold)),
        _ => None,
    }
}

/// Tiers evaluated for one vendor: every tier the operator lists (active or
/// not) plus quantities above the base quoted by eligible competitors,
/// restricted to `scope`.
fn tier_quantities(
    offers: &OfferSet,
    config: &VendorConfig,
    own: &VendorOffer,
    scope: TierScope,
) -> Vec<MinQty> {
    let mut qtys: BTreeSet<MinQty> = own.tier_quantities().into_iter().collect();
    let eligible = select_eligible(offers, config, MinQty::BASE);
    for offer in &eligible.competitors {
        qtys.extend(
            offer
                .tiers
                .iter()
                .filter(|t| t.is_quotable() && !t.min_qty.is_base())
                .map(|t| t.min_qty),
        );
    }
    qtys.into_iter().filter(|q| scope.includes(*q)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, PriceDirection, PriceStrategy, PriceTier};
    use chrono::{Duration, TimeZone};

    const OWN: VendorId = VendorId(100);

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn request(offers: Vec<VendorOffer>, config: VendorConfig) -> RepriceRequest {
        RepriceRequest {
            product_id: ProductId(42),
            offers: offers.into_iter().collect(),
            active_vendors: vec![config.vendor_id],
            configs: vec![config],
            slow_cron: false,
            context_url: "https://example.test/mp/42".to_string(),
            evaluated_at: now(),
        }
    }

    fn own(price: &str) -> VendorOffer {
        VendorOffer::new(OWN, "own").with_price(1, d(price))
    }

    fn competitor(id: i64, price: &str) -> VendorOffer {
        VendorOffer::new(VendorId(id), format!("v{}", id)).with_price(1, d(price))
    }

    fn config() -> VendorConfig {
        VendorConfig::new(OWN, d("5"), d("50"))
    }

    fn categories(outcome: &RepriceOutcome) -> Vec<(u32, Category)> {
        outcome.decisions.iter().map(|d| (d.min_qty.get(), d.category)).collect()
    }

    #[test]
    fn test_undercuts_cheapest_competitor() {
        let req = request(vec![own("12"), competitor(1, "10"), competitor(2, "11")], config());
        let outcome = Repricer::default().reprice(&req);
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeDown)]);
        assert_eq!(outcome.decisions[0].suggested_price, Some(d("9.99")));
        assert_eq!(outcome.reconciliations[0].delta.updated.len(), 1);
    }

    #[test]
    fn test_missing_config_skips_vendor() {
        let mut req = request(vec![own("12"), competitor(1, "10")], config());
        req.configs.clear();
        let outcome = Repricer::default().reprice(&req);
        assert!(outcome.decisions.is_empty());
        assert!(outcome.reconciliations.is_empty());
    }

    #[test]
    fn test_invalid_config_errors_every_listed_tier() {
        let mut cfg = config();
        cfg.floor_price = d("60");
        let own = own("12").with_price(6, d("11"));
        let req = request(vec![own, competitor(1, "10")], cfg);
        let outcome = Repricer::default().reprice(&req);
        assert_eq!(categories(&outcome), vec![(1, Category::Error), (6, Category::Error)]);
        assert!(outcome.decisions.iter().all(|d| d.has_tag(tags::INVALID_CONFIG)));
        assert!(outcome.reconciliations[0].delta.is_empty());
    }

    #[test]
    fn test_bad_own_price_is_error_for_that_tier_only() {
        let own = VendorOffer::new(OWN, "own")
            .with_tier(PriceTier {
                min_qty: MinQty::BASE,
                unit_price: None,
                active: true,
                expires_at: None,
            })
            .with_price(6, d("9"));
        let comp = competitor(1, "10").with_price(6, d("8"));
        let outcome = Repricer::default().reprice(&request(vec![own, comp], config()));
        assert_eq!(categories(&outcome), vec![(1, Category::Error), (6, Category::ChangeDown)]);
        assert!(outcome.decisions[0].has_tag(tags::BAD_PRICE));
    }

    #[test]
    fn test_disabled_and_low_inventory() {
        let mut cfg = config();
        cfg.enabled = false;
        let outcome = Repricer::default().reprice(&request(vec![own("12"), competitor(1, "10")], cfg));
        assert_eq!(categories(&outcome), vec![(1, Category::IgnoreSettings)]);
        assert!(outcome.decisions[0].has_tag(tags::DISABLED));

        let mut cfg = config();
        cfg.own_inventory_threshold = Some(5);
        let mut low = own("12");
        low.inventory = Some(2);
        let outcome = Repricer::default().reprice(&request(vec![low, competitor(1, "10")], cfg));
        assert!(outcome.decisions[0].has_tag(tags::LOW_OWN_INVENTORY));
    }

    #[test]
    fn test_short_expiry_tier_left_alone() {
        let promo = VendorOffer::new(OWN, "own")
            .with_tier(PriceTier::new(MinQty::BASE, d("12")).with_expiry(now() + Duration::hours(3)));
        let outcome = Repricer::default().reprice(&request(vec![promo, competitor(1, "10")], config()));
        assert_eq!(categories(&outcome), vec![(1, Category::IgnoreShortExpiry)]);

        let long_promo = VendorOffer::new(OWN, "own")
            .with_tier(PriceTier::new(MinQty::BASE, d("12")).with_expiry(now() + Duration::days(7)));
        let outcome = Repricer::default().reprice(&request(vec![long_promo, competitor(1, "10")], config()));
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeDown)]);
    }

    #[test]
    fn test_competitor_tier_creates_new_tier() {
        let comp = competitor(1, "10").with_price(6, d("8"));
        let outcome = Repricer::default().reprice(&request(vec![own("12"), comp], config()));
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeDown), (6, Category::ChangeNew)]);
        assert_eq!(outcome.decisions[1].suggested_price, Some(d("7.99")));
        assert_eq!(outcome.reconciliations[0].delta.added.len(), 1);
    }

    #[test]
    fn test_upper_tier_not_cheaper_than_base_is_removed() {
        // competitor's 6-pack undercut would land above our new base price
        let own = own("12").with_price(6, d("11"));
        let comp = competitor(1, "10").with_price(6, d("10.50"));
        let outcome = Repricer::default().reprice(&request(vec![own, comp], config()));
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeDown), (6, Category::ChangeRemoved)]);
        assert!(outcome.decisions[1].has_tag(tags::NOT_CHEAPER_THAN_BASE));
        assert_eq!(outcome.reconciliations[0].delta.deactivated, vec![MinQty(6)]);
    }

    #[test]
    fn test_upper_tier_without_reference_is_removed() {
        let own = own("12").with_price(6, d("11"));
        let outcome = Repricer::default().reprice(&request(vec![own], config()));
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeUp), (6, Category::ChangeRemoved)]);
        assert!(outcome.decisions[1].has_tag(tags::NO_REFERENCE));
    }

    #[test]
    fn test_slow_cron_evaluates_base_only() {
        let own = own("12").with_price(6, d("11"));
        let comp = competitor(1, "10").with_price(6, d("8"));
        let mut req = request(vec![own, comp], config());
        req.slow_cron = true;
        let outcome = Repricer::default().reprice(&req);
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeDown)]);
        assert!(outcome.reconciliations[0].synthesized.is_empty());
    }

    #[test]
    fn test_direction_invariant_holds() {
        let mut cfg = config();
        cfg.direction = PriceDirection::Up;
        let outcome = Repricer::default().reprice(&request(vec![own("12"), competitor(1, "10")], cfg));
        assert_eq!(categories(&outcome), vec![(1, Category::IgnoreSettings)]);
        assert!(outcome.changes().next().is_none());
    }

    #[test]
    fn test_low_own_inventory_creates_no_new_tiers() {
        let mut cfg = config();
        cfg.own_inventory_threshold = Some(5);
        let mut low = own("12");
        low.inventory = Some(1);
        let comp = competitor(1, "10").with_price(6, d("8"));
        let outcome = Repricer::default().reprice(&request(vec![low, comp], cfg));
        assert_eq!(categories(&outcome), vec![(1, Category::IgnoreSettings)]);
        assert!(outcome.changes().next().is_none());
        assert!(outcome.reconciliations[0].delta.is_empty());
    }

    #[test]
    fn test_filtered_vendors_do_not_justify_new_tiers() {
        let mut cfg = config();
        cfg.direction = PriceDirection::Up;
        cfg.excluded_vendors = vec![VendorId(9)];
        cfg.sister_vendors = vec![VendorId(300)];

        let excluded = competitor(9, "11").with_price(6, d("3"));
        let mut out_of_stock = competitor(8, "11").with_price(12, d("3"));
        out_of_stock.in_stock = false;
        let sister = competitor(300, "11").with_price(24, d("3"));

        let req = request(
            vec![own("12"), competitor(1, "10"), excluded, out_of_stock, sister],
            cfg,
        );
        let outcome = Repricer::default().reprice(&req);
        assert_eq!(categories(&outcome), vec![(1, Category::IgnoreSettings)]);
        assert!(outcome.reconciliations[0].delta.added.is_empty());
    }

    #[test]
    fn test_out_of_range_competitor_tier_does_not_panic() {
        let mut cfg = config();
        cfg.strategy = PriceStrategy::Total;
        let mut comp = competitor(1, "10").with_price(6, d("79228162514264337593543950335"));
        comp.standard_shipping = Some(d("5"));
        let own = own("20").with_price(6, d("19"));

        let outcome = Repricer::default().reprice(&request(vec![own, comp], cfg));
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeDown), (6, Category::ChangeRemoved)]);
        assert_eq!(outcome.decisions[0].suggested_price, Some(d("14.99")));
        assert!(outcome.decisions[1].has_tag(tags::NO_REFERENCE));
    }

    #[test]
    fn test_no_competitors_raises_to_max() {
        let outcome = Repricer::default().reprice(&request(vec![own("12")], config()));
        assert_eq!(categories(&outcome), vec![(1, Category::ChangeUp)]);
        assert_eq!(outcome.decisions[0].suggested_price, Some(d("50")));
        assert!(outcome.decisions[0].has_tag(tags::HIT_MAX));
    }
}
