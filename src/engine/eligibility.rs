//! Competitor eligibility filtering.
//!
//! The operator's own offer is split off first and kept as a reference, so
//! no later stage can hide the operator from itself. The remaining offers go
//! through a fixed sequence of filters, each of which only removes.

use crate::domain::{MinQty, OfferSet, VendorConfig, VendorOffer};
use tracing::debug;

/// Result of a filter stage, partitioning candidates into kept and removed.
#[derive(Debug)]
pub struct FilterResult<'a> {
    pub kept: Vec<&'a VendorOffer>,
    pub removed: Vec<&'a VendorOffer>,
}

/// A single predicate stage of the eligibility pipeline.
pub trait EligibilityFilter {
    /// Stable name for logging.
    fn name(&self) -> &'static str;

    fn keep(&self, config: &VendorConfig, offer: &VendorOffer) -> bool;

    fn filter<'a>(&self, config: &VendorConfig, candidates: Vec<&'a VendorOffer>) -> FilterResult<'a> {
        let (kept, removed): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|offer| self.keep(config, offer));
        FilterResult { kept, removed }
    }
}

/// Removes vendors on the explicit exclusion list.
pub struct ExcludedVendorFilter;

impl EligibilityFilter for ExcludedVendorFilter {
    fn name(&self) -> &'static str {
        "excluded_vendor"
    }

    fn keep(&self, config: &VendorConfig, offer: &VendorOffer) -> bool {
        !config.is_excluded(offer.vendor_id)
    }
}

/// Removes out-of-stock vendors and those under the inventory threshold.
pub struct StockFilter;

impl EligibilityFilter for StockFilter {
    fn name(&self) -> &'static str {
        "stock"
    }

    fn keep(&self, config: &VendorConfig, offer: &VendorOffer) -> bool {
        if !config.include_inactive_vendors && !offer.in_stock {
            return false;
        }
        match config.competitor_inventory_threshold {
            Some(threshold) => offer.inventory.is_some_and(|inv| inv >= threshold),
            None => true,
        }
    }
}

/// Keeps vendors whose shipping speed falls in the configured band.
pub struct HandlingTimeFilter;

impl EligibilityFilter for HandlingTimeFilter {
    fn name(&self) -> &'static str {
        "handling_time"
    }

    fn keep(&self, config: &VendorConfig, offer: &VendorOffer) -> bool {
        config.handling_time_group.admits(offer.shipping_days)
    }
}

/// Keeps vendors matching the badge policy.
pub struct BadgeFilter;

impl EligibilityFilter for BadgeFilter {
    fn name(&self) -> &'static str {
        "badge"
    }

    fn keep(&self, config: &VendorConfig, offer: &VendorOffer) -> bool {
        config.badge_policy.admits(offer.has_badge())
    }
}

/// Competitors eligible for one quantity tier.
#[derive(Debug, Default)]
pub struct EligibleSet<'a> {
    /// The operator's own listing; never a competitor.
    pub own: Option<&'a VendorOffer>,
    /// General competitor pool.
    pub competitors: Vec<&'a VendorOffer>,
    /// Sister vendors held apart when not competing with all vendors.
    pub sisters: Vec<&'a VendorOffer>,
}

impl EligibleSet<'_> {
    pub fn has_no_competitors(&self) -> bool {
        self.competitors.is_empty() && self.sisters.is_empty()
    }
}

/// Narrow the snapshot to the offers eligible for comparison at `qty`.
pub fn select_eligible<'a>(
    offers: &'a OfferSet,
    config: &VendorConfig,
    qty: MinQty,
) -> EligibleSet<'a> {
    let own_id = config.vendor_id;
    let own = offers.get(own_id);

    let mut pool: Vec<&VendorOffer> = offers.iter().filter(|o| o.vendor_id != own_id).collect();

    pool = run_stage(&ExcludedVendorFilter, config, pool, qty);

    let mut sisters = Vec::new();
    if !config.compete_with_all_vendors {
        let (sister_pool, general): (Vec<_>, Vec<_>) =
            pool.into_iter().partition(|o| config.is_sister(o.vendor_id));
        sisters = sister_pool;
        pool = general;
    }

    let post_sister: [&dyn EligibilityFilter; 3] = [&StockFilter, &HandlingTimeFilter, &BadgeFilter];
    for stage in post_sister {
        pool = run_stage(stage, config, pool, qty);
        sisters = run_stage(stage, config, sisters, qty);
        if let Some(own) = own {
            if !stage.keep(config, own) {
                debug!(
                    "Own offer {} fails {} filter at qty {}; kept as reference",
                    own.vendor_id,
                    stage.name(),
                    qty
                );
            }
        }
    }

    EligibleSet {
        own,
        competitors: pool,
        sisters,
    }
}

fn run_stage<'a>(
    stage: &dyn EligibilityFilter,
    config: &VendorConfig,
    candidates: Vec<&'a VendorOffer>,
    qty: MinQty,
) -> Vec<&'a VendorOffer> {
    if candidates.is_empty() {
        return candidates;
    }
    let FilterResult { kept, removed } = stage.filter(config, candidates);
    for offer in &removed {
        debug!(
            "{} filter removed vendor {} at qty {}",
            stage.name(),
            offer.vendor_id,
            qty
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BadgePolicy, Decimal, HandlingTimeGroup, VendorId};

    const OWN: VendorId = VendorId(100);

    fn offer(id: i64) -> VendorOffer {
        VendorOffer::new(VendorId(id), format!("v{}", id)).with_price(1, Decimal::from_cents(1000))
    }

    fn config() -> VendorConfig {
        VendorConfig::new(OWN, Decimal::from_cents(100), Decimal::from_cents(5000))
    }

    fn ids(offers: &[&VendorOffer]) -> Vec<i64> {
        offers.iter().map(|o| o.vendor_id.as_i64()).collect()
    }

    #[test]
    fn test_own_offer_is_never_a_competitor() {
        let offers: OfferSet = vec![offer(100), offer(1), offer(2)].into_iter().collect();
        let set = select_eligible(&offers, &config(), MinQty::BASE);
        assert_eq!(set.own.unwrap().vendor_id, OWN);
        assert_eq!(ids(&set.competitors), vec![1, 2]);
    }

    #[test]
    fn test_excluded_vendors_removed_even_when_sister() {
        let offers: OfferSet = vec![offer(1), offer(2), offer(3)].into_iter().collect();
        let mut cfg = config();
        cfg.excluded_vendors = vec![VendorId(2)];
        cfg.sister_vendors = vec![VendorId(2), VendorId(3)];
        let set = select_eligible(&offers, &cfg, MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![1]);
        assert_eq!(ids(&set.sisters), vec![3]);
    }

    #[test]
    fn test_sisters_are_ordinary_competitors_when_competing_with_all() {
        let offers: OfferSet = vec![offer(1), offer(3)].into_iter().collect();
        let mut cfg = config();
        cfg.sister_vendors = vec![VendorId(3)];
        cfg.compete_with_all_vendors = true;
        let set = select_eligible(&offers, &cfg, MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![1, 3]);
        assert!(set.sisters.is_empty());
    }

    #[test]
    fn test_stock_and_inventory_threshold() {
        let mut out_of_stock = offer(1);
        out_of_stock.in_stock = false;
        let mut low = offer(2);
        low.inventory = Some(2);
        let mut unknown = offer(3);
        unknown.inventory = None;
        let mut plenty = offer(4);
        plenty.inventory = Some(10);
        let offers: OfferSet = vec![out_of_stock, low, unknown, plenty].into_iter().collect();

        let set = select_eligible(&offers, &config(), MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![2, 3, 4]);

        let mut cfg = config();
        cfg.competitor_inventory_threshold = Some(5);
        let set = select_eligible(&offers, &cfg, MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![4]);

        let mut cfg = config();
        cfg.include_inactive_vendors = true;
        let set = select_eligible(&offers, &cfg, MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_handling_time_filter_keeps_own_reference() {
        let mut fast = offer(1);
        fast.shipping_days = Some(1);
        let mut slow = offer(2);
        slow.shipping_days = Some(7);
        let mut own = offer(100);
        own.shipping_days = Some(9);
        let offers: OfferSet = vec![fast, slow, own].into_iter().collect();

        let mut cfg = config();
        cfg.handling_time_group = HandlingTimeGroup::FastShipping;
        let set = select_eligible(&offers, &cfg, MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![1]);
        assert_eq!(set.own.unwrap().vendor_id, OWN);
    }

    #[test]
    fn test_badge_filter_applies_to_sisters_too() {
        let mut badged = offer(1);
        badged.badge_id = Some(4);
        let plain = offer(2);
        let plain_sister = offer(3);
        let offers: OfferSet = vec![badged, plain, plain_sister, offer(100)].into_iter().collect();

        let mut cfg = config();
        cfg.badge_policy = BadgePolicy::BadgeOnly;
        cfg.sister_vendors = vec![VendorId(3)];
        let set = select_eligible(&offers, &cfg, MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![1]);
        assert!(set.sisters.is_empty());
        assert!(set.own.is_some());

        cfg.badge_policy = BadgePolicy::NonBadgeOnly;
        let set = select_eligible(&offers, &cfg, MinQty::BASE);
        assert_eq!(ids(&set.competitors), vec![2]);
        assert_eq!(ids(&set.sisters), vec![3]);
    }

    #[test]
    fn test_empty_result_is_valid() {
        let offers: OfferSet = vec![offer(100)].into_iter().collect();
        let set = select_eligible(&offers, &config(), MinQty::BASE);
        assert!(set.has_no_competitors());
    }
}
