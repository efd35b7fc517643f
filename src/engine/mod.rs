//! Pure, deterministic repricing engine.
//!
//! One invocation covers one product snapshot. For each operator vendor and
//! quantity tier the stages run in order:
//! eligibility → context price → clamp → categorize, followed by one
//! quantity-break reconciliation per vendor.

use crate::domain::{Decimal, MinQty};
use chrono::Duration;

pub mod categorize;
pub mod clamp;
pub mod context;
pub mod eligibility;
pub mod reconcile;
pub mod repricer;

pub use categorize::{categorize, TierContext};
pub use clamp::{clamp, ClampOutcome, HoldReason, RemoveReason};
pub use context::{candidate_price, resolve, subtract_percentage, Candidate, PriceKind, ResolvedPrice};
pub use eligibility::{select_eligible, EligibilityFilter, EligibleSet, FilterResult};
pub use reconcile::{reconcile, Reconciliation, TierDelta, TierPrice};
pub use repricer::{RepriceOutcome, RepriceRequest, Repricer};

/// Run-wide knobs that are not per-vendor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Amount subtracted from the reference price, e.g. 0.01.
    pub fixed_offset: Decimal,
    /// Promotional tiers expiring within this window are left alone.
    pub short_expiry: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fixed_offset: Decimal::from_cents(1),
            short_expiry: Duration::hours(24),
        }
    }
}

/// Which quantity tiers a pass evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierScope {
    /// Slow-cron passes only touch the single-unit tier.
    BaseOnly,
    All,
}

impl TierScope {
    pub fn for_pass(slow_cron: bool) -> Self {
        if slow_cron {
            TierScope::BaseOnly
        } else {
            TierScope::All
        }
    }

    pub fn includes(&self, qty: MinQty) -> bool {
        match self {
            TierScope::BaseOnly => qty.is_base(),
            TierScope::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_scope_for_pass() {
        assert_eq!(TierScope::for_pass(true), TierScope::BaseOnly);
        assert!(TierScope::BaseOnly.includes(MinQty::BASE));
        assert!(!TierScope::BaseOnly.includes(MinQty(6)));
        assert!(TierScope::for_pass(false).includes(MinQty(6)));
    }

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.fixed_offset, Decimal::from_cents(1));
        assert_eq!(settings.short_expiry, Duration::hours(24));
    }
}
