//! Engine output: one pricing decision per (operator vendor, quantity tier).

use crate::domain::{Decimal, MinQty, ProductId, VendorId};
use serde::{Deserialize, Serialize};

/// Fixed decision taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    ChangeUp,
    ChangeDown,
    ChangeNew,
    ChangeRemoved,
    IgnoreFloor,
    IgnoreLowest,
    IgnoreSisterLowest,
    IgnoreSettings,
    IgnoreShortExpiry,
    Error,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::ChangeUp,
        Category::ChangeDown,
        Category::ChangeNew,
        Category::ChangeRemoved,
        Category::IgnoreFloor,
        Category::IgnoreLowest,
        Category::IgnoreSisterLowest,
        Category::IgnoreSettings,
        Category::IgnoreShortExpiry,
        Category::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ChangeUp => "CHANGE_UP",
            Category::ChangeDown => "CHANGE_DOWN",
            Category::ChangeNew => "CHANGE_NEW",
            Category::ChangeRemoved => "CHANGE_REMOVED",
            Category::IgnoreFloor => "IGNORE_FLOOR",
            Category::IgnoreLowest => "IGNORE_LOWEST",
            Category::IgnoreSisterLowest => "IGNORE_SISTER_LOWEST",
            Category::IgnoreSettings => "IGNORE_SETTINGS",
            Category::IgnoreShortExpiry => "IGNORE_SHORT_EXPIRY",
            Category::Error => "ERROR",
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Category::ChangeUp | Category::ChangeDown | Category::ChangeNew | Category::ChangeRemoved
        )
    }

    pub fn is_ignore(&self) -> bool {
        !self.is_change() && *self != Category::Error
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine tags embedded in explanation strings.
pub mod tags {
    pub const HIT_FLOOR: &str = "#HitFloor";
    pub const HIT_MAX: &str = "#HitMax";
    pub const SISTER: &str = "#Sister";
    pub const NO_COMPETITORS: &str = "#NoCompetitors";
    pub const ALREADY_MAXED: &str = "#AlreadyMaxed";
    pub const OFFSET: &str = "#Offset";
    pub const PERCENTAGE: &str = "#Percentage";
    pub const FLOOR_OFFSET: &str = "#FloorOffset";
    pub const COMPETE_WITH_NEXT: &str = "#CompeteWithNext";
    pub const DIRECTION: &str = "#Direction";
    pub const DISABLED: &str = "#Disabled";
    pub const LOW_OWN_INVENTORY: &str = "#LowOwnInventory";
    pub const SHORT_EXPIRY: &str = "#ShortExpiry";
    pub const NO_REFERENCE: &str = "#NoReference";
    pub const NOT_CHEAPER_THAN_BASE: &str = "#NotCheaperThanBase";
    pub const NOT_EVALUATED: &str = "#NotEvaluated";
    pub const NEW_TIER: &str = "#NewTier";
    pub const INVALID_CONFIG: &str = "#InvalidConfig";
    pub const BAD_PRICE: &str = "#BadPrice";
    pub const LOWEST: &str = "#Lowest";
}

/// A pricing decision for one quantity tier of one operator vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub min_qty: MinQty,
    pub existing_price: Option<Decimal>,
    /// `None` means no price is proposed.
    pub suggested_price: Option<Decimal>,
    pub should_apply: bool,
    pub category: Category,
    pub tags: Vec<String>,
    pub explanation: String,
}

impl Decision {
    /// Build a decision whose tags are parsed back out of `explanation`.
    pub fn new(
        product_id: ProductId,
        vendor_id: VendorId,
        min_qty: MinQty,
        existing_price: Option<Decimal>,
        suggested_price: Option<Decimal>,
        category: Category,
        explanation: String,
    ) -> Self {
        let tags = extract_tags(&explanation);
        Self {
            product_id,
            vendor_id,
            min_qty,
            existing_price,
            suggested_price,
            should_apply: category.is_change(),
            category,
            tags,
            explanation,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Stable identifier for de-duplicating audit records.
    pub fn decision_key(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.product_id.as_i64().to_le_bytes());
        hasher.update(self.vendor_id.as_i64().to_le_bytes());
        hasher.update(self.min_qty.get().to_le_bytes());
        hasher.update(self.category.as_str());
        match self.suggested_price {
            Some(price) => hasher.update(price.to_money_string()),
            None => hasher.update(b"-"),
        }
        let hash = hasher.finalize();
        format!("dec:{}", hex::encode(&hash[..16]))
    }
}

/// Collect `#Tag` tokens from an explanation, in order, without duplicates.
pub fn extract_tags(explanation: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for token in explanation.split_whitespace() {
        let Some(rest) = token.strip_prefix('#') else {
            continue;
        };
        let name: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if name.is_empty() {
            continue;
        }
        let tag = format!("#{}", name);
        if !found.contains(&tag) {
            found.push(tag);
        }
    }
    found
}
