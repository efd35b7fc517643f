//! Domain primitives: ProductId, VendorId, MinQty.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Marketplace product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl ProductId {
    pub fn new(id: i64) -> Self {
        ProductId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marketplace vendor identifier, shared by competitors and operator vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VendorId(pub i64);

impl VendorId {
    pub fn new(id: i64) -> Self {
        VendorId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VendorId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(VendorId)
    }
}

/// Minimum purchase quantity identifying a price tier.
///
/// Tier identity is always numeric; textual quantities such as `"1"` are
/// parsed once at normalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MinQty(pub u32);

impl MinQty {
    /// The single-unit tier.
    pub const BASE: MinQty = MinQty(1);

    pub fn new(qty: u32) -> Self {
        MinQty(qty)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == 1
    }
}

impl std::fmt::Display for MinQty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
