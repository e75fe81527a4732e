//! Inventory lot models

use serde::{Deserialize, Serialize};

/// Identity of a lot: item name plus normalized expiry.
///
/// An empty expiry means the lot is untracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotKey {
    pub item: String,
    pub expiry: String,
}

impl LotKey {
    pub fn new(item: impl Into<String>, expiry: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            expiry: expiry.into(),
        }
    }
}

impl std::fmt::Display for LotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.expiry.is_empty() {
            write!(f, "{} (untracked)", self.item)
        } else {
            write!(f, "{} ({})", self.item, self.expiry)
        }
    }
}

/// A stock record sourced from the inventory feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub item: String,
    /// ISO date (`YYYY-MM-DD`) after normalization, or empty
    pub expiry: String,
    /// Never negative
    pub quantity: i64,
    pub refill_threshold: i64,
    pub alert_note: String,
}

impl InventoryLot {
    pub fn new(item: impl Into<String>, expiry: impl Into<String>, quantity: i64) -> Self {
        Self {
            item: item.into(),
            expiry: expiry.into(),
            quantity: quantity.max(0),
            refill_threshold: 0,
            alert_note: String::new(),
        }
    }

    pub fn with_threshold(mut self, refill_threshold: i64) -> Self {
        self.refill_threshold = refill_threshold.max(0);
        self
    }

    pub fn key(&self) -> LotKey {
        LotKey::new(self.item.clone(), self.expiry.clone())
    }

    pub fn is_untracked(&self) -> bool {
        self.expiry.is_empty()
    }

    /// Take one unit out of the lot, flooring at zero
    pub fn take_one(&mut self) {
        self.quantity = (self.quantity - 1).max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_key_display() {
        assert_eq!(LotKey::new("唐揚げ", "2025-01-10").to_string(), "唐揚げ (2025-01-10)");
        assert_eq!(LotKey::new("ご飯 大", "").to_string(), "ご飯 大 (untracked)");
    }

    #[test]
    fn test_take_one_floors_at_zero() {
        let mut lot = InventoryLot::new("A", "", 1);
        lot.take_one();
        lot.take_one();
        assert_eq!(lot.quantity, 0);
    }
}
