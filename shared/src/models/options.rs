//! Selection options offered to order intake

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::InventoryLot;

/// Names, side-dish items, rice items and their lots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderOptions {
    pub names: Vec<String>,
    pub okazu_items: Vec<String>,
    pub gohan_items: Vec<String>,
    /// Sorted distinct non-empty expiries per item
    pub item_to_expiry: BTreeMap<String, Vec<String>>,
    /// item -> expiry -> quantity
    pub qty_map: BTreeMap<String, BTreeMap<String, i64>>,
}

impl OrderOptions {
    /// Build options from the current lots. Items whose name starts with
    /// `rice_prefix` are rice; everything else is a side dish.
    pub fn build(names: Vec<String>, lots: &[InventoryLot], rice_prefix: &str) -> Self {
        let mut okazu = BTreeSet::new();
        let mut gohan = BTreeSet::new();
        let mut item_to_expiry: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut qty_map: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();

        for lot in lots {
            if is_rice_item(&lot.item, rice_prefix) {
                gohan.insert(lot.item.clone());
            } else {
                okazu.insert(lot.item.clone());
            }

            let expiries = item_to_expiry.entry(lot.item.clone()).or_default();
            if !lot.expiry.is_empty() {
                expiries.insert(lot.expiry.clone());
            }

            qty_map
                .entry(lot.item.clone())
                .or_default()
                .insert(lot.expiry.clone(), lot.quantity);
        }

        Self {
            names,
            okazu_items: okazu.into_iter().collect(),
            gohan_items: gohan.into_iter().collect(),
            item_to_expiry: item_to_expiry
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            qty_map,
        }
    }
}

pub fn is_rice_item(item: &str, rice_prefix: &str) -> bool {
    !rice_prefix.is_empty() && item.starts_with(rice_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_splits_rice_and_side_dishes() {
        let lots = vec![
            InventoryLot::new("ご飯 普通", "2025-01-05", 4),
            InventoryLot::new("唐揚げ", "2025-01-07", 2),
            InventoryLot::new("唐揚げ", "2025-01-03", 1),
            InventoryLot::new("漬物", "", 8),
        ];
        let opts = OrderOptions::build(vec!["山田".to_string()], &lots, "ご飯");

        assert_eq!(opts.gohan_items, vec!["ご飯 普通"]);
        assert_eq!(opts.okazu_items, vec!["唐揚げ", "漬物"]);
        assert_eq!(opts.item_to_expiry["唐揚げ"], vec!["2025-01-03", "2025-01-07"]);
        assert!(opts.item_to_expiry["漬物"].is_empty());
        assert_eq!(opts.qty_map["漬物"][""], 8);
    }

    #[test]
    fn test_empty_prefix_means_no_rice() {
        assert!(!is_rice_item("ご飯", ""));
    }
}
