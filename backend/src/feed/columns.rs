//! Column role resolution for the inventory and roster feeds

/// Header names accepted for each role, checked in order
pub const ITEM_HEADERS: &[&str] = &["item", "お弁当"];
pub const EXPIRY_HEADERS: &[&str] = &["expiry", "賞味期限"];
pub const QUANTITY_HEADERS: &[&str] = &["quantity", "在庫数"];
pub const THRESHOLD_HEADERS: &[&str] = &["refillThreshold", "refill_threshold", "補填ライン"];
pub const ALERT_HEADERS: &[&str] = &["alertNote", "alert_note", "アラート"];
pub const NAME_HEADERS: &[&str] = &["name", "名前"];

/// Fixed index mapping for one load of the inventory feed.
///
/// Named headers win; otherwise item is the first column, expiry the second
/// (the first when there is only one) and quantity the last. Threshold and
/// alert note have no positional fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub item: usize,
    pub expiry: usize,
    pub quantity: usize,
    pub refill_threshold: Option<usize>,
    pub alert_note: Option<usize>,
}

impl ColumnMap {
    /// Returns `None` for a table without columns
    pub fn resolve(headers: &[String]) -> Option<Self> {
        if headers.is_empty() {
            return None;
        }
        let last = headers.len() - 1;

        Some(Self {
            item: find_column(headers, ITEM_HEADERS).unwrap_or(0),
            expiry: find_column(headers, EXPIRY_HEADERS).unwrap_or(if headers.len() > 1 { 1 } else { 0 }),
            quantity: find_column(headers, QUANTITY_HEADERS).unwrap_or(last),
            refill_threshold: find_column(headers, THRESHOLD_HEADERS),
            alert_note: find_column(headers, ALERT_HEADERS),
        })
    }
}

/// Index of the first header matching any alias (trimmed, ASCII case-insensitive)
pub fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}

/// Numeric-then-truncate parse; anything unparseable is 0
pub fn parse_lenient_int(raw: &str) -> i64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0;
    }
    if let Ok(n) = s.parse::<i64>() {
        return n;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_named_columns_any_order() {
        let map = ColumnMap::resolve(&headers(&["在庫数", "アラート", "賞味期限", "補填ライン", "お弁当"])).unwrap();
        assert_eq!(map.item, 4);
        assert_eq!(map.expiry, 2);
        assert_eq!(map.quantity, 0);
        assert_eq!(map.refill_threshold, Some(3));
        assert_eq!(map.alert_note, Some(1));
    }

    #[test]
    fn test_resolve_english_headers() {
        let map = ColumnMap::resolve(&headers(&["Item", "Expiry", "Quantity", "refillThreshold"])).unwrap();
        assert_eq!((map.item, map.expiry, map.quantity), (0, 1, 2));
        assert_eq!(map.refill_threshold, Some(3));
        assert_eq!(map.alert_note, None);
    }

    #[test]
    fn test_resolve_positional_fallback() {
        let map = ColumnMap::resolve(&headers(&["品名", "期限", "メモ", "数"])).unwrap();
        assert_eq!(map.item, 0);
        assert_eq!(map.expiry, 1);
        assert_eq!(map.quantity, 3);
        assert_eq!(map.refill_threshold, None);
    }

    #[test]
    fn test_resolve_single_column() {
        let map = ColumnMap::resolve(&headers(&["品名"])).unwrap();
        assert_eq!((map.item, map.expiry, map.quantity), (0, 0, 0));
        assert!(ColumnMap::resolve(&[]).is_none());
    }

    #[test]
    fn test_parse_lenient_int() {
        assert_eq!(parse_lenient_int("5"), 5);
        assert_eq!(parse_lenient_int(" 5.9 "), 5);
        assert_eq!(parse_lenient_int("-2.5"), -2);
        assert_eq!(parse_lenient_int(""), 0);
        assert_eq!(parse_lenient_int("nan"), 0);
        assert_eq!(parse_lenient_int("inf"), 0);
        assert_eq!(parse_lenient_int("abc"), 0);
        assert_eq!(parse_lenient_int("1e2"), 100);
    }
}
