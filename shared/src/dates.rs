//! Calendar helpers for expiry and month labels

use chrono::{Datelike, Duration, NaiveDate};

/// Strict `YYYY-MM-DD` parse. Anything else is treated as "no date".
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Whole days from `today` until `date` (negative once past)
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// `YYYY-MM` label of the calendar month before `today`
pub fn previous_month(today: NaiveDate) -> String {
    let first = today.with_day(1).unwrap_or(today);
    let prev_last = first - Duration::days(1);
    month_label(prev_last)
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Normalize a raw expiry cell.
///
/// `2026/3/7` becomes `2026-03-07`. Blank and `nan` become empty. Values that
/// look like `YYYY-M-D` but are not real calendar dates are returned with
/// dashes and without padding; anything else passes through trimmed.
pub fn normalize_date(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return String::new();
    }

    let dashed = s.replace('/', "-");
    match split_ymd(&dashed) {
        Some((y, m, d)) => match NaiveDate::from_ymd_opt(y, m, d) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => dashed,
        },
        None => dashed,
    }
}

/// Match `^\d{4}-\d{1,2}-\d{1,2}$`
fn split_ymd(s: &str) -> Option<(i32, u32, u32)> {
    let mut parts = s.split('-');
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits = |p: &str, min: usize, max: usize| {
        (min..=max).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(y, 4, 4) || !digits(m, 1, 2) || !digits(d, 1, 2) {
        return None;
    }

    Some((y.parse().ok()?, m.parse().ok()?, d.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2025-01-10"), Some(date(2025, 1, 10)));
        assert_eq!(parse_iso_date(" 2025-01-10 "), Some(date(2025, 1, 10)));
        assert_eq!(parse_iso_date(""), None);
        assert_eq!(parse_iso_date("2025-02-30"), None);
        assert_eq!(parse_iso_date("tomorrow"), None);
    }

    #[test]
    fn test_days_until() {
        assert_eq!(days_until(date(2025, 1, 10), date(2025, 1, 7)), 3);
        assert_eq!(days_until(date(2025, 1, 6), date(2025, 1, 7)), -1);
    }

    #[test]
    fn test_previous_month_crosses_year() {
        assert_eq!(previous_month(date(2025, 1, 15)), "2024-12");
        assert_eq!(previous_month(date(2025, 3, 1)), "2025-02");
        assert_eq!(previous_month(date(2024, 3, 31)), "2024-02");
    }

    #[test]
    fn test_normalize_pads_slash_dates() {
        assert_eq!(normalize_date("2026/3/7"), "2026-03-07");
        assert_eq!(normalize_date(" 2026-03-07 "), "2026-03-07");
        assert_eq!(normalize_date("2026-12-1"), "2026-12-01");
    }

    #[test]
    fn test_normalize_blank_and_nan() {
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
        assert_eq!(normalize_date("nan"), "");
        assert_eq!(normalize_date("NaN"), "");
    }

    #[test]
    fn test_normalize_invalid_calendar_date_passes_through() {
        assert_eq!(normalize_date("2026/2/30"), "2026-2-30");
        assert_eq!(normalize_date("2026-13-01"), "2026-13-01");
    }

    #[test]
    fn test_normalize_other_shapes_pass_through() {
        assert_eq!(normalize_date("3/7"), "3-7");
        assert_eq!(normalize_date("2026-03-07T00:00"), "2026-03-07T00:00");
        assert_eq!(normalize_date("26-3-7"), "26-3-7");
        assert_eq!(normalize_date("未定"), "未定");
    }
}
