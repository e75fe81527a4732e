//! Common types used across the engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive created-date range for order queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Modification times of the feeds, in Unix seconds (0 when unavailable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    pub roster_mtime: i64,
    pub inventory_mtime: i64,
}

/// Which lots an expiry export keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryMode {
    /// 0 <= days left <= window
    #[default]
    Near,
    /// days left < 0
    Expired,
}

impl ExpiryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryMode::Near => "near",
            ExpiryMode::Expired => "expired",
        }
    }

    pub fn keeps(&self, days_left: i64, window: i64) -> bool {
        match self {
            ExpiryMode::Near => (0..=window).contains(&days_left),
            ExpiryMode::Expired => days_left < 0,
        }
    }
}

impl std::str::FromStr for ExpiryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "near" => Ok(ExpiryMode::Near),
            "expired" => Ok(ExpiryMode::Expired),
            other => Err(format!("unknown expiry mode: {}", other)),
        }
    }
}
