//! Order models (provisional submission, then batch confirmation)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dates::normalize_date;
use crate::validation::validate_order_refs;

/// A customer order for one side dish and/or one rice portion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub okazu: String,
    pub okazu_expiry: String,
    pub gohan: String,
    pub gohan_expiry: String,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    /// Set only on confirmation
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    Confirmed,
    Cancelled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Confirmed => "confirmed",
            OrderState::Cancelled => "cancelled",
        }
    }

    /// Pending is the only non-terminal state
    pub fn can_transition_to(&self, next: OrderState) -> bool {
        matches!(
            (self, next),
            (OrderState::Pending, OrderState::Confirmed) | (OrderState::Pending, OrderState::Cancelled)
        )
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderState::Pending),
            "confirmed" => Ok(OrderState::Confirmed),
            "cancelled" => Ok(OrderState::Cancelled),
            other => Err(format!("unknown order state: {}", other)),
        }
    }
}

/// Input for submitting an order
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_order_refs", skip_on_field_errors = false))]
pub struct CreateOrderInput {
    #[validate(length(min = 1, message = "name required"))]
    pub name: String,
    #[serde(default)]
    pub okazu: String,
    #[serde(default)]
    pub okazu_expiry: String,
    #[serde(default)]
    pub gohan: String,
    #[serde(default)]
    pub gohan_expiry: String,
}

impl CreateOrderInput {
    /// Trim names and items and normalize expiries the way feed cells are,
    /// so `2025/1/10` matches the lot keyed `2025-01-10`
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            okazu: self.okazu.trim().to_string(),
            okazu_expiry: normalize_date(&self.okazu_expiry),
            gohan: self.gohan.trim().to_string(),
            gohan_expiry: normalize_date(&self.gohan_expiry),
        }
    }
}

/// Result of a batch confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfirmOutcome {
    pub confirmed: u64,
}

/// Filter for confirmed order history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub name: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Number of confirmed orders for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub label: String,
    pub count: i64,
}

/// Consumption ranking split by side dish and rice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ranking {
    pub okazu: Vec<RankingEntry>,
    pub gohan: Vec<RankingEntry>,
}
