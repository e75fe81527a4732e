//! Zaiko - inventory feed reconciliation and order settlement
//!
//! Keeps a lot store in sync with an externally edited inventory feed,
//! settles pending orders against it in one atomic batch, and derives stock
//! alerts, purchase candidates and month-end carryover reports.

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod feed;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{
    AlertService, CarryoverService, InventoryService, OrderService, ReportingService,
    SettlementService, SyncService,
};

/// Application state shared by every command
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.db.clone(), self.config.feeds.inventory_candidates.clone())
    }

    pub fn settlement(&self) -> SettlementService {
        SettlementService::new(self.db.clone(), self.inventory())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(
            self.db.clone(),
            self.inventory(),
            self.config.feeds.roster_candidates.clone(),
            self.config.orders.rice_prefix.clone(),
        )
    }

    pub fn alerts(&self) -> AlertService {
        AlertService::new(self.inventory(), self.config.exports_dir())
    }

    pub fn carryover(&self) -> CarryoverService {
        CarryoverService::new(self.db.clone(), self.inventory())
    }

    pub fn reporting(&self) -> ReportingService {
        ReportingService::new(self.inventory(), self.orders(), self.config.exports_dir())
    }

    pub fn sync(&self) -> SyncService {
        SyncService::new(
            self.config.feeds.roster_candidates.clone(),
            self.config.feeds.inventory_candidates.clone(),
        )
    }
}
