//! Business logic services for the Zaiko inventory engine

pub mod alerts;
pub mod carryover;
pub mod inventory;
pub mod orders;
pub mod reporting;
pub mod settlement;
pub mod sync;

pub use alerts::AlertService;
pub use carryover::CarryoverService;
pub use inventory::{InventoryService, LotSnapshot, ReloadOutcome};
pub use orders::OrderService;
pub use reporting::ReportingService;
pub use settlement::{LotBook, SettlementService};
pub use sync::SyncService;
