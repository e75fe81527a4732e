//! Domain models for inventory reconciliation and order settlement

mod alert;
mod carryover;
mod lot;
mod options;
mod order;

pub use alert::*;
pub use carryover::*;
pub use lot::*;
pub use options::*;
pub use order::*;
