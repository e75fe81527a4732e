//! Shared types and models for the Zaiko inventory engine
//!
//! This crate contains the domain model and the pure calculations (alert
//! classification, carryover variance, order validation) used by the backend.

pub mod dates;
pub mod models;
pub mod types;
pub mod validation;

pub use dates::*;
pub use models::*;
pub use types::*;
pub use validation::*;
