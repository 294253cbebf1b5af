//! Shared types and models for the GACP Certification Back Office
//!
//! This crate contains types shared between the backend and other components
//! of the system: domain models, the application workflow state machine, and
//! Thailand-specific validation helpers.

pub mod models;
pub mod signing;
pub mod types;
pub mod validation;
pub mod workflow;

pub use models::*;
pub use signing::*;
pub use types::*;
pub use validation::*;
pub use workflow::*;
