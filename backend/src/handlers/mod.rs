//! HTTP handlers

pub mod application;
pub mod audit;
pub mod auth;
pub mod certificate;
pub mod farm;
pub mod health;
pub mod invoice;
pub mod notification;
pub mod payment;
pub mod quote;
pub mod traceability;

pub use application::*;
pub use audit::*;
pub use auth::*;
pub use certificate::*;
pub use farm::*;
pub use health::*;
pub use invoice::*;
pub use notification::*;
pub use payment::*;
pub use quote::*;
pub use traceability::*;
