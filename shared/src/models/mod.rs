//! Domain models for the GACP Certification Back Office

mod application;
mod certificate;
mod farm;
mod invoice;
mod user;

pub use application::*;
pub use certificate::*;
pub use farm::*;
pub use invoice::*;
pub use user::*;
