//! Business logic services for the GACP Certification Back Office

pub mod application;
pub mod audit;
pub mod auth;
pub mod certificate;
pub mod farm;
pub mod invoice;
pub mod notification;
pub mod payment;
pub mod quote;
pub mod traceability;
pub mod workflow;

pub use application::ApplicationService;
pub use audit::AuditService;
pub use auth::AuthService;
pub use certificate::CertificateService;
pub use farm::FarmService;
pub use invoice::InvoiceService;
pub use notification::NotificationService;
pub use payment::PaymentService;
pub use quote::QuoteService;
pub use traceability::TraceabilityService;
