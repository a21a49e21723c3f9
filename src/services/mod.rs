//! Business logic services layer

pub mod audit_service;
pub mod changeset;
pub mod client_service;
pub mod invoice_service;
pub mod project_service;
pub mod time_entry_service;

pub use audit_service::AuditService;
pub use changeset::{ChangeOutcome, DeleteOutcome};
pub use client_service::ClientService;
pub use invoice_service::InvoiceService;
pub use project_service::ProjectService;
pub use time_entry_service::TimeEntryService;
