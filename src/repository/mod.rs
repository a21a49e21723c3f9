//! Database repository layer

pub mod adjustment_repo;
pub mod client_repo;
pub mod invoice_repo;
pub mod project_repo;
pub mod time_entry_repo;

pub use adjustment_repo::*;
pub use client_repo::*;
pub use invoice_repo::*;
pub use project_repo::*;
pub use time_entry_repo::*;
