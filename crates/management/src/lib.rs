//! Campaign dashboard backend: campaigns, ad groups, ads and analytics.
//!
//! Provides the REST API for the dashboard UI. Relationship rules live in
//! [`Maintainer`]; records are persisted through a `RecordStore` backend.

pub mod handlers;
pub mod maintainer;
pub mod models;
pub mod records;
pub mod router;

pub use handlers::ManagementState;
pub use maintainer::{DuplicatedGroup, Maintainer, ReconcileReport};
pub use router::management_router;
