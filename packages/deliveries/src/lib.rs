// ABOUTME: Delivery lifecycle engine for Engage
// ABOUTME: State machine, revision workflow, title versioning, and the staff client directory

pub mod clients;
pub mod error;
pub mod service;
pub mod versioning;

pub use clients::{BulkFailure, BulkStatusReport, ClientDirectory};
pub use error::{DeliveryError, DeliveryResult};
pub use service::DeliveryService;
pub use versioning::{base_title, next_revision_title, REVISION_MARKER};
