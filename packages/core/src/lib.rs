// ABOUTME: Core types, validation, and utilities for Engage
// ABOUTME: Foundational package shared by storage, workflow, progress, and teardown packages

pub mod constants;
pub mod outcome;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{
    Client, ClientCreateInput, ClientStatus, Delivery, DeliveryCreateInput, DeliveryStatus,
    DeliveryVersion, FulfillRevisionInput, Milestone, PaymentStatus, RevisionReason,
    RevisionRequest, RevisionRequestInput, RevisionStatus, VersioningScope,
};

// Re-export warning and outcome types
pub use outcome::{Dependency, DependencyFailure, Outcome};

// Re-export constants
pub use constants::{database_file, engage_dir, progress_cache_dir};

// Re-export utilities
pub use utils::{add_business_days, generate_id};

// Re-export validation
pub use validation::{
    validate_client_input, validate_delivery_input, validate_file_reference,
    validate_fulfillment_input, validate_revision_input, ValidationError,
};
