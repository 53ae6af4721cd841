// ABOUTME: Client teardown across the deliverable store and the external identity provider
// ABOUTME: Atomic data cascade followed by an idempotent, retryable identity removal

pub mod identity;
pub mod orchestrator;

pub use identity::{
    HttpIdentityProvider, IdentityDeletion, IdentityError, IdentityProvider, IdentityResult,
    UnconfiguredIdentityProvider,
};
pub use orchestrator::{
    BulkTeardownReport, ClientTeardownOutcome, IdentityCleanup, OrphanRetryReport,
    TeardownError, TeardownOrchestrator, TeardownReport, TeardownResult,
};
