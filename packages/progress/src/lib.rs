// ABOUTME: Progress reconciliation for the five-step onboarding pipeline
// ABOUTME: Optimistic local progress is merged with server milestones without ever regressing

pub mod cache;
pub mod service;
pub mod snapshot;

pub use cache::{
    CacheError, CacheResult, FileProgressCache, InMemoryProgressCache, LocalProgressCache,
};
pub use service::{ProgressError, ProgressResult, ProgressService};
pub use snapshot::{MergedProgress, ProgressSnapshot, ProgressStep};
