// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Engage

// Deliverable Store
pub const ENGAGE_DATABASE_PATH: &str = "ENGAGE_DATABASE_PATH";
pub const ENGAGE_DB_MAX_CONNECTIONS: &str = "ENGAGE_DB_MAX_CONNECTIONS";

// Notification Dispatcher
pub const ENGAGE_NOTIFICATION_TIMEOUT_MS: &str = "ENGAGE_NOTIFICATION_TIMEOUT_MS";
pub const ENGAGE_NOTIFICATION_WEBHOOK_URL: &str = "ENGAGE_NOTIFICATION_WEBHOOK_URL";

// Revision workflow
pub const ENGAGE_REVISION_SLA_DAYS: &str = "ENGAGE_REVISION_SLA_DAYS";
pub const ENGAGE_RUSH_REVISION_SLA_DAYS: &str = "ENGAGE_RUSH_REVISION_SLA_DAYS";
pub const ENGAGE_VERSIONING_SCOPE: &str = "ENGAGE_VERSIONING_SCOPE";

// Identity provider / teardown
pub const ENGAGE_IDENTITY_PROVIDER_URL: &str = "ENGAGE_IDENTITY_PROVIDER_URL";
pub const ENGAGE_IDENTITY_PROVIDER_TOKEN: &str = "ENGAGE_IDENTITY_PROVIDER_TOKEN";
pub const ENGAGE_TEARDOWN_CONCURRENCY: &str = "ENGAGE_TEARDOWN_CONCURRENCY";

// Local progress cache
pub const ENGAGE_PROGRESS_CACHE_DIR: &str = "ENGAGE_PROGRESS_CACHE_DIR";

/// Every variable read by `EngageConfig::from_env`
pub const ALL: [&str; 11] = [
    ENGAGE_DATABASE_PATH,
    ENGAGE_DB_MAX_CONNECTIONS,
    ENGAGE_NOTIFICATION_TIMEOUT_MS,
    ENGAGE_NOTIFICATION_WEBHOOK_URL,
    ENGAGE_REVISION_SLA_DAYS,
    ENGAGE_RUSH_REVISION_SLA_DAYS,
    ENGAGE_VERSIONING_SCOPE,
    ENGAGE_IDENTITY_PROVIDER_URL,
    ENGAGE_IDENTITY_PROVIDER_TOKEN,
    ENGAGE_TEARDOWN_CONCURRENCY,
    ENGAGE_PROGRESS_CACHE_DIR,
];
