// ABOUTME: Configuration for the Engage workflow engine
// ABOUTME: Reads environment variables into typed settings for each service package

pub mod constants;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use engage_core::VersioningScope;
use thiserror::Error;
use tracing::debug;

use constants::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid number for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be at least {min} (got {value})")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
    },
    #[error("Invalid versioning scope: {0}. Must be one of: global, client")]
    InvalidScope(String),
    #[error("Invalid URL for {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },
}

/// Deliverable Store connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: engage_core::database_file(),
            max_connections: 5,
            busy_timeout_seconds: 30,
        }
    }
}

/// Notification Dispatcher settings
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSettings {
    /// Upper bound on every dispatch
    pub timeout: Duration,
    pub webhook_url: Option<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            webhook_url: None,
        }
    }
}

/// Delivery and revision workflow settings
#[derive(Debug, Clone, PartialEq)]
pub struct DeliverySettings {
    pub revision_sla_business_days: u32,
    pub rush_revision_sla_business_days: u32,
    pub versioning_scope: VersioningScope,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            revision_sla_business_days: 3,
            rush_revision_sla_business_days: 1,
            versioning_scope: VersioningScope::Global,
        }
    }
}

/// Teardown orchestrator settings
#[derive(Debug, Clone, PartialEq)]
pub struct TeardownSettings {
    pub identity_provider_url: Option<String>,
    pub identity_provider_token: Option<String>,
    /// Clients processed in parallel during bulk teardown
    pub concurrency: usize,
    /// Upper bound on each identity provider call
    pub call_timeout: Duration,
}

impl Default for TeardownSettings {
    fn default() -> Self {
        Self {
            identity_provider_url: None,
            identity_provider_token: None,
            concurrency: 4,
            call_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    pub cache_dir: PathBuf,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            cache_dir: engage_core::progress_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngageConfig {
    pub storage: StorageSettings,
    pub notifications: NotificationSettings,
    pub deliveries: DeliverySettings,
    pub teardown: TeardownSettings,
    pub progress: ProgressSettings,
}

impl EngageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = EngageConfig::default();

        let storage = StorageSettings {
            database_path: get(ENGAGE_DATABASE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.database_path),
            max_connections: parse_at_least(
                ENGAGE_DB_MAX_CONNECTIONS,
                get(ENGAGE_DB_MAX_CONNECTIONS),
                defaults.storage.max_connections as u64,
                1,
            )? as u32,
            busy_timeout_seconds: defaults.storage.busy_timeout_seconds,
        };

        let timeout_ms = parse_at_least(
            ENGAGE_NOTIFICATION_TIMEOUT_MS,
            get(ENGAGE_NOTIFICATION_TIMEOUT_MS),
            defaults.notifications.timeout.as_millis() as u64,
            1,
        )?;

        let notifications = NotificationSettings {
            timeout: Duration::from_millis(timeout_ms),
            webhook_url: parse_url(
                ENGAGE_NOTIFICATION_WEBHOOK_URL,
                get(ENGAGE_NOTIFICATION_WEBHOOK_URL),
            )?,
        };

        let versioning_scope = match get(ENGAGE_VERSIONING_SCOPE) {
            Some(value) => value
                .parse::<VersioningScope>()
                .map_err(|_| ConfigError::InvalidScope(value))?,
            None => defaults.deliveries.versioning_scope,
        };

        let deliveries = DeliverySettings {
            revision_sla_business_days: parse_at_least(
                ENGAGE_REVISION_SLA_DAYS,
                get(ENGAGE_REVISION_SLA_DAYS),
                defaults.deliveries.revision_sla_business_days as u64,
                0,
            )? as u32,
            rush_revision_sla_business_days: parse_at_least(
                ENGAGE_RUSH_REVISION_SLA_DAYS,
                get(ENGAGE_RUSH_REVISION_SLA_DAYS),
                defaults.deliveries.rush_revision_sla_business_days as u64,
                0,
            )? as u32,
            versioning_scope,
        };

        let teardown = TeardownSettings {
            identity_provider_url: parse_url(
                ENGAGE_IDENTITY_PROVIDER_URL,
                get(ENGAGE_IDENTITY_PROVIDER_URL),
            )?,
            identity_provider_token: get(ENGAGE_IDENTITY_PROVIDER_TOKEN),
            concurrency: parse_at_least(
                ENGAGE_TEARDOWN_CONCURRENCY,
                get(ENGAGE_TEARDOWN_CONCURRENCY),
                defaults.teardown.concurrency as u64,
                1,
            )? as usize,
            call_timeout: Duration::from_millis(timeout_ms),
        };

        let progress = ProgressSettings {
            cache_dir: get(ENGAGE_PROGRESS_CACHE_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.progress.cache_dir),
        };

        let config = EngageConfig {
            storage,
            notifications,
            deliveries,
            teardown,
            progress,
        };

        debug!("Loaded configuration: {:?}", config.redacted());
        Ok(config)
    }

    /// Copy of the configuration safe to log
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.teardown.identity_provider_token.is_some() {
            copy.teardown.identity_provider_token = Some("***".to_string());
        }
        copy
    }
}

fn parse_at_least(
    key: &'static str,
    value: Option<String>,
    default: u64,
    min: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };

    let parsed = raw
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw })?;

    if parsed < min {
        return Err(ConfigError::OutOfRange {
            key,
            value: parsed,
            min,
        });
    }
    Ok(parsed)
}

fn parse_url(key: &'static str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    match value {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(Some(url.trim_end_matches('/').to_string()))
        }
        Some(url) => Err(ConfigError::InvalidUrl { key, value: url }),
        None => Ok(None),
    }
}
