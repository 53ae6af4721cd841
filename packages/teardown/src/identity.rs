// ABOUTME: Identity provider abstraction used by client teardown
// ABOUTME: Deleting an identity that no longer exists counts as success

use async_trait::async_trait;
use engage_config::TeardownSettings;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityDeletion {
    Deleted,
    /// Already gone; treated as success
    NotFound,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Identity provider returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("No identity provider configured")]
    NotConfigured,

    #[error("{0}")]
    Unavailable(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// External auth system holding client login identities
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn delete_identity(&self, identity_id: &str) -> IdentityResult<IdentityDeletion>;
}

/// Admin REST API: `DELETE {base}/admin/users/{id}` with a bearer token
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Provider from settings, or `None` when no URL is configured
    pub fn from_settings(settings: &TeardownSettings) -> Option<Self> {
        settings
            .identity_provider_url
            .as_ref()
            .map(|url| Self::new(url.clone(), settings.identity_provider_token.clone()))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn delete_identity(&self, identity_id: &str) -> IdentityResult<IdentityDeletion> {
        let url = format!("{}/admin/users/{}", self.base_url, identity_id);

        let mut request = self.client.delete(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        match response.status() {
            status if status.is_success() => Ok(IdentityDeletion::Deleted),
            StatusCode::NOT_FOUND => Ok(IdentityDeletion::NotFound),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(IdentityError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

/// Stand-in when no provider is configured; every deletion fails so the identity is queued
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredIdentityProvider;

#[async_trait]
impl IdentityProvider for UnconfiguredIdentityProvider {
    async fn delete_identity(&self, _identity_id: &str) -> IdentityResult<IdentityDeletion> {
        Err(IdentityError::NotConfigured)
    }
}
