//! Entitlement checks: static, in-memory time-boxed grants, and an HTTP service

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use crate::common::errors::{Result, TraderError};
use crate::common::traits::EntitlementCheck;

/// Grants every identity
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl EntitlementCheck for AllowAll {
    async fn is_authorized(&self, _identity: &str) -> Result<bool> {
        Ok(true)
    }
}

/// In-memory grants, each optionally expiring
///
/// Clones share the same grant table, so an administrative task can hold
/// one clone and revoke access while the scheduler holds another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitlements {
    grants: Arc<RwLock<HashMap<String, Option<DateTime<Utc>>>>>,
}

impl InMemoryEntitlements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with permanent grants
    pub fn with_allowed<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grants = identities
            .into_iter()
            .map(|identity| (identity.into(), None))
            .collect();
        Self {
            grants: Arc::new(RwLock::new(grants)),
        }
    }

    /// Grant access until `until`, or permanently when `None`
    pub async fn grant(&self, identity: impl Into<String>, until: Option<DateTime<Utc>>) {
        self.grants.write().await.insert(identity.into(), until);
    }

    /// Remove access; returns whether a grant existed
    pub async fn revoke(&self, identity: &str) -> bool {
        self.grants.write().await.remove(identity).is_some()
    }

    /// Whether `identity` is entitled at `now`
    pub async fn is_authorized_at(&self, identity: &str, now: DateTime<Utc>) -> bool {
        match self.grants.read().await.get(identity) {
            Some(None) => true,
            Some(Some(until)) => now < *until,
            None => false,
        }
    }
}

#[async_trait]
impl EntitlementCheck for InMemoryEntitlements {
    async fn is_authorized(&self, identity: &str) -> Result<bool> {
        Ok(self.is_authorized_at(identity, Utc::now()).await)
    }
}

/// Body returned by the entitlement service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementResponse {
    pub authorized: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Entitlement service reached over HTTP: `GET {base}/entitlements/{identity}`
#[derive(Debug, Clone)]
pub struct HttpEntitlementChecker {
    client: Client,
    base_url: Url,
}

impl HttpEntitlementChecker {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            TraderError::Configuration(format!("invalid entitlement url: {}", e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TraderError::Configuration(format!(
                "entitlement url cannot carry a path: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::Configuration(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// `{base}/entitlements/{identity}` with the identity as one encoded segment
    pub fn entitlement_url(&self, identity: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TraderError::Configuration("entitlement url cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .push("entitlements")
            .push(identity);
        Ok(url)
    }
}

#[async_trait]
impl EntitlementCheck for HttpEntitlementChecker {
    #[instrument(skip(self))]
    async fn is_authorized(&self, identity: &str) -> Result<bool> {
        let url = self.entitlement_url(identity)?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("No entitlement on record");
                Ok(false)
            }
            status if status.is_success() => {
                let body: EntitlementResponse = response.json().await?;
                let live = body.expires_at.map_or(true, |until| Utc::now() < until);
                Ok(body.authorized && live)
            }
            status => Err(TraderError::Entitlement(format!(
                "entitlement service returned {}",
                status
            ))),
        }
    }
}
