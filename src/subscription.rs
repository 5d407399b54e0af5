//! Client for the subscription backend: premium status lookup and checkout creation.
//!
//! The store never waits on these calls. Results are folded into a [`PremiumCache`]
//! whenever they arrive, and failures leave the last known status in place.

use crate::config::SubscriptionConfig;
use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub is_premium: bool,
    pub is_allowed: bool,
    pub subscription_status: String,
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        Self {
            is_premium: false,
            is_allowed: false,
            subscription_status: "unknown".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest<'a> {
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    url: String,
}

#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl SubscriptionClient {
    pub fn new(config: &SubscriptionConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_seconds),
            client: reqwest::Client::new(),
        }
    }

    pub fn status_url(&self, user_id: &str) -> String {
        format!(
            "{}/api/subscription-status?userId={}",
            self.base_url,
            urlencoding::encode(user_id)
        )
    }

    pub fn checkout_url(&self) -> String {
        format!("{}/api/create-checkout", self.base_url)
    }

    pub async fn fetch_status(&self, user_id: &str) -> Result<SubscriptionStatus> {
        let url = self.status_url(user_id);
        debug!("fetching subscription status from {url}");

        let response = timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| anyhow!("status request timed out after {:?}", self.timeout))?
            .map_err(|e| anyhow!("status request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(anyhow!("status endpoint returned {}", response.status()));
        }
        let status: SubscriptionStatus = response
            .json()
            .await
            .map_err(|e| anyhow!("failed to parse status response: {e}"))?;
        Ok(status)
    }

    /// Returns the payment page the user should be redirected to.
    pub async fn create_checkout(&self, user_id: &str) -> Result<String> {
        let request = self
            .client
            .post(self.checkout_url())
            .json(&CheckoutRequest { user_id });

        let response = timeout(self.timeout, request.send())
            .await
            .map_err(|_| anyhow!("checkout request timed out after {:?}", self.timeout))?
            .map_err(|e| anyhow!("checkout request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(anyhow!("checkout endpoint returned {}", response.status()));
        }
        let body: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("failed to parse checkout response: {e}"))?;
        if body.url.is_empty() {
            return Err(anyhow!("checkout response carried no url"));
        }
        Ok(body.url)
    }
}

/// Last known subscription status. Starts pessimistic.
#[derive(Debug, Clone, Default)]
pub struct PremiumCache {
    status: SubscriptionStatus,
    fetched_at: Option<Instant>,
}

impl PremiumCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &SubscriptionStatus {
        &self.status
    }

    pub fn is_premium(&self) -> bool {
        self.status.is_premium
    }

    pub fn age(&self) -> Option<Duration> {
        self.fetched_at.map(|at| at.elapsed())
    }

    /// Folds a fetch result in. A successful fetch returns the premium flag the
    /// store should hold, whether or not the cached value moved; the store may
    /// have been rehydrated with a stale flag.
    pub fn reconcile(&mut self, result: Result<SubscriptionStatus>) -> Option<bool> {
        match result {
            Ok(status) => {
                if status.is_premium != self.status.is_premium {
                    info!(
                        "premium {} ({})",
                        if status.is_premium { "granted" } else { "revoked" },
                        status.subscription_status
                    );
                }
                debug!(
                    "subscription status: {} (premium={}, allowed={})",
                    status.subscription_status, status.is_premium, status.is_allowed
                );
                self.status = status;
                self.fetched_at = Some(Instant::now());
                Some(self.status.is_premium)
            }
            Err(err) => {
                warn!(
                    "subscription status fetch failed, keeping '{}': {err:#}",
                    self.status.subscription_status
                );
                None
            }
        }
    }

    /// One-line summary for the console, e.g. `active (checked 42s ago)`.
    pub fn describe(&self) -> String {
        match self.age() {
            Some(age) => format!(
                "{} (checked {}s ago)",
                self.status().subscription_status,
                age.as_secs()
            ),
            None => format!("{} (not checked yet)", self.status().subscription_status),
        }
    }
}
