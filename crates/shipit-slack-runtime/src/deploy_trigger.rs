//! Outbound deployment webhook trigger.
//!
//! The trigger is fire-and-forget: a single POST with the deployment key
//! header and an empty body. The response status and body are not inspected,
//! and transport failures are never retried.

use std::time::{Duration, Instant};

use thiserror::Error;

pub const DEPLOYMENT_KEY_HEADER: &str = "x-deployment-key";

#[derive(Debug, Error)]
/// Enumerates deployment trigger failures.
pub enum DeploymentTriggerError {
    #[error("deployment endpoint must be an http(s) url: {0}")]
    InvalidEndpoint(String),
    #[error("failed to build deployment http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What the trigger observed about a delivered request.
pub struct DeploymentReceipt {
    pub status: u16,
    pub elapsed_ms: u64,
}

#[derive(Clone)]
/// Public struct `DeploymentTrigger` used to fire the deployment webhook.
pub struct DeploymentTrigger {
    http: reqwest::Client,
    endpoint: String,
    deployment_key: String,
}

impl std::fmt::Debug for DeploymentTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentTrigger")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl DeploymentTrigger {
    /// `request_timeout_ms == 0` leaves the client without a timeout.
    pub fn new(
        endpoint: &str,
        deployment_key: &str,
        request_timeout_ms: u64,
    ) -> Result<Self, DeploymentTriggerError> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(DeploymentTriggerError::InvalidEndpoint(endpoint.to_string()));
        }
        let mut builder = reqwest::Client::builder();
        if request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(request_timeout_ms));
        }
        let http = builder
            .build()
            .map_err(DeploymentTriggerError::ClientBuild)?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            deployment_key: deployment_key.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fires the deployment webhook once.
    ///
    /// Any HTTP response counts as delivered; only transport errors fail.
    pub async fn trigger(&self) -> Result<DeploymentReceipt, DeploymentTriggerError> {
        let started = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .header(DEPLOYMENT_KEY_HEADER, &self.deployment_key)
            .send()
            .await
            .map_err(DeploymentTriggerError::Transport)?;
        Ok(DeploymentReceipt {
            status: response.status().as_u16(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
