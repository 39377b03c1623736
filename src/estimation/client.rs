//! Client for the remote heart-rate/SpO2 estimation service.
//!
//! The estimation algorithm itself is not part of this codebase; only the
//! wire contract is fixed here. One call per finalized scan, no retries:
//! a failed estimate requires a fresh scan, so a stale buffer is never
//! resubmitted silently.

use std::time::Duration;

use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;
use crate::models::VitalsResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/api/estimate".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Seam between the session controller and the remote estimator.
#[async_trait]
pub trait VitalsEstimator: Send + Sync {
    async fn estimate(&self, signal: &[f32], fs: f32) -> Result<VitalsResult, EstimationError>;
}

#[derive(Serialize)]
struct EstimateRequest<'a> {
    red_signal: &'a [f32],
    fs: f32,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    success: bool,
    data: Option<VitalsResult>,
    message: Option<String>,
}

pub struct HttpEstimationClient {
    client: Client,
    endpoint: String,
}

impl HttpEstimationClient {
    pub fn new(config: &EstimationConfig) -> Result<Self, EstimationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn parse(response: EstimateResponse) -> Result<VitalsResult, EstimationError> {
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "estimation rejected".to_string());
            return Err(EstimationError::Rejected(message));
        }
        response.data.ok_or(EstimationError::MalformedResponse)
    }
}

#[async_trait]
impl VitalsEstimator for HttpEstimationClient {
    async fn estimate(&self, signal: &[f32], fs: f32) -> Result<VitalsResult, EstimationError> {
        info!(
            "submitting {} samples at {:.2} Hz to {}",
            signal.len(),
            fs,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EstimateRequest {
                red_signal: signal,
                fs,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EstimationError::Status(status.as_u16()));
        }

        let body: EstimateResponse = response
            .json()
            .await
            .map_err(|_| EstimationError::MalformedResponse)?;
        Self::parse(body)
    }
}
