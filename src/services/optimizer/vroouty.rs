//! VRoouty optimizer HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{OptimizerClient, SolveRequest, SolveResponse};

/// VRoouty client configuration
#[derive(Debug, Clone)]
pub struct VRooutyConfig {
    /// Base URL of the VRoouty server (e.g., "http://localhost:3000")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for VRooutyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl VRooutyConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// VRoouty routing optimizer client
pub struct VRooutyClient {
    client: Client,
    config: VRooutyConfig,
}

impl VRooutyClient {
    pub fn new(config: VRooutyConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl OptimizerClient for VRooutyClient {
    async fn solve(&self, request: &SolveRequest) -> Option<SolveResponse> {
        debug!(
            jobs = request.jobs.len(),
            shipments = request.shipments.len(),
            vehicles = request.vehicles.len(),
            "Sending solve request to VRoouty"
        );

        let response = match self
            .client
            .post(&self.config.base_url)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("VRoouty request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("VRoouty returned error {}: {}", status, body);
            return None;
        }

        match response.json::<SolveResponse>().await {
            Ok(solved) => {
                debug!(routes = solved.routes.len(), "Received VRoouty solution");
                Some(solved)
            }
            Err(e) => {
                warn!("Failed to parse VRoouty response: {}", e);
                None
            }
        }
    }

    fn name(&self) -> &str {
        "VRoouty"
    }
}
