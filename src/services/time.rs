//! Time service client
//!
//! Fetches the current timestamp payload from the time microservice.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::fetch_json;
use crate::aggregate::{ProviderError, ProviderTask};

/// Result-map key for the time service
pub const TIME_KEY: &str = "time";

/// Deadline for one time service call
const DEADLINE: Duration = Duration::from_secs(3);

/// Client for the time microservice
#[derive(Debug, Clone)]
pub struct TimeClient {
    http_client: Client,
    base_url: String,
}

impl TimeClient {
    /// Creates a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches the current timestamp payload
    pub async fn fetch_time(&self) -> Result<Value, ProviderError> {
        fetch_json(&self.http_client, format!("{}/api/time", self.base_url)).await
    }

    /// Packages this provider as a fan-out task
    pub fn task(&self) -> ProviderTask {
        let client = self.clone();
        ProviderTask::new(
            TIME_KEY,
            DEADLINE,
            async move { client.fetch_time().await },
            fallback,
        )
    }
}

/// Substitute payload when the time service is unavailable
fn fallback(err: &ProviderError) -> Value {
    json!({
        "service": "time-service",
        "error": err.advisory(),
        "message": "Could not fetch time data",
    })
}
