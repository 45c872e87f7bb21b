//! System-info service client
//!
//! Fetches host and container details (platform, CPU, memory) from the
//! system-info microservice.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::fetch_json;
use crate::aggregate::{ProviderError, ProviderTask};

/// Result-map key for the system-info service
pub const SYSINFO_KEY: &str = "sysinfo";

/// Deadline for one system-info call
const DEADLINE: Duration = Duration::from_secs(3);

/// Client for the system-info microservice
#[derive(Debug, Clone)]
pub struct SysInfoClient {
    http_client: Client,
    base_url: String,
}

impl SysInfoClient {
    /// Creates a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches the system information payload
    pub async fn fetch_sysinfo(&self) -> Result<Value, ProviderError> {
        fetch_json(&self.http_client, format!("{}/api/sysinfo", self.base_url)).await
    }

    /// Packages this provider as a fan-out task
    pub fn task(&self) -> ProviderTask {
        let client = self.clone();
        ProviderTask::new(
            SYSINFO_KEY,
            DEADLINE,
            async move { client.fetch_sysinfo().await },
            fallback,
        )
    }
}

/// Substitute payload when the system-info service is unavailable
fn fallback(err: &ProviderError) -> Value {
    json!({
        "service": "system-info-service",
        "error": err.advisory(),
        "message": "Could not fetch system info",
    })
}
