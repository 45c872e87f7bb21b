//! Upstream service clients for the dashboard
//!
//! Each backend microservice gets a thin client that fetches its JSON payload
//! and knows how to package itself as a fan-out task with a deadline and a
//! fallback. [`Dashboard`] wires the three clients into one batch.

pub mod sysinfo;
pub mod time;
pub mod weather;

pub use sysinfo::{SysInfoClient, SYSINFO_KEY};
pub use time::{TimeClient, TIME_KEY};
pub use weather::{CachedWeatherClient, WeatherClient, WEATHER_KEY};

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use crate::aggregate::{self, ProviderError, ProviderTask};
use crate::cache::CacheStore;

/// Base URLs of the three backend services
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    /// Time service base URL
    pub time: String,
    /// System-info service base URL
    pub sysinfo: String,
    /// Weather service base URL
    pub weather: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            time: "http://localhost:5001".to_string(),
            sysinfo: "http://localhost:5002".to_string(),
            weather: "http://localhost:5003".to_string(),
        }
    }
}

/// Fetches a URL and parses the body as JSON, mapping non-2xx statuses to
/// [`ProviderError::Status`]
pub(crate) async fn fetch_json(client: &Client, url: String) -> Result<Value, ProviderError> {
    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status));
    }

    let text = response.text().await?;
    let payload: Value = serde_json::from_str(&text)?;
    Ok(payload)
}

/// The three upstream clients behind one dashboard view
///
/// Owns the weather cache store (injected into the cached wrapper at
/// construction) and builds a fresh task batch per refresh.
#[derive(Debug, Clone)]
pub struct Dashboard {
    time: TimeClient,
    sysinfo: SysInfoClient,
    weather: CachedWeatherClient,
}

impl Dashboard {
    /// Creates a dashboard talking to the given service URLs
    pub fn new(urls: &ServiceUrls) -> Self {
        let store = Arc::new(CacheStore::new(chrono::Duration::minutes(
            weather::CACHE_TTL_MINUTES,
        )));
        Self {
            time: TimeClient::new(&urls.time),
            sysinfo: SysInfoClient::new(&urls.sysinfo),
            weather: CachedWeatherClient::new(WeatherClient::new(&urls.weather), store),
        }
    }

    /// Builds the task batch for one refresh; one task per service
    pub fn tasks(&self) -> Vec<ProviderTask> {
        vec![self.time.task(), self.sysinfo.task(), self.weather.task()]
    }

    /// Runs one aggregation batch and returns the keyed result map
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        aggregate::run(self.tasks()).await
    }
}
