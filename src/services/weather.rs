//! Weather service client with a cached wrapper
//!
//! The weather upstream is slower and flakier than the other services, so its
//! responses go through a single-slot cache with a 10-minute freshness
//! window. Within the window the upstream is not called at all; past it, a
//! failed refresh degrades to the last known payload, tagged stale, rather
//! than surfacing an error. The cache is only ever written on success, so the
//! reported age keeps growing across repeated failures instead of resetting.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use super::fetch_json;
use crate::aggregate::{ProviderError, ProviderTask};
use crate::cache::{CacheEntry, CacheStore};

/// Result-map key for the weather service
pub const WEATHER_KEY: &str = "weather";

/// Freshness window for cached weather payloads, in minutes
pub const CACHE_TTL_MINUTES: i64 = 10;

/// Deadline for one weather service call
const DEADLINE: Duration = Duration::from_secs(5);

/// Client for the weather microservice
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http_client: Client,
    base_url: String,
}

impl WeatherClient {
    /// Creates a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches the weather payload directly from the upstream
    pub async fn fetch_weather(&self) -> Result<Value, ProviderError> {
        fetch_json(&self.http_client, format!("{}/api/weather", self.base_url)).await
    }
}

/// Wraps [`WeatherClient`] with the single-slot cache
///
/// Each invocation lands in one of three states:
/// - fresh hit: the cached payload is inside its freshness window; returned
///   tagged `cached` with its age, without calling the upstream
/// - miss + refresh: the upstream is called; on success the slot is
///   overwritten and the payload returned tagged `cached: false`
/// - stale fallback: the upstream call failed but the slot holds an entry
///   (fresh or not); that payload is returned tagged `cached`, `stale`, and
///   annotated with the error, leaving the slot untouched
///
/// An upstream failure with an empty slot propagates as
/// [`ProviderError::CacheMiss`] for the aggregator's own fallback.
#[derive(Debug, Clone)]
pub struct CachedWeatherClient {
    inner: WeatherClient,
    store: Arc<CacheStore>,
    /// Serializes the whole read-decide-write path per invocation, so two
    /// concurrent misses cannot interleave their refreshes
    refresh_lock: Arc<Mutex<()>>,
}

impl CachedWeatherClient {
    /// Wraps `inner` with the given cache store
    pub fn new(inner: WeatherClient, store: Arc<CacheStore>) -> Self {
        Self {
            inner,
            store,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The injected cache store
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Fetches the weather payload, preferring the cache
    pub async fn fetch(&self) -> Result<Value, ProviderError> {
        let _guard = self.refresh_lock.lock().await;
        let now = Utc::now();

        if self.store.is_fresh() {
            if let Some(entry) = self.store.get() {
                debug!(key = WEATHER_KEY, "serving fresh cached payload");
                return Ok(tag_cached(entry, now, None));
            }
        }

        let outcome = self.inner.fetch_weather().await;
        self.resolve(outcome, now)
    }

    /// Applies the cache policy to an upstream outcome
    fn resolve(
        &self,
        outcome: Result<Value, ProviderError>,
        now: DateTime<Utc>,
    ) -> Result<Value, ProviderError> {
        match outcome {
            Ok(mut payload) => {
                tag(&mut payload, "cached", Value::Bool(false));
                self.store.put(payload.clone(), now);
                Ok(payload)
            }
            Err(err) => match self.store.get() {
                Some(entry) => {
                    debug!(key = WEATHER_KEY, error = %err, "serving stale cached payload");
                    Ok(tag_cached(entry, now, Some(&err)))
                }
                None => Err(ProviderError::CacheMiss(Box::new(err))),
            },
        }
    }

    /// Packages this provider as a fan-out task
    pub fn task(&self) -> ProviderTask {
        let client = self.clone();
        ProviderTask::new(
            WEATHER_KEY,
            DEADLINE,
            async move { client.fetch().await },
            fallback,
        )
    }
}

/// Substitute payload when the weather service is unavailable and nothing is
/// cached
fn fallback(err: &ProviderError) -> Value {
    json!({
        "service": "weather-service",
        "error": err.advisory(),
        "message": "Could not fetch weather data",
    })
}

/// Tags a cached entry's payload for return: `cached`, its age, and on the
/// stale path the triggering error
fn tag_cached(entry: CacheEntry, now: DateTime<Utc>, stale_error: Option<&ProviderError>) -> Value {
    let mut payload = entry.payload;
    let age = (now - entry.fetched_at).num_seconds().max(0);

    tag(&mut payload, "cached", Value::Bool(true));
    tag(&mut payload, "cache_age_seconds", Value::from(age));
    if let Some(err) = stale_error {
        tag(&mut payload, "stale", Value::Bool(true));
        tag(
            &mut payload,
            "error",
            Value::from(format!("using cached data: {}", err.advisory())),
        );
    }

    payload
}

/// Sets a top-level field on a JSON object payload; non-object payloads pass
/// through untagged
fn tag(payload: &mut Value, field: &str, value: Value) {
    if let Value::Object(map) = payload {
        map.insert(field.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A wrapper whose upstream connection is refused immediately
    fn unreachable_client() -> CachedWeatherClient {
        let store = Arc::new(CacheStore::new(chrono::Duration::minutes(
            CACHE_TTL_MINUTES,
        )));
        CachedWeatherClient::new(WeatherClient::new("http://127.0.0.1:9"), store)
    }

    fn sample_payload() -> Value {
        json!({
            "service": "weather-service",
            "location": { "city": "Haifa", "country": "Israel" },
            "weather": { "temperature_c": "24", "condition": "Sunny" },
        })
    }

    #[tokio::test]
    async fn test_fresh_hit_serves_cache_without_upstream_call() {
        let client = unreachable_client();
        client.store().put(sample_payload(), Utc::now());

        // The upstream URL is unreachable, so an Ok here proves no call was made
        let payload = client.fetch().await.expect("fresh hit should succeed");

        assert_eq!(payload["cached"], true);
        assert!(payload["cache_age_seconds"].as_i64().unwrap() >= 0);
        assert!(payload.get("stale").is_none());
        assert_eq!(payload["weather"]["condition"], "Sunny");
    }

    #[tokio::test]
    async fn test_fresh_hits_are_identical_except_age() {
        let client = unreachable_client();
        client.store().put(sample_payload(), Utc::now());

        let mut first = client.fetch().await.expect("first hit");
        let mut second = client.fetch().await.expect("second hit");

        let age1 = first["cache_age_seconds"].as_i64().unwrap();
        let age2 = second["cache_age_seconds"].as_i64().unwrap();
        assert!(age2 >= age1, "age must be monotonically non-decreasing");

        first.as_object_mut().unwrap().remove("cache_age_seconds");
        second.as_object_mut().unwrap().remove("cache_age_seconds");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stale_fallback_keeps_fetched_at_unchanged() {
        let client = unreachable_client();
        let fetched_at = Utc::now() - chrono::Duration::minutes(CACHE_TTL_MINUTES + 1);
        client.store().put(sample_payload(), fetched_at);

        let payload = client.fetch().await.expect("stale entry should be served");

        assert_eq!(payload["cached"], true);
        assert_eq!(payload["stale"], true);
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .starts_with("using cached data:"));
        assert!(payload["cache_age_seconds"].as_i64().unwrap() >= 11 * 60);

        // A failed refresh must never advance the snapshot's timestamp
        let entry = client.store().get().expect("entry should remain");
        assert_eq!(entry.fetched_at, fetched_at);
    }

    #[tokio::test]
    async fn test_repeated_failures_keep_serving_the_same_aging_snapshot() {
        let client = unreachable_client();
        let fetched_at = Utc::now() - chrono::Duration::minutes(CACHE_TTL_MINUTES + 1);
        client.store().put(sample_payload(), fetched_at);

        let first = client.fetch().await.expect("first stale fetch");
        let second = client.fetch().await.expect("second stale fetch");

        assert_eq!(second["weather"], first["weather"]);
        assert!(
            second["cache_age_seconds"].as_i64().unwrap()
                >= first["cache_age_seconds"].as_i64().unwrap()
        );
        assert_eq!(
            client.store().get().expect("entry should remain").fetched_at,
            fetched_at
        );
    }

    #[tokio::test]
    async fn test_failure_with_empty_cache_propagates_cache_miss() {
        let client = unreachable_client();

        let result = client.fetch().await;

        assert!(matches!(result, Err(ProviderError::CacheMiss(_))));
        assert!(client.store().get().is_none(), "a failure must not populate the cache");
    }

    #[tokio::test]
    async fn test_successful_refresh_overwrites_the_slot() {
        let client = unreachable_client();
        let stale_at = Utc::now() - chrono::Duration::minutes(CACHE_TTL_MINUTES + 5);
        client.store().put(json!({ "weather": { "temperature_c": "9" } }), stale_at);

        let now = Utc::now();
        let refreshed = client
            .resolve(Ok(sample_payload()), now)
            .expect("successful outcome");

        assert_eq!(refreshed["cached"], false);
        assert!(refreshed.get("cache_age_seconds").is_none());

        let entry = client.store().get().expect("slot should hold the refresh");
        assert_eq!(entry.fetched_at, now);
        assert_eq!(entry.payload["weather"]["condition"], "Sunny");
        assert!(client.store().is_fresh());
    }

    #[test]
    fn test_fallback_carries_advisory_message() {
        let inner = ProviderError::Status(reqwest::StatusCode::BAD_GATEWAY);
        let err = ProviderError::CacheMiss(Box::new(inner));
        let payload = fallback(&err);

        assert_eq!(payload["service"], "weather-service");
        assert_eq!(payload["message"], "Could not fetch weather data");
        assert!(payload["error"].as_str().unwrap().contains("nothing cached"));
    }

    #[test]
    fn test_task_uses_weather_key_and_deadline() {
        let task = unreachable_client().task();
        assert_eq!(task.key(), WEATHER_KEY);
        assert_eq!(task.deadline(), Duration::from_secs(5));
    }

    #[test]
    fn test_non_object_payloads_pass_through_untagged() {
        let mut payload = json!([1, 2, 3]);
        tag(&mut payload, "cached", Value::Bool(true));
        assert_eq!(payload, json!([1, 2, 3]));
    }
}
