//! Command-line interface parsing
//!
//! Parses CLI arguments with clap and validates them into a `StartupConfig`:
//! output mode, refresh interval, and service URL overrides.

use clap::Parser;
use std::time::Duration;
use thiserror::Error;

use crate::services::ServiceUrls;

/// Minimum allowed auto-refresh interval in seconds
const MIN_INTERVAL_SECS: u64 = 5;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The refresh interval is too aggressive for the backend services
    #[error("Invalid refresh interval: {0}s (minimum is 5s)")]
    IntervalTooShort(u64),
}

/// svcdash - aggregated dashboard for backend microservices
#[derive(Parser, Debug)]
#[command(name = "svcdash")]
#[command(about = "Terminal dashboard aggregating time, system info, and weather services")]
#[command(version)]
pub struct Cli {
    /// Run one aggregation batch, print it as JSON to stdout, and exit
    #[arg(long)]
    pub json: bool,

    /// Auto-refresh interval for the dashboard view, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub interval: u64,

    /// Base URL of the time service
    #[arg(long, value_name = "URL")]
    pub time_url: Option<String>,

    /// Base URL of the system-info service
    #[arg(long, value_name = "URL")]
    pub sysinfo_url: Option<String>,

    /// Base URL of the weather service
    #[arg(long, value_name = "URL")]
    pub weather_url: Option<String>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// One-shot JSON mode instead of the TUI
    pub json: bool,
    /// Interval between automatic dashboard refreshes
    pub refresh_interval: Duration,
    /// Base URLs of the backend services
    pub urls: ServiceUrls,
}

impl StartupConfig {
    /// Validates parsed CLI arguments into a startup configuration.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with defaults filled in
    /// * `Err(CliError)` if the refresh interval is below the minimum
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.interval < MIN_INTERVAL_SECS {
            return Err(CliError::IntervalTooShort(cli.interval));
        }

        let mut urls = ServiceUrls::default();
        if let Some(url) = &cli.time_url {
            urls.time = url.clone();
        }
        if let Some(url) = &cli.sysinfo_url {
            urls.sysinfo = url.clone();
        }
        if let Some(url) = &cli.weather_url {
            urls.weather = url.clone();
        }

        Ok(Self {
            json: cli.json,
            refresh_interval: Duration::from_secs(cli.interval),
            urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args_uses_defaults() {
        let cli = Cli::parse_from(["svcdash"]);
        assert!(!cli.json);
        assert_eq!(cli.interval, 30);
        assert!(cli.time_url.is_none());
    }

    #[test]
    fn test_cli_parse_json_flag() {
        let cli = Cli::parse_from(["svcdash", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn test_cli_parse_interval() {
        let cli = Cli::parse_from(["svcdash", "--interval", "60"]);
        assert_eq!(cli.interval, 60);
    }

    #[test]
    fn test_cli_parse_url_overrides() {
        let cli = Cli::parse_from([
            "svcdash",
            "--time-url",
            "http://timehost:9001",
            "--weather-url",
            "http://weatherhost:9003",
        ]);
        assert_eq!(cli.time_url.as_deref(), Some("http://timehost:9001"));
        assert!(cli.sysinfo_url.is_none());
        assert_eq!(cli.weather_url.as_deref(), Some("http://weatherhost:9003"));
    }

    #[test]
    fn test_startup_config_defaults() {
        let cli = Cli::parse_from(["svcdash"]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert!(!config.json);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert!(config.urls.time.contains("5001"));
    }

    #[test]
    fn test_startup_config_applies_overrides() {
        let cli = Cli::parse_from(["svcdash", "--sysinfo-url", "http://other:7002"]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert_eq!(config.urls.sysinfo, "http://other:7002");
        // Untouched URLs keep their defaults
        assert!(config.urls.time.contains("5001"));
        assert!(config.urls.weather.contains("5003"));
    }

    #[test]
    fn test_startup_config_rejects_short_interval() {
        let cli = Cli::parse_from(["svcdash", "--interval", "1"]);
        let result = StartupConfig::from_cli(&cli);

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid refresh interval"));
    }

    #[test]
    fn test_minimum_interval_is_accepted() {
        let cli = Cli::parse_from(["svcdash", "--interval", "5"]);
        assert!(StartupConfig::from_cli(&cli).is_ok());
    }
}
