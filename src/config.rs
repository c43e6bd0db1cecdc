//! Environment-driven configuration
//!
//! All settings come from environment variables; only the weather API key is
//! mandatory, everything else has a sensible default.

use std::env;

use anyhow::{Context, Result};

const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/3.0";
const DEFAULT_OVERPASS_API_URL: &str = "https://overpass-api.de/api";
const DEFAULT_OSRM_API_URL: &str = "http://router.project-osrm.org";
const DEFAULT_CACHE_PATH: &str = "nearcast_cache";
const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration for the service
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the weather provider
    pub weather_api_key: String,
    /// Base URL of the weather provider
    pub weather_api_url: String,
    /// Base URL of the place-search provider
    pub overpass_api_url: String,
    /// Base URL of the routing provider
    pub osrm_api_url: String,
    /// Directory for the persistent cache store
    pub cache_path: String,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Whether to reverse-geocode the requested origin on each request
    pub resolve_origin: bool,
}

impl Config {
    /// Load the configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let weather_api_key =
            env::var("OPENWEATHER_API_KEY").context("Missing OPENWEATHER_API_KEY env var")?;

        let port = match env::var("NEARCAST_PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("NEARCAST_PORT is not a valid port: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let resolve_origin = env::var("NEARCAST_RESOLVE_ORIGIN")
            .map(|raw| flag_enabled(&raw))
            .unwrap_or(true);

        Ok(Self {
            weather_api_key,
            weather_api_url: env::var("OPENWEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_API_URL.to_string()),
            overpass_api_url: env::var("OVERPASS_API_URL")
                .unwrap_or_else(|_| DEFAULT_OVERPASS_API_URL.to_string()),
            osrm_api_url: env::var("OSRM_API_URL")
                .unwrap_or_else(|_| DEFAULT_OSRM_API_URL.to_string()),
            cache_path: env::var("NEARCAST_CACHE_PATH")
                .unwrap_or_else(|_| DEFAULT_CACHE_PATH.to_string()),
            port,
            resolve_origin,
        })
    }
}

fn flag_enabled(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}
