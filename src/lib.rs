//! `nearcast` - nearby-settlement weather and travel-time aggregation
//!
//! This library aggregates three upstream services behind one endpoint:
//! a place search for settlements around a location, a weather provider
//! for each settlement, and a routing service for travel durations.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod places;
pub mod routing;
pub mod weather;
pub mod web;

use std::sync::Arc;

use anyhow::Context;

// Re-export core types for public API
pub use cache::Cache;
pub use config::Config;
pub use error::{NearcastError, Upstream};
pub use models::{Coordinate, EnrichedSettlement, PlaceKind, Settlement, WeatherSnapshot};
pub use routing::RouteMatrix;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, NearcastError>;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub cache: Cache,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the shared state: one HTTP client and the persistent cache.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("nearcast/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;
        let cache = Cache::open(&config.cache_path)
            .with_context(|| format!("Failed to open cache at {}", config.cache_path))?;

        Ok(Self {
            http,
            cache,
            config: Arc::new(config),
        })
    }
}
