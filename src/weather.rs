use std::time::Duration;

use tracing::instrument;

use crate::error::Upstream;
use crate::models::{WeatherSnapshot, round2};
use crate::{AppState, NearcastError, Result};

const WEATHER_TTL: Duration = Duration::from_secs(60 * 60);

/// Returns the weather for a coordinate, serving from the cache when a fresh
/// entry exists.
#[instrument(skip(state))]
pub async fn get_weather(state: &AppState, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
    // The provider rounds coordinates to 2 decimals, so round before keying
    // to hit the same entry for equivalent queries
    let lat = round2(lat);
    let lon = round2(lon);
    let key = format!("weather_{lat:.2}_{lon:.2}");

    if let Some(cached) = state.cache.get::<WeatherSnapshot>(&key).await? {
        return Ok(cached);
    }

    let snapshot = get_weather_call(state, lat, lon).await?;
    state.cache.put(&key, snapshot.clone(), WEATHER_TTL).await?;
    Ok(snapshot)
}

async fn get_weather_call(state: &AppState, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
    tracing::debug!("Calling the weather API");
    let url = format!(
        "{}/onecall?lat={lat}&lon={lon}&appid={}",
        state.config.weather_api_url, state.config.weather_api_key
    );

    let response = state
        .http
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|source| NearcastError::unavailable(Upstream::Weather, source))?;

    response
        .json::<WeatherSnapshot>()
        .await
        .map_err(|err| NearcastError::malformed(Upstream::Weather, err.to_string()))
}
