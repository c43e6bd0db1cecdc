use std::collections::HashMap;

use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use crate::error::Upstream;
use crate::models::{Coordinate, PlaceKind, Settlement};
use crate::{AppState, NearcastError, Result};

/// Places below this population are never considered settlements.
const MIN_SETTLEMENT_POPULATION: u64 = 2500;

/// Default population cutoff for callers that do not pick one.
pub const DEFAULT_POPULATION_THRESHOLD: u64 = 1000;
/// Default search radius in meters.
pub const DEFAULT_RADIUS_METERS: u64 = 100_000;

/// Finds towns and cities around `location` with a population strictly above
/// `population_threshold`, searching within `radius_meters`.
///
/// Results are cached without expiry; settlement data changes rarely enough
/// that a stale list beats re-querying.
#[instrument(skip(state))]
pub async fn find_places(
    state: &AppState,
    location: &str,
    population_threshold: u64,
    radius_meters: u64,
) -> Result<Vec<Settlement>> {
    let key = format!("settlements_{radius_meters}_{population_threshold}_{location}");

    if let Some(cached) = state.cache.get::<Vec<Settlement>>(&key).await? {
        return Ok(cached);
    }

    let settlements =
        find_places_call(state, location, population_threshold, radius_meters).await?;
    state.cache.put_forever(&key, settlements.clone()).await?;
    Ok(settlements)
}

async fn find_places_call(
    state: &AppState,
    location: &str,
    population_threshold: u64,
    radius_meters: u64,
) -> Result<Vec<Settlement>> {
    tracing::debug!("Calling the place search API");
    let query = format!("[out:json];node[\"place\"](around:{radius_meters},{location});out;");

    let response: OverpassResponse<PlaceNode> = query_overpass(state, &query).await?;
    filter_settlements(response.elements, population_threshold)
}

/// Resolves the name of the administrative area enclosing `location`.
///
/// Cached without expiry. Coordinate-shaped tokens are rounded before keying
/// so equivalent queries share an entry.
#[instrument(skip(state))]
pub async fn resolve_area_name(state: &AppState, location: &str) -> Result<String> {
    let token = Coordinate::parse(location)
        .map(|coord| coord.to_key())
        .unwrap_or_else(|| location.to_string());
    let key = format!("area_name_{token}");

    if let Some(cached) = state.cache.get::<String>(&key).await? {
        return Ok(cached);
    }

    let name = resolve_area_name_call(state, location).await?;
    state.cache.put_forever(&key, name.clone()).await?;
    Ok(name)
}

async fn resolve_area_name_call(state: &AppState, location: &str) -> Result<String> {
    tracing::debug!("Calling the place search API for the enclosing area");
    let query = format!("[out:json];is_in({location});area._[admin_level=8];out;");

    let response: OverpassResponse<AreaElement> = query_overpass(state, &query).await?;

    let area = response
        .elements
        .into_iter()
        .next()
        .ok_or_else(|| NearcastError::not_found(format!("no enclosing area for {location}")))?;

    area.tags.get("name").cloned().ok_or_else(|| {
        NearcastError::malformed(
            Upstream::PlaceSearch,
            format!("area {} has no name tag", area.id),
        )
    })
}

async fn query_overpass<T: DeserializeOwned>(
    state: &AppState,
    query: &str,
) -> Result<OverpassResponse<T>> {
    let url = format!(
        "{}/interpreter?data={}",
        state.config.overpass_api_url,
        urlencoding::encode(query)
    );

    let response = state
        .http
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|source| NearcastError::unavailable(Upstream::PlaceSearch, source))?;

    response
        .json::<OverpassResponse<T>>()
        .await
        .map_err(|err| NearcastError::malformed(Upstream::PlaceSearch, err.to_string()))
}

fn filter_settlements(
    elements: Vec<PlaceNode>,
    population_threshold: u64,
) -> Result<Vec<Settlement>> {
    let mut settlements = Vec::new();
    for element in elements {
        if let Some(settlement) = settlement_from_node(element)? {
            if settlement.population > population_threshold {
                settlements.push(settlement);
            }
        }
    }
    Ok(settlements)
}

/// Maps a raw node to a settlement, dropping places that are not towns or
/// cities and places at or below the fixed population floor.
///
/// A node without any `place` tag breaks the query contract and is an error,
/// not a skip.
fn settlement_from_node(node: PlaceNode) -> Result<Option<Settlement>> {
    let place = node.tags.get("place").ok_or_else(|| {
        NearcastError::malformed(
            Upstream::PlaceSearch,
            format!("node {} has no place tag", node.id),
        )
    })?;

    let place = match place.as_str() {
        "town" => PlaceKind::Town,
        "city" => PlaceKind::City,
        _ => return Ok(None),
    };

    // Population is a free-form tag; unparseable counts as missing
    let Some(population) = node
        .tags
        .get("population")
        .and_then(|raw| raw.parse().ok())
    else {
        return Ok(None);
    };
    if population <= MIN_SETTLEMENT_POPULATION {
        return Ok(None);
    }

    let name = node
        .tags
        .get("name_int")
        .or_else(|| node.tags.get("name"))
        .cloned()
        .unwrap_or_else(|| "Nameless".to_string());

    Ok(Some(Settlement {
        id: node.id,
        lat: node.lat,
        lon: node.lon,
        name,
        population,
        place,
    }))
}

#[derive(Debug, Deserialize)]
struct OverpassResponse<T> {
    elements: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PlaceNode {
    id: u64,
    lat: f64,
    lon: f64,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AreaElement {
    id: u64,
    #[serde(default)]
    tags: HashMap<String, String>,
}
