//! The HTTP surface: one endpoint aggregating settlements, weather and
//! travel figures into a duration-sorted list.

use std::cmp::Ordering;

use axum::Router;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::get;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::instrument;

use crate::error::Upstream;
use crate::models::{EnrichedSettlement, Settlement, WeatherSnapshot};
use crate::routing::RouteMatrix;
use crate::{AppState, NearcastError, places, routing, weather};

/// Population a settlement needs to make it into the response.
const AGGREGATE_POPULATION_THRESHOLD: u64 = 25_000;
/// How many weather fetches may be in flight at once.
const WEATHER_CONCURRENCY: usize = 4;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather/{location}", get(nearby_weather))
        .with_state(state)
}

#[instrument(skip(state))]
async fn nearby_weather(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<Vec<EnrichedSettlement>>, NearcastError> {
    if state.config.resolve_origin {
        let area = places::resolve_area_name(&state, &location).await?;
        tracing::info!(%area, "resolved requested origin");
    }

    let settlements = places::find_places(
        &state,
        &location,
        AGGREGATE_POPULATION_THRESHOLD,
        places::DEFAULT_RADIUS_METERS,
    )
    .await?;

    // Weather per settlement, a few fetches in flight at a time; collection
    // preserves settlement order and the first failure aborts the request
    let fetches: Vec<_> = settlements
        .iter()
        .map(|settlement| weather::get_weather(&state, settlement.lat, settlement.lon))
        .collect();
    let snapshots: Vec<WeatherSnapshot> = stream::iter(fetches)
        .buffered(WEATHER_CONCURRENCY)
        .try_collect()
        .await?;

    let matrix = routing::get_route_table(&state, &location, &settlements).await?;

    let enriched = merge(settlements, snapshots, &matrix)?;
    Ok(Json(sort_by_duration(enriched)))
}

/// Pairs each settlement with its weather and the matrix column after the
/// origin entry.
fn merge(
    settlements: Vec<Settlement>,
    snapshots: Vec<WeatherSnapshot>,
    matrix: &RouteMatrix,
) -> Result<Vec<EnrichedSettlement>, NearcastError> {
    let mut enriched = Vec::with_capacity(settlements.len());
    for (index, (settlement, snapshot)) in settlements.into_iter().zip(snapshots).enumerate() {
        let (duration, distance) = matrix.leg(index).ok_or_else(|| {
            NearcastError::malformed(
                Upstream::Routing,
                format!("missing matrix column {}", index + 1),
            )
        })?;
        enriched.push(EnrichedSettlement {
            settlement,
            weather: snapshot,
            duration,
            distance,
        });
    }
    Ok(enriched)
}

/// Ascending by travel duration; ties keep their incoming order.
fn sort_by_duration(mut list: Vec<EnrichedSettlement>) -> Vec<EnrichedSettlement> {
    list.sort_by(|a, b| a.duration.partial_cmp(&b.duration).unwrap_or(Ordering::Equal));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlaceKind, Settlement};

    fn settlement(id: u64, name: &str) -> Settlement {
        Settlement {
            id,
            lat: 52.0,
            lon: 4.0,
            name: name.to_string(),
            population: 100_000,
            place: PlaceKind::City,
        }
    }

    fn snapshot(timezone: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            lat: 52.0,
            lon: 4.0,
            timezone: timezone.to_string(),
            timezone_offset: 3600,
            current: serde_json::json!({}),
            hourly: vec![],
        }
    }

    fn enriched(name: &str, duration: f64) -> EnrichedSettlement {
        EnrichedSettlement {
            settlement: settlement(0, name),
            weather: snapshot("Europe/Amsterdam"),
            duration,
            distance: duration * 15.0,
        }
    }

    #[test]
    fn test_merge_pairs_settlements_with_their_matrix_column() {
        let settlements = vec![
            settlement(1, "First"),
            settlement(2, "Second"),
            settlement(3, "Third"),
        ];
        let snapshots = vec![snapshot("Zone/A"), snapshot("Zone/B"), snapshot("Zone/C")];
        let matrix = RouteMatrix {
            durations: vec![vec![0.0, 11.0, 22.0, 33.0]],
            distances: vec![vec![0.0, 111.0, 222.0, 333.0]],
        };

        let enriched = merge(settlements, snapshots, &matrix).unwrap();

        assert_eq!(enriched[0].duration, 11.0);
        assert_eq!(enriched[2].duration, 33.0);
        assert_eq!(enriched[2].distance, 333.0);
        assert_eq!(enriched[2].settlement.name, "Third");
        assert_eq!(enriched[2].weather.timezone, "Zone/C");
    }

    #[test]
    fn test_merge_rejects_a_short_matrix() {
        let settlements = vec![settlement(1, "First"), settlement(2, "Second")];
        let snapshots = vec![snapshot("Zone/A"), snapshot("Zone/B")];
        let matrix = RouteMatrix {
            durations: vec![vec![0.0, 11.0]],
            distances: vec![vec![0.0, 111.0]],
        };

        let result = merge(settlements, snapshots, &matrix);
        assert!(matches!(
            result,
            Err(NearcastError::UpstreamMalformed { .. })
        ));
    }

    #[test]
    fn test_sort_is_ascending() {
        let sorted = sort_by_duration(vec![
            enriched("far", 1800.0),
            enriched("near", 300.0),
            enriched("middle", 900.0),
        ]);

        let names: Vec<_> = sorted
            .iter()
            .map(|e| e.settlement.name.as_str())
            .collect();
        assert_eq!(names, ["near", "middle", "far"]);
    }

    #[test]
    fn test_sort_keeps_tied_entries_in_order() {
        let sorted = sort_by_duration(vec![
            enriched("slowest", 1200.0),
            enriched("tie_one", 600.0),
            enriched("tie_two", 600.0),
        ]);

        let names: Vec<_> = sorted
            .iter()
            .map(|e| e.settlement.name.as_str())
            .collect();
        assert_eq!(names, ["tie_one", "tie_two", "slowest"]);
    }
}
