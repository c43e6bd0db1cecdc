use serde::Deserialize;
use tracing::instrument;

use crate::error::Upstream;
use crate::models::Settlement;
use crate::{AppState, NearcastError, Result};

/// Duration/distance table from one origin to a destination list.
///
/// Row 0 is the origin; column 0 is the origin-to-origin self entry, so the
/// destination at index `i` reads column `i + 1`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteMatrix {
    pub durations: Vec<Vec<f64>>,
    pub distances: Vec<Vec<f64>>,
}

impl RouteMatrix {
    /// Travel figures for the destination at `index`, as
    /// `(duration_seconds, distance_meters)`.
    #[must_use]
    pub fn leg(&self, index: usize) -> Option<(f64, f64)> {
        let duration = *self.durations.first()?.get(index + 1)?;
        let distance = *self.distances.first()?.get(index + 1)?;
        Some((duration, distance))
    }
}

/// Fetches travel durations and distances from `origin` to every settlement,
/// in settlement order.
///
/// Deliberately uncached: travel figures may later include traffic data.
#[instrument(skip(state, destinations), fields(destination_count = destinations.len()))]
pub async fn get_route_table(
    state: &AppState,
    origin: &str,
    destinations: &[Settlement],
) -> Result<RouteMatrix> {
    let mut coords = origin.to_string();
    for settlement in destinations {
        // destinations use the same lat,lon order the origin token has
        coords.push_str(&format!(";{},{}", settlement.lat, settlement.lon));
    }

    let url = format!(
        "{}/table/v1/driving/{coords}?sources=0&annotations=duration,distance",
        state.config.osrm_api_url
    );

    let response = state
        .http
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|source| NearcastError::unavailable(Upstream::Routing, source))?;

    let matrix: RouteMatrix = response
        .json()
        .await
        .map_err(|err| NearcastError::malformed(Upstream::Routing, err.to_string()))?;

    validate_dimensions(&matrix, destinations.len())?;
    Ok(matrix)
}

/// Both matrices need an origin row with one column per destination plus the
/// self entry; anything shorter would make the merge step index out of range.
fn validate_dimensions(matrix: &RouteMatrix, destination_count: usize) -> Result<()> {
    let expected = destination_count + 1;
    let durations = matrix.durations.first().map_or(0, Vec::len);
    let distances = matrix.distances.first().map_or(0, Vec::len);

    if durations < expected || distances < expected {
        return Err(NearcastError::malformed(
            Upstream::Routing,
            format!(
                "expected {expected} matrix columns, got {durations} durations and {distances} distances"
            ),
        ));
    }
    Ok(())
}
