//! Data models shared across the aggregation pipeline
//!
//! This module contains the settlement and weather structures exchanged with
//! the upstream APIs and returned from the HTTP endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rounds a coordinate component to 2 decimal places.
///
/// The weather provider rounds incoming coordinates the same way, so keys
/// derived from the rounded value line up with what the API actually serves.
/// Rounding is idempotent.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Parse a `lat,lon` string such as `52.37,4.90`
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let (lat, lon) = input.split_once(',')?;
        Some(Self {
            lat: lat.trim().parse().ok()?,
            lon: lon.trim().parse().ok()?,
        })
    }

    /// Format as a cache-key fragment with both components rounded
    #[must_use]
    pub fn to_key(&self) -> String {
        format!("{:.2},{:.2}", round2(self.lat), round2(self.lon))
    }
}

/// Kind of populated place, as tagged in the place-search data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    Town,
    City,
}

/// A populated place returned by the place search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Node id in the place-search dataset
    pub id: u64,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Resolved display name (international name preferred)
    pub name: String,
    /// Population from the place tags
    pub population: u64,
    /// Whether the place is tagged as a town or a city
    pub place: PlaceKind,
}

/// The subset of the weather payload the service stores and serves.
///
/// `current` and `hourly` are passed through untouched; only the envelope
/// fields are interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    pub timezone_offset: i64,
    pub current: Value,
    pub hourly: Vec<Value>,
}

/// A settlement merged with its weather and travel figures, as served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedSettlement {
    #[serde(flatten)]
    pub settlement: Settlement,
    pub weather: WeatherSnapshot,
    /// Travel duration from the requested origin, in seconds
    pub duration: f64,
    /// Travel distance from the requested origin, in meters
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(52.374_123, 52.37)]
    #[case(4.906, 4.91)]
    #[case(-13.446_9, -13.45)]
    #[case(0.0, 0.0)]
    fn test_round2(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(round2(input), expected);
    }

    #[rstest]
    #[case(52.374_123)]
    #[case(-4.905_77)]
    #[case(179.999)]
    fn test_round2_idempotent(#[case] input: f64) {
        assert_eq!(round2(round2(input)), round2(input));
    }

    #[test]
    fn test_coordinate_parse() {
        let coord = Coordinate::parse("52.374,4.901").unwrap();
        assert_eq!(coord.lat, 52.374);
        assert_eq!(coord.lon, 4.901);

        assert!(Coordinate::parse("Amsterdam").is_none());
        assert!(Coordinate::parse("52.374").is_none());
        assert!(Coordinate::parse("52.374,north").is_none());
    }

    #[test]
    fn test_coordinate_key_is_rounded() {
        let coord = Coordinate::parse("52.374, 4.901").unwrap();
        assert_eq!(coord.to_key(), "52.37,4.90");

        // Same key for inputs that agree after rounding
        let nearby = Coordinate::parse("52.368,4.904").unwrap();
        assert_eq!(nearby.to_key(), coord.to_key());
    }

    #[test]
    fn test_place_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlaceKind::Town).unwrap(), "\"town\"");
        assert_eq!(serde_json::to_string(&PlaceKind::City).unwrap(), "\"city\"");
    }

    #[test]
    fn test_enriched_settlement_flattens() {
        let enriched = EnrichedSettlement {
            settlement: Settlement {
                id: 42,
                lat: 52.37,
                lon: 4.90,
                name: "Amsterdam".to_string(),
                population: 900_000,
                place: PlaceKind::City,
            },
            weather: WeatherSnapshot {
                lat: 52.37,
                lon: 4.9,
                timezone: "Europe/Amsterdam".to_string(),
                timezone_offset: 3600,
                current: serde_json::json!({"temp": 284.2}),
                hourly: vec![],
            },
            duration: 1200.0,
            distance: 18_000.0,
        };

        let value = serde_json::to_value(&enriched).unwrap();
        // Settlement fields sit at the top level next to the merged figures
        assert_eq!(value["name"], "Amsterdam");
        assert_eq!(value["place"], "city");
        assert_eq!(value["duration"], 1200.0);
        assert_eq!(value["weather"]["timezone"], "Europe/Amsterdam");
    }
}
