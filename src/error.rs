//! Error types and HTTP status mapping for the aggregation service

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The upstream services the aggregator talks to, for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Weather,
    PlaceSearch,
    Routing,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Upstream::Weather => "weather API",
            Upstream::PlaceSearch => "place search API",
            Upstream::Routing => "routing API",
        };
        f.write_str(name)
    }
}

/// Main error type for the aggregation service
#[derive(Error, Debug)]
pub enum NearcastError {
    /// The upstream could not be reached or answered with an error status
    #[error("{upstream} unavailable: {source}")]
    UpstreamUnavailable {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered but the payload violated its contract
    #[error("{upstream} returned a malformed response: {message}")]
    UpstreamMalformed { upstream: Upstream, message: String },

    /// Nothing matched the requested location
    #[error("{message}")]
    NotFound { message: String },

    /// Cache store failure
    #[error(transparent)]
    Cache(#[from] anyhow::Error),
}

impl NearcastError {
    /// Create an unavailable-upstream error from a transport/status failure
    pub fn unavailable(upstream: Upstream, source: reqwest::Error) -> Self {
        Self::UpstreamUnavailable { upstream, source }
    }

    /// Create a malformed-response error
    pub fn malformed<S: Into<String>>(upstream: Upstream, message: S) -> Self {
        Self::UpstreamMalformed {
            upstream,
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            NearcastError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            NearcastError::UpstreamMalformed { .. } | NearcastError::Cache(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            NearcastError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Serialize)]
struct ApiError {
    message: String,
}

impl IntoResponse for NearcastError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(%status, error = %self, "request failed");
        (
            status,
            Json(ApiError {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let malformed = NearcastError::malformed(Upstream::Routing, "missing matrix row");
        assert!(matches!(malformed, NearcastError::UpstreamMalformed { .. }));

        let not_found = NearcastError::not_found("no enclosing area");
        assert!(matches!(not_found, NearcastError::NotFound { .. }));
    }

    #[test]
    fn test_status_mapping() {
        let malformed = NearcastError::malformed(Upstream::Weather, "bad payload");
        assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let not_found = NearcastError::not_found("nothing here");
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let cache = NearcastError::from(anyhow::anyhow!("store offline"));
        assert_eq!(cache.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages_name_the_upstream() {
        let malformed = NearcastError::malformed(Upstream::PlaceSearch, "element without tags");
        assert_eq!(
            malformed.to_string(),
            "place search API returned a malformed response: element without tags"
        );
    }
}
