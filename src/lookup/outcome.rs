//! Lookup outcome classification.
//!
//! Every upstream interaction collapses into the closed [`Outcome`] type so
//! callers exhaustively match five cases instead of juggling status codes,
//! sentinel strings, and parse errors.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// Classified result of one lookup call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The network is known upstream; coordinates attached.
    Found {
        /// Trilaterated latitude.
        lat: f64,
        /// Trilaterated longitude.
        lon: f64,
    },
    /// Confirmed permanent miss; cached so it is never retried.
    NotFound,
    /// Credential rejected. Treated like a permanent miss for this item but
    /// logged at error level since it likely affects every future lookup.
    AuthError,
    /// The global quota is exhausted; the governor must enter cooldown.
    RateLimited,
    /// Timeout, connection failure, 5xx, or unparseable body. Retried with a
    /// bounded count.
    Transient {
        /// Human-readable failure reason, for logging only.
        reason: String,
        /// Whether an HTTP response arrived. A completed call spent upstream
        /// quota even if its body was unusable; a call that never got a
        /// response did not.
        reached_upstream: bool,
    },
}

impl Outcome {
    /// Transient failure after an HTTP response was received.
    pub fn transient_response(reason: impl Into<String>) -> Self {
        Outcome::Transient {
            reason: reason.into(),
            reached_upstream: true,
        }
    }

    /// Transient failure before any response arrived.
    pub fn transient_network(reason: impl Into<String>) -> Self {
        Outcome::Transient {
            reason: reason.into(),
            reached_upstream: false,
        }
    }
}

/// A single-identifier location lookup.
///
/// The production implementation is [`crate::lookup::WigleClient`]; tests
/// substitute scripted fakes to count and steer calls. Implementations never
/// fail: every error is folded into an [`Outcome`].
#[async_trait]
pub trait LocationLookup: Send + Sync {
    /// Looks up one BSSID and classifies the result.
    async fn fetch(&self, bssid: &str) -> Outcome;
}

#[derive(Debug, Deserialize)]
struct NetworkDetailResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    results: Vec<NetworkDetailResult>,
}

#[derive(Debug, Deserialize)]
struct NetworkDetailResult {
    trilat: Option<f64>,
    trilong: Option<f64>,
}

/// Classifies an HTTP response purely from its status and body.
///
/// - 200 with a populated result set → [`Outcome::Found`]
/// - 200 with no usable result, 400, 404 → [`Outcome::NotFound`]
/// - 401/403 → [`Outcome::AuthError`]
/// - 429 → [`Outcome::RateLimited`]
/// - anything else (5xx, unexpected statuses, malformed bodies) →
///   [`Outcome::Transient`]
pub fn classify_response(status: StatusCode, body: &str) -> Outcome {
    match status {
        StatusCode::OK => match serde_json::from_str::<NetworkDetailResponse>(body) {
            Ok(parsed) => {
                if !parsed.success {
                    return Outcome::NotFound;
                }
                match parsed.results.first() {
                    Some(NetworkDetailResult {
                        trilat: Some(lat),
                        trilong: Some(lon),
                    }) => Outcome::Found {
                        lat: *lat,
                        lon: *lon,
                    },
                    _ => Outcome::NotFound,
                }
            }
            Err(e) => Outcome::transient_response(format!("unparseable response body: {e}")),
        },
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Outcome::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Outcome::AuthError,
        StatusCode::TOO_MANY_REQUESTS => Outcome::RateLimited,
        other => Outcome::transient_response(format!("unexpected HTTP status {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_with_coordinates() {
        let body = r#"{"success":true,"results":[{"trilat":51.5,"trilong":-0.1}]}"#;
        assert_eq!(
            classify_response(StatusCode::OK, body),
            Outcome::Found {
                lat: 51.5,
                lon: -0.1
            }
        );
    }

    #[test]
    fn test_success_without_results_is_permanent_miss() {
        let body = r#"{"success":true,"results":[]}"#;
        assert_eq!(classify_response(StatusCode::OK, body), Outcome::NotFound);
    }

    #[test]
    fn test_success_false_is_permanent_miss() {
        let body = r#"{"success":false,"results":[]}"#;
        assert_eq!(classify_response(StatusCode::OK, body), Outcome::NotFound);
    }

    #[test]
    fn test_missing_coordinates_is_permanent_miss() {
        let body = r#"{"success":true,"results":[{"trilat":null,"trilong":null}]}"#;
        assert_eq!(classify_response(StatusCode::OK, body), Outcome::NotFound);
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            classify_response(StatusCode::UNAUTHORIZED, ""),
            Outcome::AuthError
        );
        assert_eq!(
            classify_response(StatusCode::FORBIDDEN, ""),
            Outcome::AuthError
        );
    }

    #[test]
    fn test_rate_limit_status() {
        assert_eq!(
            classify_response(StatusCode::TOO_MANY_REQUESTS, ""),
            Outcome::RateLimited
        );
    }

    #[test]
    fn test_server_errors_are_transient_and_reached_upstream() {
        assert!(matches!(
            classify_response(StatusCode::INTERNAL_SERVER_ERROR, ""),
            Outcome::Transient {
                reached_upstream: true,
                ..
            }
        ));
        assert!(matches!(
            classify_response(StatusCode::BAD_GATEWAY, ""),
            Outcome::Transient {
                reached_upstream: true,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_body_is_transient_and_reached_upstream() {
        assert!(matches!(
            classify_response(StatusCode::OK, "<html>surprise</html>"),
            Outcome::Transient {
                reached_upstream: true,
                ..
            }
        ));
    }
}
