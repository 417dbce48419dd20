//! Ceremony error types for `clockin`
//!
//! Every failure a registration or clock-in flow can end with is a variant of
//! [`CeremonyError`]. Collaborator traits report their own narrower errors
//! ([`BrokerError`], [`LocationError`]) which the orchestrator tags with the
//! step that produced them.

use thiserror::Error;

/// Errors that end a ceremony flow
///
/// The `Display` text of each variant is the user-visible message; the status
/// line shown to the user is `"Error: "` followed by it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CeremonyError {
    /// Username was empty or whitespace only
    #[error("Please enter a username")]
    EmptyInput,

    /// The relying party replied with an `error` field
    #[error("{0}")]
    ServerRejected(String),

    /// The platform broker refused to create a credential
    #[error("{0}")]
    CredentialCreationFailed(String),

    /// The platform broker refused to produce an assertion
    #[error("{0}")]
    CredentialAssertionFailed(String),

    /// No geolocation capability on this platform
    #[error("Geolocation is not supported by your browser")]
    LocationUnsupported,

    /// Location was denied, timed out or could not be read
    #[error("Unable to retrieve your location")]
    LocationUnavailable,

    /// Location lies outside the configured office geofence
    #[error(
        "You are {distance_meters:.0} meters away from the office. \
         You must be within {allowed_meters:.0} meters to clock in."
    )]
    OutsideGeofence {
        distance_meters: f64,
        allowed_meters: f64,
    },

    /// Network failure or a reply that is not JSON
    #[error("{0}")]
    TransportFailure(String),
}

impl CeremonyError {
    /// Status line shown to the user for this error
    #[must_use]
    pub fn status_message(&self) -> String {
        format!("Error: {self}")
    }

    /// Short machine-readable tag, used in log lines
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            CeremonyError::EmptyInput => "empty_input",
            CeremonyError::ServerRejected(_) => "server_rejected",
            CeremonyError::CredentialCreationFailed(_) => "credential_creation_failed",
            CeremonyError::CredentialAssertionFailed(_) => "credential_assertion_failed",
            CeremonyError::LocationUnsupported => "location_unsupported",
            CeremonyError::LocationUnavailable => "location_unavailable",
            CeremonyError::OutsideGeofence { .. } => "outside_geofence",
            CeremonyError::TransportFailure(_) => "transport_failure",
        }
    }
}

impl From<reqwest::Error> for CeremonyError {
    fn from(error: reqwest::Error) -> Self {
        CeremonyError::TransportFailure(error.to_string())
    }
}

impl From<serde_json::Error> for CeremonyError {
    fn from(error: serde_json::Error) -> Self {
        CeremonyError::TransportFailure(format!("Invalid JSON reply: {error}"))
    }
}

/// Rejection reported by a platform credential broker
///
/// Covers user cancellation, unsupported authenticators and timeouts alike;
/// the orchestrator does not distinguish between them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The user dismissed the platform prompt
    #[error("The operation was cancelled")]
    Cancelled,

    /// The platform prompt expired
    #[error("The operation timed out")]
    TimedOut,

    /// No authenticator able to satisfy the options
    #[error("No supported authenticator: {0}")]
    Unsupported(String),

    /// Anything else the platform reported
    #[error("{0}")]
    Other(String),
}

/// Failure reported by a [`LocationProvider`](crate::location::LocationProvider)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("geolocation is not supported")]
    Unsupported,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

impl From<LocationError> for CeremonyError {
    fn from(error: LocationError) -> Self {
        match error {
            LocationError::Unsupported => CeremonyError::LocationUnsupported,
            LocationError::Unavailable(_) => CeremonyError::LocationUnavailable,
        }
    }
}
