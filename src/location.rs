//! Location capture for clock-in
//!
//! A [`Location`] is acquired once per login attempt through a
//! [`LocationProvider`] and attached to the finish request. An optional
//! [`Geofence`] lets the client refuse a clock-in from too far away before
//! contacting the server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ceremony::{CeremonyError, LocationError};
use crate::settings::GeofenceSettings;

/// Mean Earth radius in metres
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A point on Earth in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Build a location, rejecting coordinates no platform could report
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] for non-finite values or values
    /// outside [-90, 90] / [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::Unavailable(format!(
                "invalid latitude {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::Unavailable(format!(
                "invalid longitude {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance in metres (haversine)
    #[must_use]
    pub fn distance_to(&self, other: &Location) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let delta_phi = (other.latitude - self.latitude).to_radians();
        let delta_lambda = (other.longitude - self.longitude).to_radians();

        let a = (delta_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}

/// Source of the device's current position
///
/// Implementations wrap the platform geolocation API. Denial and timeout are
/// both reported as [`LocationError::Unavailable`].
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Acquire the current position
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unsupported`] when the platform has no
    /// geolocation, [`LocationError::Unavailable`] when it is denied or times out.
    async fn current_location(&self) -> Result<Location, LocationError>;
}

/// Provider for platforms without geolocation
pub struct UnsupportedLocationProvider;

#[async_trait]
impl LocationProvider for UnsupportedLocationProvider {
    async fn current_location(&self) -> Result<Location, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Provider that always reports the same position (kiosks, fixed terminals)
pub struct FixedLocationProvider {
    location: Location,
}

impl FixedLocationProvider {
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> Result<Location, LocationError> {
        Ok(self.location)
    }
}

/// Circle around the office inside which clocking in is allowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub center: Location,
    pub allowed_distance_meters: f64,
}

impl Geofence {
    /// Build the geofence described by settings, if enabled
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] if the office coordinates are invalid.
    pub fn from_settings(settings: &GeofenceSettings) -> Result<Option<Self>, LocationError> {
        if !settings.enabled {
            return Ok(None);
        }
        Ok(Some(Self {
            center: Location::new(settings.office_latitude, settings.office_longitude)?,
            allowed_distance_meters: settings.allowed_distance_meters,
        }))
    }

    /// Check a location against the fence
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::OutsideGeofence`] with the measured distance.
    pub fn check(&self, location: &Location) -> Result<(), CeremonyError> {
        let distance = location.distance_to(&self.center);
        if distance > self.allowed_distance_meters {
            return Err(CeremonyError::OutsideGeofence {
                distance_meters: distance,
                allowed_meters: self.allowed_distance_meters,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> Location {
        Location::new(37.7749, -122.4194).unwrap()
    }

    #[test]
    fn test_location_rejects_out_of_range() {
        assert!(Location::new(90.1, 0.0).is_err());
        assert!(Location::new(0.0, -180.5).is_err());
        assert!(Location::new(f64::NAN, 0.0).is_err());
        assert!(Location::new(0.0, f64::INFINITY).is_err());
        assert!(Location::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert!(office().distance_to(&office()).abs() < 1e-6);
    }

    #[test]
    fn test_distance_known_value() {
        // San Francisco to Los Angeles, roughly 559 km
        let la = Location::new(34.0522, -118.2437).unwrap();
        let distance = office().distance_to(&la);
        assert!((distance - 559_000.0).abs() < 2_000.0, "got {distance}");
    }

    #[test]
    fn test_geofence_disabled_by_settings() {
        let settings = GeofenceSettings::default();
        assert_eq!(Geofence::from_settings(&settings), Ok(None));
    }

    #[test]
    fn test_geofence_check() {
        let fence = Geofence {
            center: office(),
            allowed_distance_meters: 100.0,
        };
        let nearby = Location::new(37.7752, -122.4194).unwrap();
        assert!(fence.check(&nearby).is_ok());

        let far = Location::new(37.7849, -122.4194).unwrap();
        match fence.check(&far) {
            Err(CeremonyError::OutsideGeofence {
                distance_meters,
                allowed_meters,
            }) => {
                assert!(distance_meters > 1_000.0);
                assert!((allowed_meters - 100.0).abs() < f64::EPSILON);
            }
            other => panic!("expected geofence rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_builtin_providers() {
        assert_eq!(
            UnsupportedLocationProvider.current_location().await,
            Err(LocationError::Unsupported)
        );
        let provider = FixedLocationProvider::new(office());
        assert_eq!(provider.current_location().await, Ok(office()));
    }
}
