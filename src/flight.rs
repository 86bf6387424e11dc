//! Flight observations and their classified form

use std::fmt;

use serde::Serialize;

use crate::airport::AirportRef;

/// One aircraft observation from the telemetry source.
///
/// Every field except the identity may be absent; absence is not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawSample {
    /// ICAO 24-bit address as reported by the source (stable across snapshots)
    pub icao24: String,
    pub callsign: Option<String>,
    pub origin_country: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Barometric altitude in meters
    pub baro_altitude: Option<f64>,
    /// Geometric altitude in meters
    pub geo_altitude: Option<f64>,
    /// Ground speed in m/s
    pub velocity: Option<f64>,
    /// True track in degrees (0-359)
    pub true_track: Option<f64>,
    /// Vertical rate in m/s, negative when descending
    pub vertical_rate: Option<f64>,
    pub squawk: Option<String>,
    pub on_ground: bool,
}

impl RawSample {
    #[allow(dead_code)]
    pub fn new(icao24: &str) -> Self {
        Self {
            icao24: icao24.to_string(),
            ..Default::default()
        }
    }

    /// Resolved position, if both coordinates are present and in range
    pub fn position(&self) -> Option<Position> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Position::new(lat, lon),
            _ => None,
        }
    }
}

/// A valid WGS-84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }
}

/// Classified flight state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Arriving,
    Departing,
    EnRoute,
    Unknown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Arriving => write!(f, "Arriving"),
            Phase::Departing => write!(f, "Departing"),
            Phase::EnRoute => write!(f, "En-Route"),
            Phase::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A `RawSample` enriched with proximity and phase, recomputed every cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedFlight {
    pub sample: RawSample,
    /// Nearest airport of the registry, reported even outside its radius
    pub nearest: Option<AirportRef>,
    /// Distance to `nearest` in kilometers
    pub distance_km: Option<f64>,
    pub phase: Phase,
}

impl ClassifiedFlight {
    pub fn identity(&self) -> &str {
        &self.sample.icao24
    }

    pub fn position(&self) -> Option<Position> {
        self.sample.position()
    }

    /// Nearest airport, but only when the flight is inside its radius
    pub fn airport_in_range(&self) -> Option<&AirportRef> {
        match (&self.nearest, self.distance_km) {
            (Some(ap), Some(d)) if d <= ap.radius_km => Some(ap),
            _ => None,
        }
    }

    /// Callsign for display, falling back to the ICAO address
    pub fn label(&self) -> &str {
        self.sample.callsign.as_deref().unwrap_or(&self.sample.icao24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_validity() {
        assert!(Position::new(42.0, 21.0).is_some());
        assert!(Position::new(90.0, -180.0).is_some());
        assert!(Position::new(90.5, 0.0).is_none());
        assert!(Position::new(0.0, 181.0).is_none());
        assert!(Position::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_sample_position_requires_both() {
        let mut s = RawSample::new("abc123");
        assert!(s.position().is_none());
        s.latitude = Some(42.0);
        assert!(s.position().is_none());
        s.longitude = Some(0.0);
        // zero is a real coordinate, not a missing one
        assert_eq!(s.position(), Some(Position { lat: 42.0, lon: 0.0 }));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::EnRoute.to_string(), "En-Route");
        assert_eq!(Phase::Arriving.to_string(), "Arriving");
    }
}
