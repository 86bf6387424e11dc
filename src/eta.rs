//! Time-to-airport and flight level estimates for display
//!
//!  The ETA is a straight-line distance over current ground speed to the
//!  nearest airport. It is a reporting convenience and never feeds back into
//!  classification.

use std::fmt;

use serde::Serialize;

use crate::flight::ClassifiedFlight;

/// Below this distance (km) the aircraft is considered landing or taking off
pub const IMMINENT_DISTANCE_KM: f64 = 5.0;
/// Below this ground speed (km/h) the aircraft is considered stationary
pub const STATIONARY_SPEED_KMH: f64 = 50.0;

pub const MS_TO_KMH: f64 = 3.6;
pub const METERS_TO_FEET: f64 = 3.28084;
pub const MS_TO_KNOTS: f64 = 1.94384;
pub const MS_TO_FEET_PER_MIN: f64 = 196.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Eta {
    /// Position, velocity or nearest airport missing
    Unavailable,
    Imminent,
    Stationary,
    /// Rounded minutes to the nearest airport
    Minutes(u64),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Eta::Unavailable => write!(f, "Unavailable"),
            Eta::Imminent => write!(f, "Landing/Taking off"),
            Eta::Stationary => write!(f, "Stationary"),
            Eta::Minutes(m) if m < 60 => write!(f, "~{} minutes", m),
            Eta::Minutes(m) => write!(f, "~{}h {}m", m / 60, m % 60),
        }
    }
}

/// Estimate the time to the nearest airport
pub fn estimate(flight: &ClassifiedFlight) -> Eta {
    if flight.position().is_none() {
        return Eta::Unavailable;
    }
    let (Some(distance), Some(velocity)) = (flight.distance_km, flight.sample.velocity) else {
        return Eta::Unavailable;
    };

    if distance < IMMINENT_DISTANCE_KM {
        return Eta::Imminent;
    }

    let speed_kmh = velocity * MS_TO_KMH;
    if speed_kmh.is_nan() || speed_kmh < STATIONARY_SPEED_KMH {
        return Eta::Stationary;
    }

    let hours = distance / speed_kmh;
    Eta::Minutes((hours * 60.0).round() as u64)
}

/// Flight level derived from barometric altitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlightLevel {
    Unavailable,
    Level(i64),
}

impl fmt::Display for FlightLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightLevel::Unavailable => write!(f, "Unavailable"),
            FlightLevel::Level(fl) => write!(f, "FL{}", fl),
        }
    }
}

/// `round(feet / 100)` from a barometric altitude in meters
pub fn flight_level(baro_altitude_m: Option<f64>) -> FlightLevel {
    match baro_altitude_m {
        Some(alt) if alt.is_finite() => {
            FlightLevel::Level(round_half_up(alt * METERS_TO_FEET / 100.0) as i64)
        }
        _ => FlightLevel::Unavailable,
    }
}

/// Halves round toward +infinity, so -0.5 gives 0 rather than -1
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::AirportRef;
    use crate::flight::{Phase, RawSample};

    fn flight(distance_km: Option<f64>, velocity: Option<f64>) -> ClassifiedFlight {
        ClassifiedFlight {
            sample: RawSample {
                latitude: Some(42.0),
                longitude: Some(21.0),
                velocity,
                ..RawSample::new("4ca7b5")
            },
            nearest: Some(AirportRef::new("PRN", "Pristina", 42.5728, 21.0358, 50.0)),
            distance_km,
            phase: Phase::EnRoute,
        }
    }

    #[test]
    fn test_unavailable_without_inputs() {
        assert_eq!(estimate(&flight(Some(40.0), None)), Eta::Unavailable);
        assert_eq!(estimate(&flight(None, Some(200.0))), Eta::Unavailable);

        let mut f = flight(Some(40.0), Some(200.0));
        f.sample.longitude = None;
        assert_eq!(estimate(&f), Eta::Unavailable);
    }

    #[test]
    fn test_imminent() {
        assert_eq!(estimate(&flight(Some(3.4), Some(80.0))), Eta::Imminent);
        // close and slow is still imminent
        assert_eq!(estimate(&flight(Some(4.9), Some(0.0))), Eta::Imminent);
    }

    #[test]
    fn test_stationary() {
        assert_eq!(estimate(&flight(Some(40.0), Some(10.0))), Eta::Stationary);
    }

    #[test]
    fn test_minutes() {
        let eta = estimate(&flight(Some(100.0), Some(200.0)));
        assert_eq!(eta, Eta::Minutes(8));
        assert_eq!(eta.to_string(), "~8 minutes");
    }

    #[test]
    fn test_hours_and_minutes() {
        // 900 km at 720 km/h = 75 minutes
        let eta = estimate(&flight(Some(900.0), Some(200.0)));
        assert_eq!(eta, Eta::Minutes(75));
        assert_eq!(eta.to_string(), "~1h 15m");
        // rounding never produces "60m"
        assert_eq!(Eta::Minutes(120).to_string(), "~2h 0m");
    }

    #[test]
    fn test_flight_level() {
        assert_eq!(flight_level(None), FlightLevel::Unavailable);
        assert_eq!(flight_level(Some(10668.0)).to_string(), "FL350");
        assert_eq!(flight_level(Some(0.0)), FlightLevel::Level(0));
        assert_eq!(flight_level(Some(-15.0)), FlightLevel::Level(0));
        assert_eq!(flight_level(Some(-40.0)), FlightLevel::Level(-1));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.4), 2.0);
    }
}
