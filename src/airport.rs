//! Static airport reference data
//!
//!  The registry is ordered: classification scans it front to back and the
//!  first airport wins on equal distances.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Default proximity radius around an airport in kilometers
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// One airport of the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRef {
    /// IATA style code (e.g. "PRN")
    pub code: String,
    /// Display name
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Proximity radius in kilometers
    #[serde(default = "default_radius")]
    pub radius_km: f64,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_KM
}

impl AirportRef {
    pub fn new(code: &str, name: &str, lat: f64, lon: f64, radius_km: f64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            lat,
            lon,
            radius_km,
        }
    }
}

/// Ordered, read-only list of airports for a session
#[derive(Debug, Clone, Default)]
pub struct AirportRegistry {
    airports: Vec<AirportRef>,
}

impl AirportRegistry {
    pub fn new(airports: Vec<AirportRef>) -> Self {
        Self { airports }
    }

    /// Airports of the Albania / Kosovo / North Macedonia region
    pub fn builtin() -> Self {
        Self::new(vec![
            AirportRef::new("TIA", "Tirana International Airport", 41.4147, 19.7206, DEFAULT_RADIUS_KM),
            AirportRef::new("PRN", "Pristina International Airport", 42.5728, 21.0358, DEFAULT_RADIUS_KM),
            AirportRef::new("OHD", "Ohrid St. Paul the Apostle Airport", 41.1799, 20.7422, DEFAULT_RADIUS_KM),
            AirportRef::new("SKP", "Skopje International Airport", 41.9616, 21.6214, DEFAULT_RADIUS_KM),
        ])
    }

    /// Load a registry from a JSON array of airports
    pub fn from_json(json: &str) -> Result<Self> {
        let airports: Vec<AirportRef> = serde_json::from_str(json)?;
        for ap in &airports {
            if !(ap.radius_km.is_finite() && ap.radius_km >= 0.0) {
                return Err(TrackerError::Config(format!(
                    "airport {} has invalid radius {}",
                    ap.code, ap.radius_km
                )));
            }
        }
        Ok(Self::new(airports))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AirportRef> {
        self.airports.iter()
    }

    #[allow(dead_code)]
    pub fn get(&self, code: &str) -> Option<&AirportRef> {
        self.airports.iter().find(|a| a.code.eq_ignore_ascii_case(code))
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}
