//! Shared flight board
//!
//!  `BoardSink` is the view sink used by the binary. It keeps one marker per
//!  drawn flight plus the detail view in a `Board` behind a lock, which the
//!  terminal display and the HTTP server read.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::error;

use crate::eta::{self, Eta, FlightLevel, METERS_TO_FEET, MS_TO_KNOTS};
use crate::flight::ClassifiedFlight;
use crate::view::{self, DetailPayload, ViewSink};

/// One drawn flight
#[derive(Debug, Clone)]
pub struct Marker {
    pub flight: ClassifiedFlight,
    pub eta: Eta,
    pub tooltip: String,
    pub selected: bool,
}

/// Flat JSON form of a marker
#[derive(Debug, Clone, Serialize)]
pub struct MarkerRow {
    pub hex: String,
    pub flight: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Geometric altitude in feet
    pub altitude: Option<i64>,
    pub track: Option<f64>,
    /// Ground speed in knots
    pub speed: Option<i64>,
    pub vert_rate: Option<f64>,
    pub on_ground: bool,
    pub status: String,
    pub airport: Option<String>,
    pub distance_km: Option<f64>,
    pub eta: String,
    pub tooltip: String,
    pub selected: bool,
}

impl Marker {
    pub fn to_row(&self) -> MarkerRow {
        let s = &self.flight.sample;
        MarkerRow {
            hex: s.icao24.clone(),
            flight: s.callsign.clone().unwrap_or_default(),
            country: s.origin_country.clone().unwrap_or_default(),
            lat: s.latitude.unwrap_or_default(),
            lon: s.longitude.unwrap_or_default(),
            altitude: s.geo_altitude.map(|m| (m * METERS_TO_FEET).round() as i64),
            track: s.true_track,
            speed: s.velocity.map(|v| (v * MS_TO_KNOTS).round() as i64),
            vert_rate: s.vertical_rate,
            on_ground: s.on_ground,
            status: self.flight.phase.to_string(),
            airport: self.flight.airport_in_range().map(|ap| ap.code.clone()),
            distance_km: self.flight.distance_km.map(|d| (d * 10.0).round() / 10.0),
            eta: self.eta.to_string(),
            tooltip: self.tooltip.clone(),
            selected: self.selected,
        }
    }
}

#[derive(Debug, Default)]
pub struct Board {
    markers: HashMap<u64, Marker>,
    detail: Option<DetailPayload>,
}

impl Board {
    /// Markers sorted by callsign, then ICAO address
    pub fn markers(&self) -> Vec<&Marker> {
        let mut v: Vec<_> = self.markers.values().collect();
        v.sort_by(|a, b| {
            a.flight
                .label()
                .cmp(b.flight.label())
                .then_with(|| a.flight.identity().cmp(b.flight.identity()))
        });
        v
    }

    pub fn detail(&self) -> Option<&DetailPayload> {
        self.detail.as_ref()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

pub struct BoardSink {
    board: Arc<RwLock<Board>>,
    next_handle: u64,
}

impl BoardSink {
    pub fn new(board: Arc<RwLock<Board>>) -> Self {
        Self { board, next_handle: 0 }
    }
}

impl ViewSink for BoardSink {
    type Handle = u64;

    fn create(&mut self, _identity: &str, flight: &ClassifiedFlight) -> u64 {
        self.next_handle += 1;
        let marker = Marker {
            flight: flight.clone(),
            eta: eta::estimate(flight),
            tooltip: view::tooltip(flight),
            selected: false,
        };
        self.board.write().markers.insert(self.next_handle, marker);
        self.next_handle
    }

    fn update(&mut self, handle: &u64, flight: &ClassifiedFlight) {
        let mut board = self.board.write();
        match board.markers.get_mut(handle) {
            Some(m) => {
                m.flight = flight.clone();
                m.eta = eta::estimate(flight);
                m.tooltip = view::tooltip(flight);
            }
            None => error!("Update of unknown marker {}", handle),
        }
    }

    fn destroy(&mut self, handle: &u64) {
        if self.board.write().markers.remove(handle).is_none() {
            error!("Destroy of unknown marker {}", handle);
        }
    }

    fn set_selected_visual(&mut self, handle: &u64, selected: bool) {
        match self.board.write().markers.get_mut(handle) {
            Some(m) => m.selected = selected,
            None => error!("Selection of unknown marker {}", handle),
        }
    }

    fn render_detail(&mut self, flight: &ClassifiedFlight, eta: Eta, level: FlightLevel) {
        self.board.write().detail = Some(DetailPayload::new(flight, eta, level));
    }

    fn hide_detail(&mut self) {
        self.board.write().detail = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::AirportRegistry;
    use crate::flight::RawSample;
    use crate::reconciler::Reconciler;
    use crate::source::Snapshot;

    fn sample(id: &str, callsign: &str, lat: f64, lon: f64) -> RawSample {
        RawSample {
            callsign: Some(callsign.to_string()),
            latitude: Some(lat),
            longitude: Some(lon),
            velocity: Some(200.0),
            vertical_rate: Some(-4.0),
            ..RawSample::new(id)
        }
    }

    #[test]
    fn test_board_follows_reconciler() {
        let board = Arc::new(RwLock::new(Board::default()));
        let mut r = Reconciler::new(AirportRegistry::builtin(), BoardSink::new(Arc::clone(&board)));

        r.process_cycle(Snapshot::Observed(vec![
            sample("bbb002", "WZZ4371", 42.60, 21.00),
            sample("aaa001", "AHY271", 44.0, 22.0),
        ]))
        .unwrap();
        {
            let b = board.read();
            let labels: Vec<_> = b.markers().iter().map(|m| m.flight.label().to_string()).collect();
            assert_eq!(labels, ["AHY271", "WZZ4371"]);
            assert!(b.detail().is_none());
        }

        r.select("bbb002");
        {
            let b = board.read();
            let row = b.markers()[1].to_row();
            assert!(row.selected);
            assert_eq!(row.status, "Arriving");
            assert_eq!(row.airport.as_deref(), Some("PRN"));
            assert_eq!(row.eta, "Landing/Taking off");
            assert_eq!(b.detail().map(|d| d.callsign.as_str()), Some("WZZ4371"));
        }

        r.process_cycle(Snapshot::Observed(vec![sample("aaa001", "AHY271", 44.1, 22.0)]))
            .unwrap();
        let b = board.read();
        assert_eq!(b.len(), 1);
        assert!(b.detail().is_none());
        assert!(!b.markers()[0].selected);
    }
}
