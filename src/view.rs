//! Rendering boundary
//!
//!  The reconciler never draws anything itself. It drives a `ViewSink` that
//!  owns the visual representation of each flight and hands back an opaque
//!  handle on creation.

use serde::Serialize;

use crate::eta::{Eta, FlightLevel, METERS_TO_FEET, MS_TO_FEET_PER_MIN, MS_TO_KNOTS};
use crate::flight::ClassifiedFlight;

/// Receiver of draw/remove calls. All calls are fire-and-forget.
pub trait ViewSink {
    /// Opaque handle to one visual entity
    type Handle: Clone + std::fmt::Debug;

    fn create(&mut self, identity: &str, flight: &ClassifiedFlight) -> Self::Handle;
    fn update(&mut self, handle: &Self::Handle, flight: &ClassifiedFlight);
    fn destroy(&mut self, handle: &Self::Handle);
    fn set_selected_visual(&mut self, handle: &Self::Handle, selected: bool);
    fn render_detail(&mut self, flight: &ClassifiedFlight, eta: Eta, level: FlightLevel);
    fn hide_detail(&mut self);
}

/// Human readable detail view of one flight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPayload {
    pub icao24: String,
    pub callsign: String,
    pub status: String,
    pub origin_country: String,
    pub nearest_airport: String,
    pub eta: String,
    pub squawk: String,
    pub altitude: String,
    pub flight_level: String,
    pub speed: String,
    pub heading: String,
    pub vertical_rate: String,
    pub position: String,
}

impl DetailPayload {
    pub fn new(flight: &ClassifiedFlight, eta: Eta, level: FlightLevel) -> Self {
        let s = &flight.sample;
        let unknown = || "Unknown".to_string();

        let position = format!(
            "Lat: {}, Lon: {}",
            s.latitude.map(|v| format!("{:.4}", v)).unwrap_or_else(unknown),
            s.longitude.map(|v| format!("{:.4}", v)).unwrap_or_else(unknown),
        );

        Self {
            icao24: s.icao24.clone(),
            callsign: s.callsign.clone().unwrap_or_else(unknown),
            status: flight.phase.to_string(),
            origin_country: s.origin_country.clone().unwrap_or_else(unknown),
            nearest_airport: flight
                .airport_in_range()
                .map(|ap| format!("{} ({})", ap.name, ap.code))
                .unwrap_or_else(|| "Other".to_string()),
            eta: eta.to_string(),
            squawk: s.squawk.clone().unwrap_or_else(unknown),
            altitude: s
                .geo_altitude
                .map(|m| format!("{} ft", (m * METERS_TO_FEET).round() as i64))
                .unwrap_or_else(unknown),
            flight_level: level.to_string(),
            speed: s
                .velocity
                .map(|v| format!("{} kts", (v * MS_TO_KNOTS).round() as i64))
                .unwrap_or_else(unknown),
            heading: s
                .true_track
                .map(|t| format!("{}°", t.round() as i64))
                .unwrap_or_else(unknown),
            vertical_rate: s
                .vertical_rate
                .map(|v| format!("{} ft/min", (v * MS_TO_FEET_PER_MIN).round() as i64))
                .unwrap_or_else(unknown),
            position,
        }
    }
}

/// Short hover text for a flight marker
pub fn tooltip(flight: &ClassifiedFlight) -> String {
    let s = &flight.sample;
    let mut lines = vec![s.callsign.clone().unwrap_or_else(|| "Unknown".to_string())];

    if let Some(country) = &s.origin_country {
        lines.push(format!("Country: {}", country));
    }
    if let Some(alt) = s.geo_altitude {
        lines.push(format!("Altitude: {} ft", (alt * METERS_TO_FEET).round() as i64));
    }
    if let Some(v) = s.velocity {
        lines.push(format!("Speed: {} kts", (v * MS_TO_KNOTS).round() as i64));
    }
    lines.join("\n")
}

#[cfg(test)]
pub mod testing {
    //! A sink that records every call, for reconciliation tests

    use std::collections::HashSet;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum SinkCall {
        Create(String, u32),
        Update(u32),
        Destroy(u32),
        SetSelected(u32, bool),
        RenderDetail(String),
        HideDetail,
    }

    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub calls: Vec<SinkCall>,
        pub live: HashSet<u32>,
        next_handle: u32,
    }

    impl RecordingSink {
        pub fn take(&mut self) -> Vec<SinkCall> {
            std::mem::take(&mut self.calls)
        }

        pub fn count(&self, pred: impl Fn(&SinkCall) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }
    }

    impl ViewSink for RecordingSink {
        type Handle = u32;

        fn create(&mut self, identity: &str, _flight: &ClassifiedFlight) -> u32 {
            self.next_handle += 1;
            self.live.insert(self.next_handle);
            self.calls.push(SinkCall::Create(identity.to_string(), self.next_handle));
            self.next_handle
        }

        fn update(&mut self, handle: &u32, _flight: &ClassifiedFlight) {
            assert!(self.live.contains(handle), "update of unknown handle {}", handle);
            self.calls.push(SinkCall::Update(*handle));
        }

        fn destroy(&mut self, handle: &u32) {
            assert!(self.live.remove(handle), "destroy of unknown handle {}", handle);
            self.calls.push(SinkCall::Destroy(*handle));
        }

        fn set_selected_visual(&mut self, handle: &u32, selected: bool) {
            assert!(self.live.contains(handle), "select of unknown handle {}", handle);
            self.calls.push(SinkCall::SetSelected(*handle, selected));
        }

        fn render_detail(&mut self, flight: &ClassifiedFlight, _eta: Eta, _level: FlightLevel) {
            self.calls.push(SinkCall::RenderDetail(flight.identity().to_string()));
        }

        fn hide_detail(&mut self) {
            self.calls.push(SinkCall::HideDetail);
        }
    }
}
