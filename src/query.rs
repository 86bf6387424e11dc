//! Flight list filtering by airport and free-text search

use crate::flight::ClassifiedFlight;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightFilter {
    /// Airport code; only flights inside that airport's radius match
    pub airport: Option<String>,
    /// Case-insensitive substring of callsign or origin country
    pub search: Option<String>,
}

impl FlightFilter {
    /// Parse a URL query string such as `airport=PRN&q=wzz`
    pub fn from_query(query: &str) -> Self {
        let mut filter = FlightFilter::default();
        for pair in query.split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.replace('+', " ").trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key {
                "airport" if !value.eq_ignore_ascii_case("all") => filter.airport = Some(value),
                "q" | "search" => filter.search = Some(value.to_lowercase()),
                _ => {}
            }
        }
        filter
    }

    pub fn matches(&self, flight: &ClassifiedFlight) -> bool {
        if let Some(code) = &self.airport {
            match flight.airport_in_range() {
                Some(ap) if ap.code.eq_ignore_ascii_case(code) => {}
                _ => return false,
            }
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = |field: &Option<String>| {
                field.as_deref().is_some_and(|v| v.to_lowercase().contains(&term))
            };
            if !hit(&flight.sample.callsign) && !hit(&flight.sample.origin_country) {
                return false;
            }
        }
        true
    }
}
