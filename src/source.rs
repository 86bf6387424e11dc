//! Telemetry sources
//!
//!  A source produces one `Snapshot` per cycle. A failed fetch is an error,
//!  never an empty snapshot: the scheduler turns it into
//!  `Snapshot::Unavailable` so live flights are kept.
//!
//!  Both sources speak the OpenSky `/states/all` format, where every state
//!  vector is a positional JSON array.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::flight::RawSample;

pub const OPENSKY_STATES_URL: &str = "https://opensky-network.org/api/states/all";

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of one fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// A valid snapshot, possibly with zero aircraft
    Observed(Vec<RawSample>),
    /// Nothing is known about this cycle
    Unavailable,
}

impl Snapshot {
    /// Drop samples reported on the ground
    pub fn airborne_only(self) -> Self {
        match self {
            Snapshot::Observed(samples) => {
                Snapshot::Observed(samples.into_iter().filter(|s| !s.on_ground).collect())
            }
            Snapshot::Unavailable => Snapshot::Unavailable,
        }
    }
}

/// Geographic area requested from the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lamax: f64,
    pub lomin: f64,
    pub lomax: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        // Albania, Kosovo, North Macedonia
        Self {
            lamin: 40.5,
            lamax: 43.0,
            lomin: 19.0,
            lomax: 23.0,
        }
    }
}

impl BoundingBox {
    /// Parse `lamin,lamax,lomin,lomax`
    pub fn parse(s: &str) -> Option<Self> {
        let v: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<_>>()?;
        match v.as_slice() {
            &[lamin, lamax, lomin, lomax] if lamin < lamax && lomin < lomax => Some(Self {
                lamin,
                lamax,
                lomin,
                lomax,
            }),
            _ => None,
        }
    }
}

pub trait TelemetrySource {
    fn name(&self) -> &str;
    fn fetch(&mut self) -> impl Future<Output = Result<Snapshot>> + Send;
}

/// Live state vectors from the OpenSky Network REST API (anonymous access)
pub struct OpenSkySource {
    client: reqwest::Client,
    url: String,
    bbox: BoundingBox,
}

impl OpenSkySource {
    pub fn new(url: &str, bbox: BoundingBox) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            bbox,
        })
    }
}

impl TelemetrySource for OpenSkySource {
    fn name(&self) -> &str {
        "opensky"
    }

    async fn fetch(&mut self) -> Result<Snapshot> {
        let bbox = self.bbox;
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("lamin", bbox.lamin),
                ("lamax", bbox.lamax),
                ("lomin", bbox.lomin),
                ("lomax", bbox.lomax),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TrackerError::SourceUnavailable(format!("{} returned {}", self.url, status)));
        }

        let body = resp.text().await?;
        let samples = parse_states(&body)?;
        debug!("Fetched {} state vectors", samples.len());
        Ok(Snapshot::Observed(samples))
    }
}

/// Replays recorded OpenSky responses, one JSON document per line.
/// A `null` line stands for a failed fetch.
pub struct ReplaySource {
    lines: Vec<String>,
    pos: usize,
    looping: bool,
    exhausted: bool,
}

impl ReplaySource {
    pub fn from_lines(text: &str, looping: bool) -> Self {
        Self {
            lines: text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            pos: 0,
            looping,
            exhausted: false,
        }
    }

    pub fn load(path: impl AsRef<Path>, looping: bool) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_lines(&text, looping))
    }

    fn next_line(&mut self) -> Option<&str> {
        if self.pos >= self.lines.len() && self.looping {
            self.pos = 0;
        }
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(line)
    }
}

impl TelemetrySource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn fetch(&mut self) -> Result<Snapshot> {
        let line = match self.next_line() {
            Some(line) => line.to_string(),
            None => {
                if !self.exhausted {
                    self.exhausted = true;
                    warn!("Replay file exhausted, keeping last state");
                }
                return Ok(Snapshot::Unavailable);
            }
        };

        if line == "null" {
            return Err(TrackerError::SourceUnavailable("recorded fetch failure".to_string()));
        }
        Ok(Snapshot::Observed(parse_states(&line)?))
    }
}

/// The source selected on the command line
pub enum AnySource {
    OpenSky(OpenSkySource),
    Replay(ReplaySource),
}

impl AnySource {
    /// Replay file when one is given, the live API otherwise
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.replay {
            Some(path) => Ok(AnySource::Replay(ReplaySource::load(path, config.loop_replay)?)),
            None => Ok(AnySource::OpenSky(OpenSkySource::new(&config.url, config.bbox)?)),
        }
    }
}

impl TelemetrySource for AnySource {
    fn name(&self) -> &str {
        match self {
            AnySource::OpenSky(src) => src.name(),
            AnySource::Replay(src) => src.name(),
        }
    }

    async fn fetch(&mut self) -> Result<Snapshot> {
        match self {
            AnySource::OpenSky(src) => src.fetch().await,
            AnySource::Replay(src) => src.fetch().await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatesResponse {
    #[allow(dead_code)]
    time: Option<i64>,
    /// `null` when no aircraft are in the area
    states: Option<Vec<Vec<Value>>>,
}

/// Parse an OpenSky `/states/all` response body
pub fn parse_states(body: &str) -> Result<Vec<RawSample>> {
    let resp: StatesResponse = serde_json::from_str(body)?;
    Ok(resp
        .states
        .unwrap_or_default()
        .iter()
        .filter_map(|row| parse_state_vector(row))
        .collect())
}

/// One positional state vector. Rows without an ICAO address are dropped.
pub fn parse_state_vector(row: &[Value]) -> Option<RawSample> {
    let icao24 = row.first()?.as_str()?.trim();
    if icao24.is_empty() {
        return None;
    }

    let text = |i: usize| {
        row.get(i)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };
    let num = |i: usize| row.get(i).and_then(Value::as_f64);

    Some(RawSample {
        icao24: icao24.to_lowercase(),
        callsign: text(1),
        origin_country: text(2),
        longitude: num(5),
        latitude: num(6),
        baro_altitude: num(7),
        on_ground: row.get(8).and_then(Value::as_bool).unwrap_or(false),
        velocity: num(9),
        true_track: num(10),
        vertical_rate: num(11),
        geo_altitude: num(13),
        squawk: text(14),
    })
}
