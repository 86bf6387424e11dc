//! Configuration and command-line argument parsing

use std::env;
use std::time::Duration;

use crate::source::{BoundingBox, OPENSKY_STATES_URL};

#[derive(Debug, Clone)]
pub struct Config {
    // Source
    pub url: String,
    pub bbox: BoundingBox,
    /// Seconds between two fetches
    pub interval_secs: u64,
    /// Replay recorded responses instead of querying the live API
    pub replay: Option<String>,
    pub loop_replay: bool,
    /// Drop aircraft reported on the ground
    pub airborne_only: bool,

    // Reference data
    /// JSON airport registry, built-in registry when absent
    pub airports: Option<String>,

    // Output
    /// Identity selected at start-up
    pub select: Option<String>,
    pub interactive: bool,
    pub interactive_rows: usize,

    // Networking
    pub net: bool,
    pub net_http_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: OPENSKY_STATES_URL.to_string(),
            bbox: BoundingBox::default(),
            interval_secs: 5,
            replay: None,
            loop_replay: false,
            airborne_only: false,
            airports: None,
            select: None,
            interactive: false,
            interactive_rows: 20,
            net: false,
            net_http_port: 8080,
        }
    }
}

impl Config {
    pub fn from_args() -> Self {
        let args: Vec<String> = env::args().collect();
        match Self::parse(&args[1..]) {
            Ok(config) => config,
            Err(ParseOutcome::Help) => {
                print_help();
                std::process::exit(0);
            }
            Err(ParseOutcome::Invalid(msg)) => {
                eprintln!("{}", msg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    fn parse(args: &[String]) -> Result<Self, ParseOutcome> {
        let mut config = Config::default();

        let mut i = 0;
        while i < args.len() {
            let opt = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| ParseOutcome::Invalid(format!("Missing value for {}", opt)))
            };

            match opt {
                "--url" => config.url = value()?,
                "--bbox" => {
                    let v = value()?;
                    config.bbox = BoundingBox::parse(&v)
                        .ok_or_else(|| ParseOutcome::Invalid(format!("Invalid bounding box: {}", v)))?;
                }
                "--interval" => {
                    let v = value()?;
                    config.interval_secs = v
                        .parse()
                        .ok()
                        .filter(|s| *s > 0)
                        .ok_or_else(|| ParseOutcome::Invalid(format!("Invalid interval: {}", v)))?;
                }
                "--replay" => config.replay = Some(value()?),
                "--loop" => config.loop_replay = true,
                "--airborne-only" => config.airborne_only = true,
                "--airports" => config.airports = Some(value()?),
                "--select" => config.select = Some(value()?.trim().to_lowercase()),
                "--interactive" => config.interactive = true,
                "--interactive-rows" => {
                    config.interactive_rows = value()?.parse().unwrap_or(20);
                }
                "--net" => config.net = true,
                "--net-http-port" => {
                    let v = value()?;
                    config.net_http_port = v
                        .parse()
                        .map_err(|_| ParseOutcome::Invalid(format!("Invalid port: {}", v)))?;
                }
                "--help" => return Err(ParseOutcome::Help),
                _ => return Err(ParseOutcome::Invalid(format!("Unknown option: {}", opt))),
            }
            i += 1;
        }

        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug)]
enum ParseOutcome {
    Help,
    Invalid(String),
}

fn print_help() {
    println!(
        r#"flightwatch - live flight board around regional airports

Usage: flightwatch [OPTIONS]

Options:
  --url <url>             OpenSky states endpoint (default: {url})
  --bbox <a,b,c,d>        Area as lamin,lamax,lomin,lomax (default: 40.5,43.0,19.0,23.0)
  --interval <s>          Seconds between fetches (default: 5)
  --replay <file>         Replay recorded responses (one JSON document per line)
  --loop                  With --replay, start over at the end of the file
  --airborne-only         Ignore aircraft reported on the ground
  --airports <file>       JSON airport registry (default: built-in)
  --select <icao24>       Select an aircraft at start-up
  --interactive           Interactive board refreshing on screen
  --interactive-rows <N>  Max rows in interactive mode (default: 20)
  --net                   Enable the HTTP server
  --net-http-port <port>  HTTP server port (default: 8080)
  --help                  Show this help
"#,
        url = OPENSKY_STATES_URL
    );
}
