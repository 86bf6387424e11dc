//!   flightwatch:   live flight board around regional airports
//!
//!  Polls aircraft state vectors for a bounding box, classifies every
//!  aircraft against the nearby airports and keeps a stable board of
//!  tracked flights with a single selection.
//!

mod airport;
mod board;
mod classifier;
mod config;
mod engine;
mod error;
mod eta;
mod flight;
mod geodesy;
mod network;
mod query;
mod reconciler;
mod selection;
mod source;
mod view;

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::airport::AirportRegistry;
use crate::board::{Board, BoardSink};
use crate::config::Config;
use crate::engine::EngineCommand;
use crate::reconciler::Reconciler;
use crate::source::{AnySource, Snapshot, TelemetrySource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_args();

    // Initialize logging only if not in interactive mode
    if !config.interactive {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
        info!("flightwatch starting...");
        info!("Configuration: {:?}", config);
    }

    let airports = match &config.airports {
        Some(path) => AirportRegistry::load(path)?,
        None => AirportRegistry::builtin(),
    };
    info!("Tracking {} airports", airports.len());

    let source = AnySource::from_config(&config)?;

    let board = Arc::new(RwLock::new(Board::default()));
    let (cmd_tx, cmd_rx): (Sender<EngineCommand>, Receiver<EngineCommand>) = unbounded();

    if let Some(id) = &config.select {
        cmd_tx.send(EngineCommand::Select(id.clone()))?;
    }

    // The engine thread owns the reconciler; everything else talks to it by message
    let engine_handle = {
        let sink = BoardSink::new(Arc::clone(&board));
        thread::Builder::new().name("engine".into()).spawn(move || {
            let mut reconciler = Reconciler::new(airports, sink);
            engine::run_engine(cmd_rx, &mut reconciler)
        })?
    };

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let net_handle = if config.net {
            let board = Arc::clone(&board);
            let tx = cmd_tx.clone();
            let port = config.net_http_port;
            Some(tokio::spawn(async move {
                if let Err(e) = network::run_http_server(port, board, tx).await {
                    error!("Network error: {}", e);
                }
            }))
        } else {
            None
        };

        let interactive_handle = if config.interactive {
            let board = Arc::clone(&board);
            let rows = config.interactive_rows;
            Some(tokio::spawn(async move {
                interactive_display(board, rows).await;
            }))
        } else {
            None
        };

        let poller_handle = spawn_poller(source, &config, cmd_tx.clone());

        tokio::signal::ctrl_c().await.ok();

        // Cleanup
        poller_handle.abort();
        if let Some(h) = net_handle {
            h.abort();
        }
        if let Some(h) = interactive_handle {
            h.abort();
        }
    });

    cmd_tx.send(EngineCommand::Shutdown).ok();
    match engine_handle.join() {
        Ok(result) => result?,
        Err(_) => error!("Engine thread panicked"),
    }

    Ok(())
}

fn spawn_poller<S>(source: S, config: &Config, tx: Sender<EngineCommand>) -> tokio::task::JoinHandle<()>
where
    S: TelemetrySource + Send + 'static,
{
    let interval = config.interval();
    let airborne_only = config.airborne_only;
    tokio::spawn(async move {
        run_poller(source, interval, airborne_only, tx).await;
    })
}

/// Fetch one snapshot per tick and hand it to the engine.
///
/// The fetch is awaited before the next tick, so cycles are never issued
/// concurrently. Fetch errors become `Snapshot::Unavailable`.
async fn run_poller<S: TelemetrySource>(
    mut source: S,
    period: Duration,
    airborne_only: bool,
    tx: Sender<EngineCommand>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Polling {} every {:?}", source.name(), period);

    loop {
        interval.tick().await;

        let snapshot = match source.fetch().await {
            Ok(snapshot) if airborne_only => snapshot.airborne_only(),
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Fetch from {} failed, keeping previous state: {}", source.name(), e);
                Snapshot::Unavailable
            }
        };

        if tx.send(EngineCommand::Cycle(snapshot)).is_err() {
            error!("Engine is gone, stopping poller");
            break;
        }
    }
}

async fn interactive_display(board: Arc<RwLock<Board>>, max_rows: usize) {
    let refresh_interval = Duration::from_millis(500);

    loop {
        tokio::time::sleep(refresh_interval).await;

        // Clear screen and move cursor to top
        print!("\x1B[2J\x1B[H");
        let _ = io::stdout().flush();

        // ANSI color codes
        const CYAN: &str = "\x1B[96m";
        const YELLOW: &str = "\x1B[93m";
        const GREEN: &str = "\x1B[92m";
        const BOLD: &str = "\x1B[1m";
        const RESET: &str = "\x1B[0m";

        println!(
            "{BOLD}{:<6} {:<8} {:<9} {:>4} {:>7} {:>4} {:>7} {:>5} {:>5} {:<18}{RESET}",
            "Hex", "Flight", "Status", "Apt", "Dist", "Brg", "Alt", "Spd", "Trk", "ETA"
        );
        println!("{}", "-".repeat(85));

        let board = board.read();
        let markers = board.markers();
        let count = markers.len();

        for m in markers.iter().take(max_rows) {
            let row = m.to_row();
            let status_color = match row.status.as_str() {
                "Arriving" => YELLOW,
                "Departing" => GREEN,
                _ => "",
            };
            let nearest = m.flight.nearest.as_ref().map(|ap| ap.code.as_str()).unwrap_or("");
            // Bearing from the nearest airport to the aircraft
            let brg = match (&m.flight.nearest, m.flight.position()) {
                (Some(ap), Some(pos)) => {
                    format!("{:.0}°", geodesy::initial_bearing(ap.lat, ap.lon, pos.lat, pos.lon))
                }
                _ => String::new(),
            };
            let dist = row.distance_km.map(|d| format!("{:.1}km", d)).unwrap_or_default();
            let alt = row.altitude.map(|a| a.to_string()).unwrap_or_default();
            let spd = row.speed.map(|s| s.to_string()).unwrap_or_default();
            let trk = row.track.map(|t| format!("{:.0}", t)).unwrap_or_default();

            let line = format!(
                "{:<6} {:<8} {status_color}{:<9}{RESET} {:>4} {:>7} {:>4} {:>7} {:>5} {:>5} {:<18}",
                row.hex, row.flight, row.status, nearest, dist, brg, alt, spd, trk, row.eta
            );
            if m.selected {
                println!("{CYAN}{BOLD}>{RESET} {}", line);
            } else {
                println!("  {}", line);
            }
        }

        println!("{}", "-".repeat(85));
        if let Some(d) = board.detail() {
            println!("{BOLD}{} ({}){RESET}  {}  {}", d.callsign, d.icao24, d.status, d.origin_country);
            println!("  Nearest: {}   ETA: {}   Squawk: {}", d.nearest_airport, d.eta, d.squawk);
            println!(
                "  Alt: {}  {}  Speed: {}  Heading: {}  V/S: {}",
                d.altitude, d.flight_level, d.speed, d.heading, d.vertical_rate
            );
            println!("  {}", d.position);
            println!("{}", "-".repeat(85));
        }
        println!("Aircraft: {} | Ctrl+C to exit", count);

        io::stdout().flush().ok();
    }
}
