//! HTTP surface for flightwatch
//!
//!  A minimal HTTP/1.1 server in the spirit of dump1090's:
//!
//!  - `GET /data.json[?airport=PRN&q=wzz]` live flights
//!  - `GET /detail.json` detail view of the selected flight, or `null`
//!  - `GET /select/<id>` and `GET /clear` selection intents

use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::engine::EngineCommand;
use crate::query::FlightFilter;

pub async fn run_http_server(
    port: u16,
    board: Arc<RwLock<Board>>,
    commands: Sender<EngineCommand>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("HTTP server listening on port {}", port);

    loop {
        let (socket, addr) = listener.accept().await?;
        debug!("HTTP client connected: {}", addr);

        let board = Arc::clone(&board);
        let commands = commands.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_http_request(socket, board, commands).await {
                debug!("HTTP error: {}", e);
            }
        });
    }
}

async fn handle_http_request(
    mut socket: TcpStream,
    board: Arc<RwLock<Board>>,
    commands: Sender<EngineCommand>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buffer = vec![0u8; 8192];
    let n = socket.read(&mut buffer).await?;

    if n == 0 {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&buffer[..n]);
    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();

    if parts.len() < 2 {
        return Ok(());
    }

    let (status, body) = route(parts[1], &board, &commands);
    let header = format!(
        "HTTP/1.1 {}\r\n\
         Server: flightwatch\r\n\
         Content-Type: application/json;charset=utf-8\r\n\
         Connection: close\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         \r\n",
        status,
        body.len()
    );

    socket.write_all(header.as_bytes()).await?;
    socket.write_all(body.as_bytes()).await?;

    Ok(())
}

/// Map a request target to a status line and JSON body
fn route(url: &str, board: &RwLock<Board>, commands: &Sender<EngineCommand>) -> (&'static str, String) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match path {
        "/data.json" => ("200 OK", flights_to_json(board, &FlightFilter::from_query(query))),
        "/detail.json" => {
            let body = serde_json::to_string(&board.read().detail()).unwrap_or_else(|_| "null".into());
            ("200 OK", body)
        }
        "/clear" => send(commands, EngineCommand::ClearSelection),
        _ => match path.strip_prefix("/select/") {
            Some(id) if is_identity(id) => send(commands, EngineCommand::Select(id.to_lowercase())),
            Some(_) => ("400 Bad Request", r#"{"error":"invalid identity"}"#.to_string()),
            None => ("404 Not Found", r#"{"error":"not found"}"#.to_string()),
        },
    }
}

fn send(commands: &Sender<EngineCommand>, cmd: EngineCommand) -> (&'static str, String) {
    match commands.send(cmd) {
        Ok(()) => ("200 OK", r#"{"ok":true}"#.to_string()),
        Err(e) => {
            warn!("Engine is not running: {}", e);
            ("503 Service Unavailable", r#"{"ok":false}"#.to_string())
        }
    }
}

/// Identities are opaque; sources store them lowercased
fn is_identity(id: &str) -> bool {
    !id.is_empty() && !id.contains('/')
}

/// JSON array of the live flights matching `filter`
fn flights_to_json(board: &RwLock<Board>, filter: &FlightFilter) -> String {
    let board = board.read();
    let rows: Vec<_> = board
        .markers()
        .into_iter()
        .filter(|m| filter.matches(&m.flight))
        .map(|m| m.to_row())
        .collect();
    serde_json::to_string(&rows).unwrap_or_else(|_| "[]".into())
}
