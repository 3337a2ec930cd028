//! WebSocket signaling server implementation

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info};

use peerlink_core::config::RoomConfig;
use peerlink_core::id::generate_conn_id;

use crate::connection::ConnHandle;
use crate::messages::{ClientMessage, ServerMessage};
use crate::registry::Registry;

/// Signaling server state
pub struct SignalServer {
    /// Room membership, shared with every connection task and the sweeper
    registry: Arc<Registry>,
    /// Room lifetime settings
    rooms: RoomConfig,
}

impl SignalServer {
    pub fn new(rooms: RoomConfig) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            rooms,
        }
    }

    /// Bind and serve forever
    pub async fn serve(&self, addr: SocketAddr) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        info!("Signaling server listening on {}", addr);
        self.serve_listener(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve_listener(&self, listener: TcpListener) -> Result<(), std::io::Error> {
        // Room expiry sweeper, independent of connection traffic
        let registry = self.registry.clone();
        let ttl = Duration::from_secs(self.rooms.ttl_secs);
        let interval = Duration::from_secs(self.rooms.sweep_interval_secs);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                sweep_expired_rooms(&registry, ttl);
            }
        });

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let registry = self.registry.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, registry).await {
                    debug!("Connection error from {}: {:?}", peer_addr, e);
                }
            });
        }
    }
}

/// Evict rooms past their ttl and notify the members still reachable
fn sweep_expired_rooms(registry: &Registry, ttl: Duration) {
    for (_, members) in registry.sweep_expired(Instant::now(), ttl) {
        for member in members.iter().filter(|m| m.is_open()) {
            member.send(&ServerMessage::error("Room expired"));
        }
    }
}

/// Handle a single connection (HTTP probe or WebSocket)
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Arc<Registry>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Peek at the request line to pick off plain HTTP health probes; the
    // WebSocket upgrade is also a GET, so key on the path
    let mut peek_buf = [0u8; 16];
    let n = stream.peek(&mut peek_buf).await?;
    let head = &peek_buf[..n];

    if head.starts_with(b"GET /health") || head.starts_with(b"GET /stats") {
        return handle_http_request(&mut stream, &registry).await;
    }

    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let conn_id = generate_conn_id();
    debug!("Client connected from {} as {}", peer_addr, conn_id);

    // Writer task drains the handle's channel into the sink, so room
    // peers can push frames to this connection at any time
    let (conn, mut outbound) = ConnHandle::channel(conn_id.clone());
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if ws_sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(data)) => {
                conn.send_frame(Message::Pong(data));
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                debug!("WebSocket error from {}: {:?}", conn_id, e);
                break;
            }
        };

        if let Some(reply) = handle_frame(&text, &conn, &registry) {
            conn.send(&reply);
        }
    }

    // Cleanup on disconnect
    leave_current_room(&conn, &registry);
    writer.abort();

    debug!("Client disconnected: {}", conn_id);
    Ok(())
}

/// Answer an HTTP request (health checks)
async fn handle_http_request(
    stream: &mut TcpStream,
    registry: &Registry,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buf = vec![0u8; 1024];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let (status, body) = match path {
        "/health" => (
            "200 OK",
            format!(
                r#"{{"status":"healthy","rooms":{},"connections":{}}}"#,
                registry.room_count(),
                registry.conn_count()
            ),
        ),
        "/stats" => (
            "200 OK",
            format!(
                r#"{{"rooms":{},"connections":{}}}"#,
                registry.room_count(),
                registry.conn_count()
            ),
        ),
        _ => ("404 Not Found", r#"{"error":"not found"}"#.to_string()),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    stream.write_all(response.as_bytes()).await?;
    Ok(())
}

/// Decode a text frame and dispatch it, returning the reply for the sender
fn handle_frame(text: &str, conn: &ConnHandle, registry: &Registry) -> Option<ServerMessage> {
    match ClientMessage::from_json(text) {
        Ok(msg) => handle_message(msg, text, conn, registry),
        Err(_) => {
            let message = match serde_json::from_str::<serde_json::Value>(text) {
                // A known kind that failed to decode has a bad envelope
                Ok(value)
                    if value
                        .get("type")
                        .and_then(serde_json::Value::as_str)
                        .is_some_and(ClientMessage::is_known_kind) =>
                {
                    "Invalid message format"
                }
                Ok(_) => "Unknown message type",
                Err(_) => "Invalid message format",
            };
            Some(ServerMessage::error(message))
        }
    }
}

/// Dispatch a decoded message
///
/// `raw` is the original frame text; relay kinds forward it verbatim so
/// the negotiation payload is never re-encoded.
fn handle_message(
    msg: ClientMessage,
    raw: &str,
    conn: &ConnHandle,
    registry: &Registry,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateRoom => {
            leave_current_room(conn, registry);
            let room_id = registry.create_room(conn.clone());
            Some(ServerMessage::RoomCreated { room_id })
        }

        ClientMessage::JoinRoom { room_id } => {
            let Some(room_id) = room_id else {
                return Some(ServerMessage::error("Room not found"));
            };

            // Rejoining the current room is a no-op acknowledgement
            let prev = registry.current_room(conn.id());
            if prev.as_deref() == Some(room_id.as_str()) {
                return Some(ServerMessage::RoomJoined { room_id });
            }

            match registry.join_room(&room_id, conn.clone()) {
                Ok(others) => {
                    // A successful switch sheds the old membership; a
                    // failed join leaves it untouched
                    if let Some(prev_id) = prev {
                        notify_peer_left(registry.detach(&prev_id, conn.id()), &prev_id);
                    }
                    for member in others.iter().filter(|m| m.is_open()) {
                        member.send(&ServerMessage::PeerJoined {
                            room_id: room_id.clone(),
                        });
                    }
                    Some(ServerMessage::RoomJoined { room_id })
                }
                Err(e) => Some(ServerMessage::error(e.to_string())),
            }
        }

        ClientMessage::Offer { room_id }
        | ClientMessage::Answer { room_id }
        | ClientMessage::IceCandidate { room_id } => {
            let Some(room_id) = room_id else {
                return Some(ServerMessage::error("Room not found"));
            };

            match registry.relay_targets(&room_id, conn.id()) {
                Ok(targets) => {
                    for target in targets.iter().filter(|t| t.is_open()) {
                        target.send_raw(raw);
                    }
                    None
                }
                Err(e) => Some(ServerMessage::error(e.to_string())),
            }
        }
    }
}

/// Drop the connection's room membership and tell whoever is left
///
/// Shared by the disconnect path and by create, which detaches from any
/// previous room so a connection never occupies two rooms at once.
fn leave_current_room(conn: &ConnHandle, registry: &Registry) {
    if let Some((room_id, remaining)) = registry.remove_connection(conn.id()) {
        notify_peer_left(Some(remaining), &room_id);
    }
}

/// Send `peer_left` to each still-open member of a vacated room
fn notify_peer_left(remaining: Option<Vec<ConnHandle>>, room_id: &str) {
    for member in remaining.iter().flatten().filter(|m| m.is_open()) {
        member.send(&ServerMessage::PeerLeft {
            room_id: room_id.to_owned(),
        });
    }
}
