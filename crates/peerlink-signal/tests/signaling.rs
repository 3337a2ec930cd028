//! End-to-end tests driving the server over real WebSocket connections

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use peerlink_core::config::RoomConfig;
use peerlink_signal::SignalServer;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(rooms: RoomConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = SignalServer::new(rooms);
    tokio::spawn(async move {
        let _ = server.serve_listener(listener).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    ws
}

async fn send(ws: &mut WsClient, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

async fn recv(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Create a room on `ws` and return its id
async fn create_room(ws: &mut WsClient) -> String {
    send(ws, json!({"type": "create_room"})).await;
    let reply = recv(ws).await;
    assert_eq!(reply["type"], "room_created");
    reply["roomId"].as_str().unwrap().to_owned()
}

/// A connected pair sharing a room: (creator, joiner, room id)
async fn paired_clients(addr: SocketAddr) -> (WsClient, WsClient, String) {
    let mut creator = connect(addr).await;
    let mut joiner = connect(addr).await;

    let room_id = create_room(&mut creator).await;

    send(&mut joiner, json!({"type": "join_room", "roomId": room_id})).await;
    let reply = recv(&mut joiner).await;
    assert_eq!(reply["type"], "room_joined");
    assert_eq!(reply["roomId"], room_id.as_str());

    let notice = recv(&mut creator).await;
    assert_eq!(notice["type"], "peer_joined");
    assert_eq!(notice["roomId"], room_id.as_str());

    (creator, joiner, room_id)
}

#[tokio::test]
async fn test_create_and_join_lifecycle() {
    let addr = start_server(RoomConfig::default()).await;
    let (_creator, _joiner, room_id) = paired_clients(addr).await;
    assert_eq!(room_id.len(), 8);
}

#[tokio::test]
async fn test_relay_round_trip_is_verbatim() {
    let addr = start_server(RoomConfig::default()).await;
    let (mut creator, mut joiner, room_id) = paired_clients(addr).await;

    let offer = json!({
        "type": "offer",
        "roomId": room_id,
        "sdp": "v=0\r\no=- 46117 2 IN IP4 127.0.0.1\r\n",
        "meta": {"trickle": true}
    });
    send(&mut creator, offer.clone()).await;
    assert_eq!(recv(&mut joiner).await, offer);

    let answer = json!({"type": "answer", "roomId": room_id, "sdp": "v=0..."});
    send(&mut joiner, answer.clone()).await;
    assert_eq!(recv(&mut creator).await, answer);

    let candidate = json!({
        "type": "ice_candidate",
        "roomId": room_id,
        "candidate": "candidate:1 1 UDP 2122252543 192.0.2.1 54400 typ host"
    });
    send(&mut creator, candidate.clone()).await;
    assert_eq!(recv(&mut joiner).await, candidate);
}

#[tokio::test]
async fn test_join_unknown_room_is_an_error() {
    let addr = start_server(RoomConfig::default()).await;
    let mut client = connect(addr).await;

    send(&mut client, json!({"type": "join_room", "roomId": "nope1234"})).await;
    let reply = recv(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Room not found");
}

#[tokio::test]
async fn test_third_client_is_rejected() {
    let addr = start_server(RoomConfig::default()).await;
    let (_creator, _joiner, room_id) = paired_clients(addr).await;

    let mut third = connect(addr).await;
    send(&mut third, json!({"type": "join_room", "roomId": room_id})).await;
    let reply = recv(&mut third).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Room is full");
}

#[tokio::test]
async fn test_unknown_and_malformed_messages() {
    let addr = start_server(RoomConfig::default()).await;
    let mut client = connect(addr).await;

    send(&mut client, json!({"type": "shout"})).await;
    let reply = recv(&mut client).await;
    assert_eq!(reply["message"], "Unknown message type");

    client
        .send(Message::Text("{definitely not json".into()))
        .await
        .unwrap();
    let reply = recv(&mut client).await;
    assert_eq!(reply["message"], "Invalid message format");

    // the connection survives both
    send(&mut client, json!({"type": "create_room"})).await;
    assert_eq!(recv(&mut client).await["type"], "room_created");
}

#[tokio::test]
async fn test_disconnect_notifies_peer() {
    let addr = start_server(RoomConfig::default()).await;
    let (mut creator, mut joiner, room_id) = paired_clients(addr).await;

    joiner.close(None).await.unwrap();

    let notice = recv(&mut creator).await;
    assert_eq!(notice["type"], "peer_left");
    assert_eq!(notice["roomId"], room_id.as_str());

    // room is kept while one member remains, so a new peer can join
    let mut replacement = connect(addr).await;
    send(
        &mut replacement,
        json!({"type": "join_room", "roomId": room_id}),
    )
    .await;
    assert_eq!(recv(&mut replacement).await["type"], "room_joined");
}

#[tokio::test]
async fn test_expired_room_notifies_members() {
    let rooms = RoomConfig {
        ttl_secs: 0,
        sweep_interval_secs: 1,
    };
    let addr = start_server(rooms).await;
    let mut client = connect(addr).await;
    create_room(&mut client).await;

    let notice = recv(&mut client).await;
    assert_eq!(notice["type"], "error");
    assert_eq!(notice["message"], "Room expired");

    // notified, not disconnected: the relay still answers
    send(&mut client, json!({"type": "create_room"})).await;
    assert_eq!(recv(&mut client).await["type"], "room_created");
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = start_server(RoomConfig::default()).await;
    let (_creator, _joiner, _room_id) = paired_clients(addr).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains(r#""status":"healthy""#));
    assert!(response.contains(r#""rooms":1"#));
    assert!(response.contains(r#""connections":2"#));
}
