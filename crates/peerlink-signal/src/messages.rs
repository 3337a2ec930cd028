//! Signaling protocol messages
//!
//! JSON text frames tagged by a `type` field. Relay payloads (`offer`,
//! `answer`, `ice_candidate`) carry application fields the server never
//! decodes; only the envelope is parsed here.

use serde::{Deserialize, Serialize};

/// Messages received from clients
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a fresh room containing only the sender
    CreateRoom,

    /// Join an existing room by id
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: Option<String>,
    },

    /// Session description offer, relayed verbatim
    Offer {
        #[serde(rename = "roomId")]
        room_id: Option<String>,
    },

    /// Session description answer, relayed verbatim
    Answer {
        #[serde(rename = "roomId")]
        room_id: Option<String>,
    },

    /// Connectivity candidate, relayed verbatim
    IceCandidate {
        #[serde(rename = "roomId")]
        room_id: Option<String>,
    },
}

/// Messages sent to clients
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Room created for the sender
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// Sender joined the room
    RoomJoined {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// The other peer joined the sender's room
    PeerJoined {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// The other peer left the sender's room
    PeerLeft {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// Error response
    Error { message: String },
}

impl ClientMessage {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether a `type` tag names an inbound message kind
    pub fn is_known_kind(kind: &str) -> bool {
        matches!(
            kind,
            "create_room" | "join_room" | "offer" | "answer" | "ice_candidate"
        )
    }
}

impl ServerMessage {
    /// Create an error message
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parsing() {
        let msg = ClientMessage::from_json(r#"{"type":"create_room"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::CreateRoom));

        let msg = ClientMessage::from_json(r#"{"type":"join_room","roomId":"abc123"}"#).unwrap();
        match msg {
            ClientMessage::JoinRoom { room_id } => assert_eq!(room_id.as_deref(), Some("abc123")),
            _ => panic!("wrong message type"),
        }
    }

    #[test]
    fn test_relay_envelope_ignores_payload_fields() {
        let msg = ClientMessage::from_json(
            r#"{"type":"offer","roomId":"abc123","sdp":"v=0...","extra":{"nested":true}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Offer { room_id } => assert_eq!(room_id.as_deref(), Some("abc123")),
            _ => panic!("wrong message type"),
        }
    }

    #[test]
    fn test_missing_room_id_parses_as_none() {
        let msg = ClientMessage::from_json(r#"{"type":"join_room"}"#).unwrap();
        match msg {
            ClientMessage::JoinRoom { room_id } => assert!(room_id.is_none()),
            _ => panic!("wrong message type"),
        }
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        assert!(ClientMessage::from_json(r#"{"type":"dance"}"#).is_err());
        assert!(!ClientMessage::is_known_kind("dance"));
        assert!(ClientMessage::is_known_kind("ice_candidate"));
    }

    #[test]
    fn test_server_message_serialization() {
        let json = ServerMessage::RoomCreated {
            room_id: "abc123".into(),
        }
        .to_json()
        .unwrap();
        assert!(json.contains("room_created"));
        assert!(json.contains(r#""roomId":"abc123""#));

        let json = ServerMessage::error("Room not found").to_json().unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains("Room not found"));
    }
}
