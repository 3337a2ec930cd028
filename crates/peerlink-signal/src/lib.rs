//! Peerlink Signaling Server
//!
//! Pairs exactly two peers through a shared room id and relays their
//! session negotiation (offers, answers, ICE candidates) over WebSockets.
//! The server only brokers the handshake; negotiation payloads pass
//! through opaque and untouched.
//!
//! # Protocol
//!
//! 1. The first peer creates a room and shares the room id out of band
//! 2. The second peer joins the room using that id
//! 3. Both sides exchange negotiation messages through the relay
//! 4. Peers connect directly; the abandoned room empties out or expires

pub mod connection;
pub mod messages;
pub mod registry;
pub mod room;
pub mod server;

pub use connection::ConnHandle;
pub use messages::{ClientMessage, ServerMessage};
pub use registry::{JoinError, Registry, RelayError};
pub use room::Room;
pub use server::SignalServer;

/// Maximum members per room
pub const MAX_MEMBERS_PER_ROOM: usize = 2;
