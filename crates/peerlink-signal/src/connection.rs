//! Outbound handle for a connected client
//!
//! Each WebSocket connection owns a writer task draining an unbounded
//! channel into its sink. A [`ConnHandle`] is the cheap, cloneable sending
//! side of that channel plus the connection's identity; it is what the
//! registry stores as a room member.

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::messages::ServerMessage;

/// Handle to a connected client's outbound channel
#[derive(Clone, Debug)]
pub struct ConnHandle {
    id: String,
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnHandle {
    /// Wrap an existing channel sender
    pub fn new(id: String, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { id, tx }
    }

    /// Create a handle together with the receiving end of its channel
    pub fn channel(id: String) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, tx), rx)
    }

    /// The connection id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Encode and send a protocol message, best-effort
    ///
    /// Sends to a closed connection are silently dropped; notification
    /// delivery is never escalated to the peer that triggered it.
    pub fn send(&self, msg: &ServerMessage) {
        if let Ok(json) = msg.to_json() {
            let _ = self.tx.send(Message::Text(json));
        }
    }

    /// Forward a raw text frame unmodified, best-effort
    pub fn send_raw(&self, text: &str) {
        let _ = self.tx.send(Message::Text(text.to_owned()));
    }

    /// Send a transport-level frame (pong replies)
    pub(crate) fn send_frame(&self, frame: Message) {
        let _ = self.tx.send(frame);
    }

    /// Whether the connection's writer is still draining the channel
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_delivers_encoded_message() {
        let (conn, mut rx) = ConnHandle::channel("abc".into());
        conn.send(&ServerMessage::error("Room not found"));

        match rx.try_recv().unwrap() {
            Message::Text(text) => assert!(text.contains("Room not found")),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_send_after_close_is_silent() {
        let (conn, rx) = ConnHandle::channel("abc".into());
        assert!(conn.is_open());

        drop(rx);
        assert!(!conn.is_open());
        // must not panic or error
        conn.send(&ServerMessage::error("Room expired"));
        conn.send_raw("{}");
    }
}
