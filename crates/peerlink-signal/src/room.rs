//! Room state for paired signaling sessions

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::connection::ConnHandle;
use crate::MAX_MEMBERS_PER_ROOM;

/// A two-party rendezvous point
pub struct Room {
    /// Identifier clients use to address this room
    pub id: String,

    /// Connected members, at most two
    members: Vec<ConnHandle>,

    /// When the room was created; drives expiry
    created_at: Instant,
}

impl Room {
    /// Create a new room containing only its creator
    pub fn new(id: String, creator: ConnHandle) -> Self {
        Self {
            id,
            members: vec![creator],
            created_at: Instant::now(),
        }
    }

    /// Add a member, capacity-checked
    pub fn add_member(&mut self, conn: ConnHandle) -> Result<(), RoomError> {
        if self.members.len() >= MAX_MEMBERS_PER_ROOM {
            return Err(RoomError::RoomFull);
        }
        self.members.push(conn);
        Ok(())
    }

    /// Remove a member by connection id; true if it was present
    pub fn remove_member(&mut self, conn_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id() != conn_id);
        self.members.len() < before
    }

    /// Every member other than `conn_id`
    pub fn other_members(&self, conn_id: &str) -> Vec<ConnHandle> {
        self.members
            .iter()
            .filter(|m| m.id() != conn_id)
            .cloned()
            .collect()
    }

    /// Current members
    pub fn members(&self) -> &[ConnHandle] {
        &self.members
    }

    /// Consume the room, yielding its members
    pub fn into_members(self) -> Vec<ConnHandle> {
        self.members
    }

    /// Number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Check if the room is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the room has outlived `ttl` as of `now`
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.created_at) > ttl
    }
}

/// Room errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,
}
