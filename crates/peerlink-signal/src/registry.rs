//! Authoritative store of live rooms and their membership
//!
//! All room mutations go through [`DashMap`] entry locks, so the capacity
//! check-and-add in [`Registry::join_room`] is a single atomic step per
//! room: two racing joins on a one-slot room cannot both succeed.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use peerlink_core::id::generate_room_id;

use crate::connection::ConnHandle;
use crate::room::Room;

/// Single source of truth for room membership
///
/// Owns two maps: the rooms themselves and a connection-to-room index.
/// The index makes disconnect cleanup O(1) and upholds the invariant that
/// a connection occupies at most one room at a time.
pub struct Registry {
    /// Live rooms by id
    rooms: DashMap<String, Room>,

    /// Connection id to the room it currently occupies
    conn_rooms: DashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            conn_rooms: DashMap::new(),
        }
    }

    /// Create a room containing only `creator` and return its id
    pub fn create_room(&self, creator: ConnHandle) -> String {
        let room_id = generate_room_id();
        let conn_id = creator.id().to_owned();

        self.rooms
            .insert(room_id.clone(), Room::new(room_id.clone(), creator));
        self.conn_rooms.insert(conn_id, room_id.clone());

        info!("Room {} created", room_id);
        room_id
    }

    /// Add `joiner` to a room, returning the other members for notification
    pub fn join_room(
        &self,
        room_id: &str,
        joiner: ConnHandle,
    ) -> Result<Vec<ConnHandle>, JoinError> {
        let mut room = self.rooms.get_mut(room_id).ok_or(JoinError::RoomNotFound)?;

        let others = room.other_members(joiner.id());
        let conn_id = joiner.id().to_owned();
        room.add_member(joiner).map_err(|_| JoinError::RoomFull)?;
        self.conn_rooms.insert(conn_id.clone(), room_id.to_owned());

        info!("Connection {} joined room {}", conn_id, room_id);
        Ok(others)
    }

    /// Room a connection currently occupies, if any
    pub fn current_room(&self, conn_id: &str) -> Option<String> {
        self.conn_rooms.get(conn_id).map(|r| r.value().clone())
    }

    /// Drop a connection's membership
    ///
    /// Returns the affected room id and its remaining members for
    /// notification, or `None` if the connection was in no room. Deleting
    /// an already-deleted room is a no-op, so this composes with the
    /// expiry sweep racing it.
    pub fn remove_connection(&self, conn_id: &str) -> Option<(String, Vec<ConnHandle>)> {
        let (_, room_id) = self.conn_rooms.remove(conn_id)?;
        let remaining = self.detach(&room_id, conn_id)?;
        Some((room_id, remaining))
    }

    /// Remove a member from a specific room, deleting the room if it empties
    ///
    /// Does not touch the membership index; used when the index already
    /// points elsewhere (a connection switching rooms). Returns the
    /// remaining members, or `None` if the room no longer exists.
    pub(crate) fn detach(&self, room_id: &str, conn_id: &str) -> Option<Vec<ConnHandle>> {
        let mut room = self.rooms.get_mut(room_id)?;
        room.remove_member(conn_id);
        let remaining = room.members().to_vec();

        if room.is_empty() {
            drop(room);
            self.rooms.remove(room_id);
            debug!("Room {} removed (empty)", room_id);
        }

        Some(remaining)
    }

    /// Members a relay message addressed to `room_id` should reach
    ///
    /// Everyone in the room except the sender. An empty result is a relay
    /// no-op, not an error: a solo room simply has nobody to forward to.
    /// Membership of the sender is deliberately not required.
    pub fn relay_targets(
        &self,
        room_id: &str,
        sender_id: &str,
    ) -> Result<Vec<ConnHandle>, RelayError> {
        let room = self.rooms.get(room_id).ok_or(RelayError::RoomNotFound)?;
        Ok(room.other_members(sender_id))
    }

    /// Remove every room older than `ttl` as of `now`
    ///
    /// Yields each evicted room's id and members for notification. One
    /// pass over current state per call.
    pub fn sweep_expired(&self, now: Instant, ttl: Duration) -> Vec<(String, Vec<ConnHandle>)> {
        let expired: Vec<String> = self
            .rooms
            .iter()
            .filter(|room| room.is_expired(now, ttl))
            .map(|room| room.id.clone())
            .collect();

        let mut evicted = Vec::new();
        for room_id in expired {
            if let Some((_, room)) = self.rooms.remove(&room_id) {
                let members = room.into_members();
                for member in &members {
                    // only clear index entries still pointing at this room
                    self.conn_rooms
                        .remove_if(member.id(), |_, current| current == &room_id);
                }
                info!("Room {} removed (expired)", room_id);
                evicted.push((room_id, members));
            }
        }
        evicted
    }

    /// Number of live rooms (for monitoring)
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of connections currently in a room (for monitoring)
    pub fn conn_count(&self) -> usize {
        self.conn_rooms.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Join failures, reported back to the requesting client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,
}

/// Relay failures, reported back to the sending client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Room not found")]
    RoomNotFound,
}
