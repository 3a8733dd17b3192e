//! Room and room registry
//!
//! A room is a named set of sessions that receive each other's messages.
//! Rooms are created on first join and reclaimed as soon as they empty.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::session::Session;
use crate::types::{RoomName, SessionId};

/// Chat room
///
/// Members are keyed by `SessionId`, so a session can never be listed twice.
#[derive(Debug)]
pub struct Room {
    /// Room name for identification
    pub name: RoomName,
    /// Current occupants
    members: HashMap<SessionId, Session>,
}

impl Room {
    /// Create a new, empty room
    pub fn new(name: RoomName) -> Self {
        Self {
            name,
            members: HashMap::new(),
        }
    }

    /// Add a member. Returns false if the session was already a member.
    pub fn add_member(&mut self, session: Session) -> bool {
        if self.members.contains_key(&session.id) {
            return false;
        }
        self.members.insert(session.id, session);
        true
    }

    /// Remove a member. Returns false if the session was not a member.
    pub fn remove_member(&mut self, session_id: SessionId) -> bool {
        self.members.remove(&session_id).is_some()
    }

    /// Check if a session is in this room
    pub fn contains(&self, session_id: SessionId) -> bool {
        self.members.contains_key(&session_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Get the number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.members.keys().copied()
    }

    /// Write `payload` to every member except `sender`.
    ///
    /// Failures are logged per recipient and never stop the fan-out.
    /// Returns the number of members the payload was queued for.
    pub fn broadcast(&self, sender: SessionId, payload: &str) -> usize {
        let mut delivered = 0;
        for (id, member) in &self.members {
            if *id == sender {
                continue;
            }
            match member.write(payload) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Dropped message in room {} for {}: {}", self.name, id, e),
            }
        }
        delivered
    }
}

/// Room name → room, for every room with at least one member
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomName, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `session` into `room`, creating the room if absent.
    ///
    /// Idempotent for a session that is already a member.
    /// Returns true if the room was created by this call.
    pub fn add_member(&mut self, room: &RoomName, session: Session) -> bool {
        let created = !self.rooms.contains_key(room);
        let entry = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| Room::new(room.clone()));
        if created {
            debug!("Room {} created", room);
        }
        entry.add_member(session);
        created
    }

    /// Remove `session_id` from `room` if present, reclaiming the room when
    /// it becomes empty. Returns true if the session was a member.
    pub fn remove_member(&mut self, room: &RoomName, session_id: SessionId) -> bool {
        let Some(entry) = self.rooms.get_mut(room) else {
            return false;
        };

        let removed = entry.remove_member(session_id);

        if entry.is_empty() {
            self.rooms.remove(room);
            debug!("Room {} reclaimed (empty)", room);
        }

        removed
    }

    /// Deliver `payload` to every member of `room` except `sender`.
    ///
    /// Silent no-op for a room that does not exist.
    pub fn broadcast(&self, room: &RoomName, sender: SessionId, payload: &str) -> usize {
        self.rooms
            .get(room)
            .map_or(0, |entry| entry.broadcast(sender, payload))
    }

    /// Member IDs of `room`; empty if the room does not exist
    pub fn members(&self, room: &str) -> Vec<SessionId> {
        self.rooms
            .get(room)
            .map(|entry| entry.member_ids().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room: &str, session_id: SessionId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|entry| entry.contains(session_id))
    }

    pub fn get(&self, room: &str) -> Option<&Room> {
        self.rooms.get(room)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Number of live (non-empty) rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
