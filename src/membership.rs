//! Session → room mapping
//!
//! Answers "which room is this session in" so that `send` does not need the
//! caller to name the room.

use std::collections::HashMap;

use crate::types::{RoomName, SessionId};

/// At most one room per session; a missing entry means "not in any room".
#[derive(Debug, Default)]
pub struct MembershipTracker {
    rooms: HashMap<SessionId, RoomName>,
}

impl MembershipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `session_id` is now in `room`.
    ///
    /// Any previous edge is replaced, never kept alongside. Returns the
    /// room the session was in before.
    pub fn set_room(&mut self, session_id: SessionId, room: RoomName) -> Option<RoomName> {
        self.rooms.insert(session_id, room)
    }

    /// Current room of `session_id`, if any
    pub fn get_room(&self, session_id: SessionId) -> Option<&RoomName> {
        self.rooms.get(&session_id)
    }

    /// Remove the membership edge. Returns the room it pointed to.
    pub fn clear_room(&mut self, session_id: SessionId) -> Option<RoomName> {
        self.rooms.remove(&session_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SessionId, &RoomName)> {
        self.rooms.iter().map(|(id, room)| (*id, room))
    }

    /// Number of sessions currently in a room
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
