//! Room membership registry
//!
//! `ChatRegistry` owns both the room → members map and the session → room
//! map and only changes them together, so that:
//! - a session is listed in a room iff its membership points at that room
//! - a session is in at most one room
//! - a room never lists the same session twice
//!
//! The registry itself is plain data. The `ChatServer` actor owns the only
//! instance and applies operations one at a time.

use tracing::{debug, info};

use crate::error::AppError;
use crate::membership::MembershipTracker;
use crate::room::RoomRegistry;
use crate::session::Session;
use crate::types::{RoomName, SessionId};

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Room the session is now in
    pub room: RoomName,
    /// Room the session was moved out of, if it was elsewhere
    pub left: Option<RoomName>,
    /// Whether this join brought the room into existence
    pub created: bool,
}

#[derive(Debug, Default)]
pub struct ChatRegistry {
    rooms: RoomRegistry,
    memberships: MembershipTracker,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `session` in `room`, leaving its previous room first.
    ///
    /// Joining the room the session is already in changes nothing.
    pub fn join(&mut self, session: &Session, room: RoomName) -> JoinOutcome {
        if self.memberships.get_room(session.id) == Some(&room) {
            return JoinOutcome {
                room,
                left: None,
                created: false,
            };
        }

        let left = self.memberships.clear_room(session.id);
        if let Some(previous) = &left {
            self.rooms.remove_member(previous, session.id);
            info!("Session {} left room {}", session.id, previous);
        }

        let created = self.rooms.add_member(&room, session.clone());
        self.memberships.set_room(session.id, room.clone());
        info!("Session {} joined room {}", session.id, room);

        JoinOutcome {
            room,
            left,
            created,
        }
    }

    /// Take `session_id` out of its room. Returns the room it left, or
    /// `None` if it was not in one (calling twice is harmless).
    pub fn leave(&mut self, session_id: SessionId) -> Option<RoomName> {
        let room = self.memberships.clear_room(session_id)?;
        self.rooms.remove_member(&room, session_id);
        info!("Session {} left room {}", session_id, room);
        Some(room)
    }

    /// Broadcast `payload` from `session_id` to the rest of its room.
    ///
    /// Returns the number of recipients, or `AppError::NotInRoom`.
    pub fn send(&self, session_id: SessionId, payload: &str) -> Result<usize, AppError> {
        let room = self
            .memberships
            .get_room(session_id)
            .ok_or(AppError::NotInRoom)?;
        let delivered = self.rooms.broadcast(room, session_id, payload);
        debug!(
            "Session {} sent to room {} ({} recipients)",
            session_id, room, delivered
        );
        Ok(delivered)
    }

    /// Evict a session that went away. Same effect as `leave`.
    pub fn disconnect(&mut self, session_id: SessionId) -> Option<RoomName> {
        self.leave(session_id)
    }

    /// Current room of `session_id`
    pub fn room_of(&self, session_id: SessionId) -> Option<&RoomName> {
        self.memberships.get_room(session_id)
    }

    /// Members of `room`; empty if the room does not exist
    pub fn members(&self, room: &str) -> Vec<SessionId> {
        self.rooms.members(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// Number of sessions currently in some room
    pub fn member_count(&self) -> usize {
        self.memberships.len()
    }

    /// Check that both maps agree. Used by tests after every step.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        // membership edge => listed in that room
        for (id, room) in self.memberships.iter() {
            assert!(
                self.rooms.contains(room.as_str(), id),
                "session {id} mapped to {room} but not listed there"
            );
        }
        // listed in a room => membership edge to that room, and no empty rooms
        let mut listed = 0;
        for room in self.rooms.iter() {
            assert!(!room.is_empty(), "empty room {} not reclaimed", room.name);
            for id in room.member_ids() {
                assert_eq!(self.memberships.get_room(id), Some(&room.name));
                listed += 1;
            }
        }
        assert_eq!(listed, self.memberships.len());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tokio::sync::mpsc;

    use super::*;
    use crate::session::Outbound;

    fn session() -> (Session, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(16);
        (Session::new(SessionId::new(), tx), rx)
    }

    fn members(registry: &ChatRegistry, room: &str) -> HashSet<SessionId> {
        registry.members(room).into_iter().collect()
    }

    fn lines(rx: &mut mpsc::Receiver<Outbound>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            if let Outbound::Line(text) = item {
                out.push(text);
            }
        }
        out
    }

    #[test]
    fn test_join_creates_room() {
        let (x, _rx) = session();
        let mut registry = ChatRegistry::new();

        let outcome = registry.join(&x, RoomName::from("lobby"));

        assert!(outcome.created);
        assert_eq!(outcome.left, None);
        assert_eq!(members(&registry, "lobby"), HashSet::from([x.id]));
        assert_eq!(registry.room_of(x.id), Some(&RoomName::from("lobby")));
        registry.assert_consistent();
    }

    #[tokio::test]
    async fn test_send_reaches_others_not_sender() {
        let (x, mut rx) = session();
        let (y, mut ry) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&x, RoomName::from("lobby"));
        registry.join(&y, RoomName::from("lobby"));

        let delivered = registry.send(x.id, "hi\n").unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(lines(&mut ry), vec!["hi\n".to_string()]);
        assert!(lines(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_send_after_leave_reaches_nobody() {
        let (x, _rx) = session();
        let (y, mut ry) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&x, RoomName::from("lobby"));
        registry.join(&y, RoomName::from("lobby"));

        assert_eq!(registry.leave(x.id), Some(RoomName::from("lobby")));

        assert!(matches!(registry.send(x.id, "hi\n"), Err(AppError::NotInRoom)));
        assert!(lines(&mut ry).is_empty());
        assert_eq!(members(&registry, "lobby"), HashSet::from([y.id]));
        registry.assert_consistent();
    }

    #[test]
    fn test_rejoin_elsewhere_leaves_previous_room() {
        let (z, _rz) = session();
        let (other, _ro) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&other, RoomName::from("lobby"));
        registry.join(&z, RoomName::from("lobby"));

        let outcome = registry.join(&z, RoomName::from("office"));

        assert_eq!(outcome.left, Some(RoomName::from("lobby")));
        assert!(outcome.created);
        assert!(!members(&registry, "lobby").contains(&z.id));
        assert_eq!(members(&registry, "office"), HashSet::from([z.id]));
        assert_eq!(registry.room_of(z.id), Some(&RoomName::from("office")));
        registry.assert_consistent();
    }

    #[test]
    fn test_rejoin_last_member_reclaims_previous_room() {
        let (z, _rz) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&z, RoomName::from("lobby"));

        registry.join(&z, RoomName::from("office"));

        assert_eq!(registry.room_count(), 1);
        assert!(registry.members("lobby").is_empty());
        registry.assert_consistent();
    }

    #[test]
    fn test_join_same_room_twice() {
        let (x, _rx) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&x, RoomName::from("lobby"));

        let outcome = registry.join(&x, RoomName::from("lobby"));

        assert!(!outcome.created);
        assert_eq!(outcome.left, None);
        assert_eq!(registry.members("lobby"), vec![x.id]);
        registry.assert_consistent();
    }

    #[test]
    fn test_disconnect_evicts_member() {
        let (w, _rw) = session();
        let (y, _ry) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&w, RoomName::from("lobby"));
        registry.join(&y, RoomName::from("lobby"));

        assert_eq!(registry.disconnect(w.id), Some(RoomName::from("lobby")));

        assert!(!members(&registry, "lobby").contains(&w.id));
        assert!(registry.room_of(w.id).is_none());
        registry.assert_consistent();
    }

    #[test]
    fn test_leave_is_idempotent() {
        let (x, _rx) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&x, RoomName::from("lobby"));

        assert!(registry.leave(x.id).is_some());
        assert!(registry.leave(x.id).is_none());
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.member_count(), 0);
        registry.assert_consistent();
    }

    #[test]
    fn test_send_without_room() {
        let registry = ChatRegistry::new();

        assert!(matches!(
            registry.send(SessionId::new(), "hi"),
            Err(AppError::NotInRoom)
        ));
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let (a, _ra) = session();
        let (a2, mut ra2) = session();
        let (b, mut rb) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&a, RoomName::from("A"));
        registry.join(&a2, RoomName::from("A"));
        registry.join(&b, RoomName::from("B"));

        registry.send(a.id, "only A\n").unwrap();

        assert_eq!(lines(&mut ra2), vec!["only A\n".to_string()]);
        assert!(lines(&mut rb).is_empty());
    }

    #[tokio::test]
    async fn test_no_ghost_delivery_after_moving() {
        let (z, mut rz) = session();
        let (y, _ry) = session();
        let mut registry = ChatRegistry::new();
        registry.join(&z, RoomName::from("lobby"));
        registry.join(&y, RoomName::from("lobby"));
        registry.join(&z, RoomName::from("office"));

        registry.send(y.id, "lobby only\n").unwrap();

        assert!(lines(&mut rz).is_empty());
    }

    #[test]
    fn test_invariants_hold_over_mixed_sequence() {
        let sessions: Vec<_> = (0..6).map(|_| session()).collect();
        let rooms = ["lobby", "office", "", "Lobby"];
        let mut registry = ChatRegistry::new();

        // deterministic walk over join / leave / disconnect
        for step in 0..200usize {
            let (s, _) = &sessions[(step * 7) % sessions.len()];
            match step % 5 {
                0 | 1 | 2 => {
                    let room = rooms[(step * 3) % rooms.len()];
                    registry.join(s, RoomName::from(room));
                }
                3 => {
                    registry.leave(s.id);
                }
                _ => {
                    registry.disconnect(s.id);
                }
            }
            registry.assert_consistent();

            let listed = rooms
                .iter()
                .filter(|room| registry.members(room).contains(&s.id))
                .count();
            assert!(listed <= 1);
        }
    }
}
