use std::collections::HashMap;

use dashmap::DashMap;
use game_types::{ServerMessage, SessionId};
use tokio::sync::mpsc;
use tracing::debug;

/// Per-room fanout of server messages. Each subscribed session owns an
/// unbounded channel; the socket task drains the receiver. Senders whose
/// receiver has gone away are pruned on the next delivery attempt.
pub struct RoomBroadcaster {
    rooms: DashMap<String, HashMap<SessionId, mpsc::UnboundedSender<ServerMessage>>>,
}

impl RoomBroadcaster {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn subscribe(
        &self,
        code: &str,
        session: SessionId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.rooms
            .entry(code.to_string())
            .or_default()
            .insert(session, sender);
    }

    pub fn unsubscribe(&self, code: &str, session: SessionId) {
        if let Some(mut members) = self.rooms.get_mut(code) {
            members.remove(&session);
            if members.is_empty() {
                drop(members);
                self.rooms.remove_if(code, |_, m| m.is_empty());
            }
        }
    }

    pub fn broadcast(&self, code: &str, message: ServerMessage) {
        if let Some(mut members) = self.rooms.get_mut(code) {
            members.retain(|session, sender| {
                let alive = sender.send(message.clone()).is_ok();
                if !alive {
                    debug!("pruning closed channel for session {} in {}", session, code);
                }
                alive
            });
        }
    }

    pub fn send_to(&self, code: &str, session: SessionId, message: ServerMessage) {
        let dead = match self.rooms.get(code) {
            Some(members) => match members.get(&session) {
                Some(sender) => sender.send(message).is_err(),
                None => false,
            },
            None => false,
        };
        if dead {
            self.unsubscribe(code, session);
        }
    }

    pub fn drop_room(&self, code: &str) {
        self.rooms.remove(code);
    }

    pub fn member_count(&self, code: &str) -> usize {
        self.rooms.get(code).map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for RoomBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
