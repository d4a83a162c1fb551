use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::broadcast::RoomBroadcaster;
use crate::room_manager::{RoomManager, error_message};
use game_types::{ClientMessage, ServerMessage, SessionId};

/// Per-socket dispatcher. All session state (the session id and which room
/// this socket joined) lives here, owned by the socket's read task; there is
/// no shared mutable connection registry to race on.
pub struct MessageHandler {
    session_id: SessionId,
    room: Option<String>,
    manager: Arc<RoomManager>,
    broadcaster: Arc<RoomBroadcaster>,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl MessageHandler {
    pub fn new(
        session_id: SessionId,
        manager: Arc<RoomManager>,
        broadcaster: Arc<RoomBroadcaster>,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self {
            session_id,
            room: None,
            manager,
            broadcaster,
            sender,
        }
    }

    pub async fn handle_message(&mut self, message: ClientMessage) -> Result<(), String> {
        match message {
            ClientMessage::Join { code, display_name } => {
                self.handle_join(code, display_name).await
            }
            ClientMessage::Configure {
                rounds,
                duration_seconds,
                host_token,
            } => self.handle_configure(rounds, duration_seconds, host_token).await,
            ClientMessage::StartGame { host_token } => self.handle_start(host_token).await,
            ClientMessage::SubmitWord { word } => self.handle_submit(word).await,
            ClientMessage::Heartbeat => Ok(()),
        }
    }

    pub async fn handle_disconnect(&self) {
        if let Some(code) = &self.room {
            info!("session {} disconnecting from room {}", self.session_id, code);
            let _ = self.manager.leave(code, self.session_id).await;
        }
    }

    async fn handle_join(&mut self, code: String, display_name: String) -> Result<(), String> {
        if self.room.is_some() {
            return self.send_error_text("invalid_input", "already in a room");
        }

        // Subscribe before the join so this session sees the member-list
        // broadcast that announces it.
        self.broadcaster
            .subscribe(&code, self.session_id, self.sender.clone());

        match self.manager.join(&code, self.session_id, &display_name).await {
            Ok(room) => {
                self.room = Some(code);
                self.send(ServerMessage::Joined {
                    session_id: self.session_id,
                    room,
                })
            }
            Err(err) => {
                self.broadcaster.unsubscribe(&code, self.session_id);
                self.send(error_message(&err))
            }
        }
    }

    async fn handle_configure(
        &mut self,
        rounds: u32,
        duration_seconds: u32,
        host_token: String,
    ) -> Result<(), String> {
        let Some(code) = self.room.clone() else {
            return self.send_error_text("invalid_input", "join a room first");
        };

        match self
            .manager
            .configure(&code, &host_token, rounds, duration_seconds)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => self.send(error_message(&err)),
        }
    }

    async fn handle_start(&mut self, host_token: String) -> Result<(), String> {
        let Some(code) = self.room.clone() else {
            return self.send_error_text("invalid_input", "join a room first");
        };

        match self.manager.start(&code, &host_token).await {
            Ok(()) => Ok(()),
            Err(err) => self.send(error_message(&err)),
        }
    }

    async fn handle_submit(&mut self, word: String) -> Result<(), String> {
        let Some(code) = self.room.clone() else {
            return self.send_error_text("invalid_input", "join a room first");
        };

        let echoed = game_core::normalize(&word);
        match self.manager.submit(&code, self.session_id, &word).await {
            Ok(None) => self.send(ServerMessage::SubmissionAccepted { word: echoed }),
            Ok(Some(reason)) => self.send(ServerMessage::SubmissionRejected {
                word: echoed,
                reason,
            }),
            Err(err) => self.send(error_message(&err)),
        }
    }

    fn send(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "connection closed".to_string())
    }

    fn send_error_text(&self, code: &str, message: &str) -> Result<(), String> {
        self.send(ServerMessage::Error {
            code: code.to_string(),
            message: message.to_string(),
        })
    }
}
