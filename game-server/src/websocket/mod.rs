use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::broadcast::RoomBroadcaster;
use crate::room_manager::RoomManager;
use game_types::ClientMessage;

pub mod handlers;
pub mod rate_limiter;

use handlers::MessageHandler;
use rate_limiter::RateLimiter;

pub async fn handle_connection(
    websocket: WebSocket,
    manager: Arc<RoomManager>,
    broadcaster: Arc<RoomBroadcaster>,
) {
    let session_id = Uuid::new_v4();
    info!("new websocket session: {}", session_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut message_handler = MessageHandler::new(session_id, manager, broadcaster, sender);
    let mut rate_limiter = RateLimiter::new();

    // Inbound: decode, rate-limit, dispatch.
    let incoming = async {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(msg) => {
                    if let Err(e) =
                        handle_message(msg, &mut rate_limiter, &mut message_handler, session_id)
                            .await
                    {
                        error!("error handling message for {}: {}", session_id, e);
                        break;
                    }
                }
                Err(e) => {
                    warn!("websocket error for {}: {}", session_id, e);
                    break;
                }
            }
        }
    };

    // Outbound: drain the session channel onto the socket.
    let outgoing = async move {
        while let Some(message) = receiver.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("failed to send message to {}: {:?}", session_id, e);
                break;
            }
        }
    };

    tokio::select! {
        _ = incoming => {},
        _ = outgoing => {},
    }

    info!("session {} disconnected", session_id);
    message_handler.handle_disconnect().await;
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &mut MessageHandler,
    session_id: Uuid,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !rate_limiter.allow() {
        warn!("rate limit exceeded for session {}", session_id);
        return Err("rate limit exceeded".into());
    }

    // Only text frames carry client messages.
    if !msg.is_text() {
        return Ok(());
    }

    let text = msg.to_str().map_err(|_| "invalid text message")?;
    let client_message: ClientMessage =
        serde_json::from_str(text).map_err(|e| format!("invalid JSON message: {}", e))?;

    message_handler
        .handle_message(client_message)
        .await
        .map_err(|e| format!("message handling error: {}", e))?;

    Ok(())
}
