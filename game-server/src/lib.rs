use std::sync::Arc;

use serde::{Deserialize, Serialize};
use warp::Filter;

use crate::broadcast::RoomBroadcaster;
use crate::room_manager::RoomManager;
use game_types::{RoomConfig, RoomError, RoundFormat};

pub mod broadcast;
pub mod config;
pub mod room_manager;
pub mod store;
pub mod websocket;

#[derive(Deserialize)]
struct CreateRoomRequest {
    rounds: Option<u32>,
    duration_seconds: Option<u32>,
    format: Option<RoundFormat>,
}

#[derive(Serialize)]
struct CreateRoomResponse {
    code: String,
    host_token: String,
}

pub fn create_routes(
    manager: Arc<RoomManager>,
    broadcaster: Arc<RoomBroadcaster>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let manager_filter = warp::any().map({
        let manager = manager.clone();
        move || manager.clone()
    });

    let broadcaster_filter = warp::any().map({
        let broadcaster = broadcaster.clone();
        move || broadcaster.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(manager_filter.clone())
        .and(broadcaster_filter.clone())
        .map(|ws: warp::ws::Ws, manager, broadcaster| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, manager, broadcaster))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Room creation - returns the public code and the host credential
    let create_room = warp::path("room")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(manager_filter.clone())
        .and_then(handle_create_room);

    // Room lookup for joining clients
    let room_info = warp::path!("room" / String)
        .and(warp::get())
        .and(manager_filter.clone())
        .and_then(handle_room_info);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    websocket
        .or(health)
        .or(create_room)
        .or(room_info)
        .with(cors)
        .with(warp::log("word_rush"))
}

async fn handle_create_room(
    request: CreateRoomRequest,
    manager: Arc<RoomManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let defaults = RoomConfig::default();
    let rounds = request.rounds.unwrap_or(defaults.total_rounds);
    let duration = request.duration_seconds.unwrap_or(defaults.round_seconds);
    let format = request.format.unwrap_or_default();

    match manager.create_room(rounds, duration, format).await {
        Ok((code, host_token)) => Ok(warp::reply::with_status(
            warp::reply::json(&CreateRoomResponse {
                code,
                host_token: host_token.to_string(),
            }),
            warp::http::StatusCode::CREATED,
        )),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_room_info(
    code: String,
    manager: Arc<RoomManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match manager.room_info(&code).await {
        Ok(info) => Ok(warp::reply::with_status(
            warp::reply::json(&info),
            warp::http::StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(&err)),
    }
}

fn error_reply(err: &RoomError) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = match err {
        RoomError::NotFound => warp::http::StatusCode::NOT_FOUND,
        RoomError::Unauthorized => warp::http::StatusCode::FORBIDDEN,
        RoomError::InvalidInput { .. } => warp::http::StatusCode::BAD_REQUEST,
        RoomError::AlreadySubmitted => warp::http::StatusCode::CONFLICT,
        RoomError::StoreUnavailable { .. } => warp::http::StatusCode::SERVICE_UNAVAILABLE,
    };
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": err.code(),
            "message": err.to_string(),
        })),
        status,
    )
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::room_manager::TimingConfig;
    use crate::store::MemoryRoomStore;
    use game_core::Dictionary;
    use game_types::{ClientMessage, ServerMessage};

    fn create_test_app() -> (
        impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone,
        Arc<RoomManager>,
    ) {
        let store = Arc::new(MemoryRoomStore::new());
        let broadcaster = Arc::new(RoomBroadcaster::new());
        let dictionary = Arc::new(Dictionary::from_list("eats\nseat\neast\nteas\napple\npale"));
        let manager = RoomManager::new(
            store,
            broadcaster.clone(),
            dictionary,
            None,
            TimingConfig::default(),
        );
        (create_routes(manager.clone(), broadcaster), manager)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = create_test_app();

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[tokio::test]
    async fn test_create_room_and_fetch_info() {
        let (app, _) = create_test_app();

        let response = warp::test::request()
            .method("POST")
            .path("/room")
            .json(&serde_json::json!({ "rounds": 3, "duration_seconds": 20 }))
            .reply(&app)
            .await;

        assert_eq!(response.status(), 201);
        let created: serde_json::Value =
            serde_json::from_slice(response.body()).expect("Should parse JSON");
        let code = created["code"].as_str().expect("code present");
        assert_eq!(code.len(), 4);
        assert!(created["host_token"].as_str().is_some());

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/room/{}", code))
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        let info: serde_json::Value =
            serde_json::from_slice(response.body()).expect("Should parse JSON");
        assert_eq!(info["total_rounds"], 3);
        assert_eq!(info["round_seconds"], 20);
        assert_eq!(info["phase"], "Lobby");
        assert_eq!(info["current_round"], 0);
    }

    #[tokio::test]
    async fn test_create_room_rejects_bad_bounds() {
        let (app, _) = create_test_app();

        let response = warp::test::request()
            .method("POST")
            .path("/room")
            .json(&serde_json::json!({ "rounds": 99, "duration_seconds": 30 }))
            .reply(&app)
            .await;

        assert_eq!(response.status(), 400);
        let error: serde_json::Value =
            serde_json::from_slice(response.body()).expect("Should parse JSON");
        assert_eq!(error["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_room_info_unknown_room() {
        let (app, _) = create_test_app();

        let response = warp::test::request()
            .method("GET")
            .path("/room/ZZZZ")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
        let error: serde_json::Value =
            serde_json::from_slice(response.body()).expect("Should parse JSON");
        assert_eq!(error["error"], "not_found");
    }

    #[tokio::test]
    async fn test_websocket_heartbeat() {
        let (app, _) = create_test_app();

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        let heartbeat = serde_json::to_string(&ClientMessage::Heartbeat).expect("Should serialize");
        ws.send_text(heartbeat).await;
        // Heartbeat produces no response; reaching here means the socket held.
    }

    #[tokio::test]
    async fn test_websocket_invalid_json_closes_connection() {
        let (app, _) = create_test_app();

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        ws.send_text("not json").await;

        // The server drops sessions that send undecodable frames.
        assert!(ws.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_websocket_join_unknown_room() {
        let (app, _) = create_test_app();

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        let join = ClientMessage::Join {
            code: "ZZZZ".to_string(),
            display_name: "Ana".to_string(),
        };
        ws.send_text(serde_json::to_string(&join).expect("Should serialize"))
            .await;

        let msg = ws.recv().await.expect("Should receive response");
        let server_msg: ServerMessage =
            serde_json::from_str(msg.to_str().expect("text frame")).expect("valid ServerMessage");
        match server_msg {
            ServerMessage::Error { code, .. } => assert_eq!(code, "not_found"),
            other => panic!("Expected error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_websocket_join_flow() {
        let (app, manager) = create_test_app();
        let (code, _token) = manager
            .create_room(3, 20, RoundFormat::SharedLetters)
            .await
            .expect("room created");

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        let join = ClientMessage::Join {
            code: code.clone(),
            display_name: "Ana".to_string(),
        };
        ws.send_text(serde_json::to_string(&join).expect("Should serialize"))
            .await;

        // Member list broadcast (subscribed before join) and the join ack.
        let mut saw_joined = false;
        let mut saw_member_list = false;
        for _ in 0..2 {
            let msg = ws.recv().await.expect("Should receive response");
            let server_msg: ServerMessage = serde_json::from_str(msg.to_str().expect("text frame"))
                .expect("valid ServerMessage");
            match server_msg {
                ServerMessage::Joined { room, .. } => {
                    assert_eq!(room.code, code);
                    saw_joined = true;
                }
                ServerMessage::MemberList { players } => {
                    assert_eq!(players.len(), 1);
                    assert_eq!(players[0].display_name, "Ana");
                    saw_member_list = true;
                }
                other => panic!("Unexpected message: {:?}", other),
            }
        }
        assert!(saw_joined);
        assert!(saw_member_list);
    }

    #[tokio::test]
    async fn test_websocket_submit_before_join_is_rejected() {
        let (app, _) = create_test_app();

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        let submit = ClientMessage::SubmitWord {
            word: "eats".to_string(),
        };
        ws.send_text(serde_json::to_string(&submit).expect("Should serialize"))
            .await;

        let msg = ws.recv().await.expect("Should receive response");
        let server_msg: ServerMessage =
            serde_json::from_str(msg.to_str().expect("text frame")).expect("valid ServerMessage");
        match server_msg {
            ServerMessage::Error { code, .. } => assert_eq!(code, "invalid_input"),
            other => panic!("Expected error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_endpoints_cors() {
        let (app, _) = create_test_app();

        let response = warp::test::request()
            .method("OPTIONS")
            .path("/health")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_invalid_routes() {
        let (app, _) = create_test_app();

        let response = warp::test::request()
            .method("GET")
            .path("/invalid")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
    }
}
