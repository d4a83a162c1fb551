use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use game_core::Dictionary;
use game_persistence::{GameResultRepository, connection::connect_and_migrate};
use game_server::{
    broadcast::RoomBroadcaster, config::Config, create_routes, room_manager::RoomManager,
    store::MemoryRoomStore,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Word Rush server...");

    let config = Config::new();

    // Word list: fall back to the built-in set when the file is unreadable.
    let dictionary = Arc::new(Dictionary::load_or_fallback(&config.word_list_path));
    if dictionary.is_degraded() {
        warn!(
            "running with the built-in fallback word set; set WORD_LIST_PATH to a full word list"
        );
    } else {
        info!("loaded {} words from {}", dictionary.len(), config.word_list_path);
    }

    // Result archive is optional: without a database the game still runs,
    // final standings just are not persisted.
    let archive = if std::env::var("DATABASE_URL").is_ok() {
        match connect_and_migrate().await {
            Ok(db) => {
                info!("result archive connected");
                Some(Arc::new(GameResultRepository::new(db)))
            }
            Err(e) => {
                warn!("result archive unavailable, continuing without it: {}", e);
                None
            }
        }
    } else {
        info!("DATABASE_URL not set; final results will not be archived");
        None
    };

    let store = Arc::new(MemoryRoomStore::new());
    let broadcaster = Arc::new(RoomBroadcaster::new());
    let manager = RoomManager::new(store, broadcaster.clone(), dictionary, archive, config.timing());

    let routes = create_routes(manager, broadcaster);

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to install SIGINT handler");
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!("Server started successfully on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Server shutdown complete.");
}
