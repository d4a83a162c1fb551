use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub session_id: Uuid,
    pub display_name: String,
    /// Cumulative points across rounds, rounded to 2 decimals. Never decreases.
    pub total_points: f64,
    /// Words submitted in the most recently scored round.
    pub last_words: Vec<String>,
    pub last_round_points: f64,
    pub joined_at: String, // ISO 8601 string
    pub is_connected: bool,
}

impl Player {
    pub fn new(session_id: Uuid, display_name: String, joined_at: String) -> Self {
        Self {
            session_id,
            display_name,
            total_points: 0.0,
            last_words: Vec::new(),
            last_round_points: 0.0,
            joined_at,
            is_connected: true,
        }
    }
}
