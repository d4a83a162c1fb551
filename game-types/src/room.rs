use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Per-connection session identifier, scoped to one room.
pub type SessionId = Uuid;

pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 20;
pub const MIN_ROUND_SECONDS: u32 = 10;
pub const MAX_ROUND_SECONDS: u32 = 60;

/// The two supported round formats. Fixed per room at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundFormat {
    /// Build a word containing every letter of a shared tile set.
    SharedLetters,
    /// Extract as many subwords as possible from a main word.
    Subwords,
}

impl Default for RoundFormat {
    fn default() -> Self {
        RoundFormat::SharedLetters
    }
}

/// The shared prompt broadcast at round start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Prompt {
    Letters { tiles: Vec<String> },
    MainWord { word: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomPhase {
    Lobby,
    RoundActive,
    Scoring,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomConfig {
    pub total_rounds: u32,
    pub round_seconds: u32,
    pub format: RoundFormat,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            total_rounds: 5,
            round_seconds: 30,
            format: RoundFormat::SharedLetters,
        }
    }
}

impl RoomConfig {
    pub fn bounds_ok(total_rounds: u32, round_seconds: u32) -> bool {
        (MIN_ROUNDS..=MAX_ROUNDS).contains(&total_rounds)
            && (MIN_ROUND_SECONDS..=MAX_ROUND_SECONDS).contains(&round_seconds)
    }
}

/// Public room configuration returned to joining clients before they connect.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomInfo {
    pub code: String,
    pub total_rounds: u32,
    pub round_seconds: u32,
    pub format: RoundFormat,
    pub current_round: u32,
    pub phase: RoomPhase,
}

/// One player's claimed word for the current round, stamped by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Submission {
    /// Normalized (trimmed, lowercased) word.
    pub word: String,
    /// Server-observed submission time, unix milliseconds.
    pub submitted_at_ms: u64,
    /// Arrival order at the store within the round; breaks timestamp ties.
    pub seq: u64,
}
