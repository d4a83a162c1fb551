use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Point breakdown for one shared-letters submission.
///
/// A word that fails validity or letter containment keeps its zero components
/// so clients can show the player why it scored nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SharedLettersBreakdown {
    pub valid_word: u32,
    pub contains_all: u32,
    pub length_bonus: u32,
    pub speed_bonus: u32,
    pub originality_bonus: u32,
    pub base_points: u32,
    pub time_multiplier: f64,
    pub round_points: f64,
}

/// Point breakdown for one subword-extraction submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubwordBreakdown {
    pub valid_word: u32,
    pub formable: u32,
    pub length_bonus: u32,
    pub speed_bonus: u32,
    pub uniqueness_bonus: u32,
    pub first_to_find_bonus: u32,
    pub round_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ScoreBreakdown {
    SharedLetters(SharedLettersBreakdown),
    Subword(SubwordBreakdown),
}

impl ScoreBreakdown {
    pub fn round_points(&self) -> f64 {
        match self {
            ScoreBreakdown::SharedLetters(b) => b.round_points,
            ScoreBreakdown::Subword(b) => b.round_points,
        }
    }
}

/// One scored word as reported back to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoredWord {
    pub word: String,
    pub submitted_at_ms: u64,
    pub breakdown: ScoreBreakdown,
}

/// Everything one player earned in a scored round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerRoundResult {
    pub session_id: Uuid,
    pub display_name: String,
    pub words: Vec<ScoredWord>,
    pub round_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub total_points: f64,
}

/// Highest-scoring word of a round, earliest submission on ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotableWord {
    pub word: String,
    pub display_name: String,
    pub points: f64,
}
