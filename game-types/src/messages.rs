use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{LeaderboardEntry, NotableWord, Player, PlayerRoundResult, Prompt, RejectReason, RoomInfo};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    Join { code: String, display_name: String },
    Configure { rounds: u32, duration_seconds: u32, host_token: String },
    StartGame { host_token: String },
    SubmitWord { word: String },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    Joined { session_id: Uuid, room: RoomInfo },
    MemberList { players: Vec<Player> },
    /// Clients must treat `server_start_ms` as the countdown's source of
    /// truth rather than their local receipt time.
    RoundBegan {
        prompt: Prompt,
        round_number: u32,
        total_rounds: u32,
        duration_seconds: u32,
        server_start_ms: u64,
    },
    SubmissionAccepted { word: String },
    SubmissionRejected { word: String, reason: RejectReason },
    ScoringStarted,
    RoundScored {
        results: Vec<PlayerRoundResult>,
        notable_word: Option<NotableWord>,
    },
    LeaderboardUpdate { top10: Vec<LeaderboardEntry> },
    GameOver { final_top10: Vec<LeaderboardEntry> },
    Error { code: String, message: String },
}
