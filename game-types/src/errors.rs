use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Error taxonomy surfaced to clients as rejection events.
///
/// Dictionary degradation (fallback word set in use) has no variant here:
/// it is an operator-log condition, never shown to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
pub enum RoomError {
    #[error("room not found")]
    NotFound,
    #[error("host credential mismatch")]
    Unauthorized,
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    /// Gameplay turns duplicates away as `RejectReason::AlreadySubmitted`
    /// inside a `SubmissionRejected` event; this variant is the error-channel
    /// form of the same condition, kept so the exported taxonomy covers it.
    #[error("already submitted this round")]
    AlreadySubmitted,
    #[error("room store unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl RoomError {
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::NotFound => "not_found",
            RoomError::Unauthorized => "unauthorized",
            RoomError::InvalidInput { .. } => "invalid_input",
            RoomError::AlreadySubmitted => "already_submitted",
            RoomError::StoreUnavailable { .. } => "store_unavailable",
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        RoomError::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Why a word submission was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RejectReason {
    EmptyWord,
    TooShort,
    /// No round is currently accepting submissions.
    NotInRound,
    /// The round advanced before this submission arrived.
    RoundClosed,
    /// Single-submission format and this player already submitted.
    AlreadySubmitted,
    /// This player already submitted this exact word this round.
    DuplicateWord,
}
