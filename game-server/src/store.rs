use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use game_types::{Player, PlayerRoundResult, Prompt, RoomConfig, RoomPhase, RoundFormat, SessionId, Submission};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Failures at the store boundary. `MissingRoom` is a domain condition the
/// orchestrator maps to `NotFound`; `Unavailable` covers everything that
/// warrants a retry before a transition is abandoned.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("room record not found")]
    MissingRoom,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of the atomic submission check-and-set. Decided entirely inside
/// the store so two racing submissions can never both win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Accepted,
    /// Single-submission format and this player already has a recorded word.
    AlreadySubmitted,
    /// Multi-submission format and this player already claimed this word.
    DuplicateWord,
    /// The room is not currently accepting submissions for this round.
    RoundClosed,
    /// The player joined after the round began.
    NotInRound,
}

/// The authoritative per-room record. Everything the orchestrator broadcasts
/// is derived from a confirmed write to one of these.
#[derive(Debug, Clone)]
pub struct RoomRecord {
    pub code: String,
    pub host_token: Uuid,
    pub config: RoomConfig,
    pub phase: RoomPhase,
    pub current_round: u32,
    pub prompt: Option<Prompt>,
    pub round_started_at_ms: u64,
    pub players: HashMap<SessionId, Player>,
    /// Players present when the current round began; later joiners wait.
    pub round_participants: HashSet<SessionId>,
    pub submissions: HashMap<SessionId, Vec<Submission>>,
    /// Arrival counter for the current round, stamped onto submissions.
    pub next_seq: u64,
}

impl RoomRecord {
    pub fn new(code: String, host_token: Uuid, config: RoomConfig) -> Self {
        Self {
            code,
            host_token,
            config,
            phase: RoomPhase::Lobby,
            current_round: 0,
            prompt: None,
            round_started_at_ms: 0,
            players: HashMap::new(),
            round_participants: HashSet::new(),
            submissions: HashMap::new(),
            next_seq: 0,
        }
    }
}

/// The externally-persisted room state. Implementations must serialize
/// mutations per room code; callers rely on `record_submission` being a true
/// check-and-set under concurrent submitters.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn create_room(&self, record: RoomRecord) -> Result<(), StoreError>;

    async fn fetch(&self, code: &str) -> Result<RoomRecord, StoreError>;

    async fn exists(&self, code: &str) -> Result<bool, StoreError>;

    async fn configure(&self, code: &str, rounds: u32, seconds: u32) -> Result<(), StoreError>;

    async fn add_player(&self, code: &str, player: Player) -> Result<(), StoreError>;

    async fn mark_disconnected(&self, code: &str, session: SessionId) -> Result<(), StoreError>;

    async fn list_players(&self, code: &str) -> Result<Vec<Player>, StoreError>;

    /// Atomically open a round: sets the index, prompt and server start time,
    /// fixes the participant set and clears the submission slate. Must be
    /// durable before any round-began broadcast.
    async fn begin_round(
        &self,
        code: &str,
        round: u32,
        prompt: Prompt,
        started_at_ms: u64,
    ) -> Result<(), StoreError>;

    async fn set_phase(&self, code: &str, phase: RoomPhase) -> Result<(), StoreError>;

    async fn record_submission(
        &self,
        code: &str,
        round: u32,
        session: SessionId,
        word: String,
        submitted_at_ms: u64,
    ) -> Result<RecordOutcome, StoreError>;

    /// Stable, arrival-ordered snapshot of the current round's submissions.
    async fn snapshot_submissions(
        &self,
        code: &str,
    ) -> Result<Vec<(SessionId, Submission)>, StoreError>;

    /// Fold a scoring pass's per-player deltas into the cumulative totals.
    async fn apply_round_scores(
        &self,
        code: &str,
        results: &[PlayerRoundResult],
    ) -> Result<(), StoreError>;

    /// Terminal transition: phase GameOver, round index pinned to total + 1.
    async fn finish_game(&self, code: &str) -> Result<(), StoreError>;

    async fn delete_room(&self, code: &str) -> Result<(), StoreError>;
}

/// In-process adapter. DashMap's per-key entry locking gives the per-room
/// serialization the trait demands; different rooms never contend.
pub struct MemoryRoomStore {
    rooms: DashMap<String, RoomRecord>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    fn with_room<T>(
        &self,
        code: &str,
        f: impl FnOnce(&mut RoomRecord) -> T,
    ) -> Result<T, StoreError> {
        match self.rooms.get_mut(code) {
            Some(mut entry) => Ok(f(entry.value_mut())),
            None => Err(StoreError::MissingRoom),
        }
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create_room(&self, record: RoomRecord) -> Result<(), StoreError> {
        self.rooms.insert(record.code.clone(), record);
        Ok(())
    }

    async fn fetch(&self, code: &str) -> Result<RoomRecord, StoreError> {
        self.rooms
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::MissingRoom)
    }

    async fn exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.rooms.contains_key(code))
    }

    async fn configure(&self, code: &str, rounds: u32, seconds: u32) -> Result<(), StoreError> {
        self.with_room(code, |room| {
            room.config.total_rounds = rounds;
            room.config.round_seconds = seconds;
        })
    }

    async fn add_player(&self, code: &str, player: Player) -> Result<(), StoreError> {
        self.with_room(code, |room| {
            room.players
                .entry(player.session_id)
                .and_modify(|existing| existing.is_connected = true)
                .or_insert(player);
        })
    }

    async fn mark_disconnected(&self, code: &str, session: SessionId) -> Result<(), StoreError> {
        self.with_room(code, |room| {
            if let Some(player) = room.players.get_mut(&session) {
                player.is_connected = false;
            }
        })
    }

    async fn list_players(&self, code: &str) -> Result<Vec<Player>, StoreError> {
        self.with_room(code, |room| {
            let mut players: Vec<Player> = room.players.values().cloned().collect();
            // Session id breaks join-time ties so the order never depends on
            // map iteration.
            players.sort_by(|a, b| {
                a.joined_at
                    .cmp(&b.joined_at)
                    .then(a.session_id.cmp(&b.session_id))
            });
            players
        })
    }

    async fn begin_round(
        &self,
        code: &str,
        round: u32,
        prompt: Prompt,
        started_at_ms: u64,
    ) -> Result<(), StoreError> {
        self.with_room(code, |room| {
            room.current_round = round;
            room.prompt = Some(prompt);
            room.round_started_at_ms = started_at_ms;
            room.phase = RoomPhase::RoundActive;
            room.round_participants = room.players.keys().copied().collect();
            room.submissions.clear();
            room.next_seq = 0;
        })
    }

    async fn set_phase(&self, code: &str, phase: RoomPhase) -> Result<(), StoreError> {
        self.with_room(code, |room| {
            room.phase = phase;
        })
    }

    async fn record_submission(
        &self,
        code: &str,
        round: u32,
        session: SessionId,
        word: String,
        submitted_at_ms: u64,
    ) -> Result<RecordOutcome, StoreError> {
        self.with_room(code, |room| {
            if room.phase != RoomPhase::RoundActive || room.current_round != round {
                return RecordOutcome::RoundClosed;
            }
            if !room.round_participants.contains(&session) {
                return RecordOutcome::NotInRound;
            }

            let existing = room.submissions.entry(session).or_default();
            match room.config.format {
                RoundFormat::SharedLetters if !existing.is_empty() => {
                    RecordOutcome::AlreadySubmitted
                }
                _ if existing.iter().any(|s| s.word == word) => RecordOutcome::DuplicateWord,
                _ => {
                    let seq = room.next_seq;
                    room.next_seq += 1;
                    existing.push(Submission {
                        word,
                        submitted_at_ms,
                        seq,
                    });
                    RecordOutcome::Accepted
                }
            }
        })
    }

    async fn snapshot_submissions(
        &self,
        code: &str,
    ) -> Result<Vec<(SessionId, Submission)>, StoreError> {
        self.with_room(code, |room| {
            let mut snapshot: Vec<(SessionId, Submission)> = room
                .submissions
                .iter()
                .flat_map(|(session, subs)| subs.iter().map(|s| (*session, s.clone())))
                .collect();
            snapshot.sort_by_key(|(_, s)| s.seq);
            snapshot
        })
    }

    async fn apply_round_scores(
        &self,
        code: &str,
        results: &[PlayerRoundResult],
    ) -> Result<(), StoreError> {
        self.with_room(code, |room| {
            for result in results {
                if let Some(player) = room.players.get_mut(&result.session_id) {
                    player.total_points = game_core::round_to_cents(
                        player.total_points + result.round_points,
                    );
                    player.last_round_points = result.round_points;
                    player.last_words = result.words.iter().map(|w| w.word.clone()).collect();
                }
            }
        })
    }

    async fn finish_game(&self, code: &str) -> Result<(), StoreError> {
        self.with_room(code, |room| {
            room.phase = RoomPhase::GameOver;
            room.current_round = room.config.total_rounds + 1;
        })
    }

    async fn delete_room(&self, code: &str) -> Result<(), StoreError> {
        self.rooms.remove(code);
        Ok(())
    }
}

/// Bounded retry for round-defining writes. Only transient unavailability is
/// retried; a missing room fails immediately.
pub async fn with_retries<T, F, Fut>(op_name: &str, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    const ATTEMPTS: u32 = 3;
    let mut last = StoreError::Unavailable("no attempts made".to_string());

    for attempt in 1..=ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(StoreError::MissingRoom) => return Err(StoreError::MissingRoom),
            Err(err) => {
                warn!("store write '{}' failed (attempt {}): {}", op_name, attempt, err);
                last = err;
                if attempt < ATTEMPTS {
                    tokio::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
                }
            }
        }
    }

    Err(last)
}
