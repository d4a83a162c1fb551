use std::sync::{Arc, Weak};
use std::time::Duration;

use game_core::{Dictionary, RoundGenerator, leaderboard, normalize, notable_word, score_round};
use game_core::rounds::{PlayerSubmissions, RoundContext};
use game_persistence::{FinalResult, GameResultRepository};
use game_types::{
    Player, RejectReason, RoomConfig, RoomError, RoomInfo, RoomPhase, RoundFormat, ServerMessage,
    SessionId, Submission,
};
use dashmap::DashMap;
use rand::Rng;
use regex::Regex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::broadcast::RoomBroadcaster;
use crate::store::{RecordOutcome, RoomRecord, RoomStore, StoreError, with_retries};

const ROOM_CODE_LEN: usize = 4;
const MAX_DISPLAY_NAME_LEN: usize = 24;
const MIN_WORD_LEN: usize = 3;

/// Delays around the round state machine. Injectable so tests can drive
/// transitions by calling `close_round` directly instead of waiting.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Extra window after the nominal round duration before scoring starts.
    pub grace: Duration,
    /// Pause between a round's results and the next round beginning.
    pub pacing: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(1500),
            pacing: Duration::from_millis(4000),
        }
    }
}

/// The per-room state machine: LOBBY -> ROUND_ACTIVE(n) -> SCORING(n) ->
/// ROUND_ACTIVE(n+1) | GAME_OVER. Every broadcast is preceded by a confirmed
/// store write, so a room is never announced in a state the store does not
/// hold.
pub struct RoomManager {
    store: Arc<dyn RoomStore>,
    broadcaster: Arc<RoomBroadcaster>,
    dictionary: Arc<Dictionary>,
    generator: RoundGenerator,
    archive: Option<Arc<GameResultRepository>>,
    timing: TimingConfig,
    timers: DashMap<String, JoinHandle<()>>,
    name_filter: Regex,
    weak_self: Weak<RoomManager>,
}

impl RoomManager {
    pub fn new(
        store: Arc<dyn RoomStore>,
        broadcaster: Arc<RoomBroadcaster>,
        dictionary: Arc<Dictionary>,
        archive: Option<Arc<GameResultRepository>>,
        timing: TimingConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            store,
            broadcaster,
            dictionary,
            generator: RoundGenerator::default(),
            archive,
            timing,
            timers: DashMap::new(),
            name_filter: Regex::new(r"[^A-Za-z0-9 _\-]").expect("valid name filter pattern"),
            weak_self: weak.clone(),
        })
    }

    /// Create a room with a fresh public code and host credential.
    pub async fn create_room(
        &self,
        total_rounds: u32,
        round_seconds: u32,
        format: RoundFormat,
    ) -> Result<(String, Uuid), RoomError> {
        if !RoomConfig::bounds_ok(total_rounds, round_seconds) {
            return Err(RoomError::invalid_input(
                "rounds must be 1-20 and duration 10-60 seconds",
            ));
        }

        let config = RoomConfig {
            total_rounds,
            round_seconds,
            format,
        };

        // Short public codes can collide; re-draw until one is free.
        let code = loop {
            let candidate = generate_room_code();
            if !self.store.exists(&candidate).await.map_err(map_store)? {
                break candidate;
            }
        };

        let host_token = Uuid::new_v4();
        self.store
            .create_room(RoomRecord::new(code.clone(), host_token, config))
            .await
            .map_err(map_store)?;

        info!("created room {} ({:?}, {} rounds)", code, format, total_rounds);
        Ok((code, host_token))
    }

    pub async fn room_info(&self, code: &str) -> Result<RoomInfo, RoomError> {
        let record = self.store.fetch(code).await.map_err(map_store)?;
        Ok(room_info_of(&record))
    }

    /// Admit a player. Allowed in any non-terminal phase; joiners during an
    /// active round only participate from the next round on.
    pub async fn join(
        &self,
        code: &str,
        session: SessionId,
        display_name: &str,
    ) -> Result<RoomInfo, RoomError> {
        let name = self.sanitize_display_name(display_name)?;
        let record = self.store.fetch(code).await.map_err(map_store)?;
        if record.phase == RoomPhase::GameOver {
            return Err(RoomError::invalid_input("game is already over"));
        }

        let player = Player::new(session, name.clone(), chrono::Utc::now().to_rfc3339());
        self.store.add_player(code, player).await.map_err(map_store)?;

        info!("{} joined room {} as '{}'", session, code, name);
        self.broadcast_member_list(code).await;
        Ok(room_info_of(&record))
    }

    /// Host-only reconfiguration, accepted only while the room is in the
    /// lobby. Unknown rooms report NotFound before any credential check.
    pub async fn configure(
        &self,
        code: &str,
        host_token: &str,
        rounds: u32,
        duration_seconds: u32,
    ) -> Result<(), RoomError> {
        let record = self.store.fetch(code).await.map_err(map_store)?;
        self.check_host_token(&record, host_token)?;
        if record.phase != RoomPhase::Lobby {
            return Err(RoomError::invalid_input("room is no longer in the lobby"));
        }
        if !RoomConfig::bounds_ok(rounds, duration_seconds) {
            return Err(RoomError::invalid_input(
                "rounds must be 1-20 and duration 10-60 seconds",
            ));
        }

        self.store
            .configure(code, rounds, duration_seconds)
            .await
            .map_err(map_store)?;
        info!("room {} reconfigured: {} rounds, {}s each", code, rounds, duration_seconds);
        Ok(())
    }

    /// Host starts the game, opening round 1.
    pub async fn start(&self, code: &str, host_token: &str) -> Result<(), RoomError> {
        let record = self.store.fetch(code).await.map_err(map_store)?;
        self.check_host_token(&record, host_token)?;
        if record.phase != RoomPhase::Lobby {
            return Err(RoomError::invalid_input("game already started"));
        }

        self.begin_round(code, 1).await
    }

    /// Open round `round`: durable write first, broadcast second. On store
    /// failure the transition is abandoned and the room torn down; no client
    /// ever hears about a round the store does not hold.
    fn begin_round<'a>(
        &'a self,
        code: &'a str,
        round: u32,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), RoomError>> + Send + 'a>>
    {
        Box::pin(async move {
        let record = self.store.fetch(code).await.map_err(map_store)?;

        let prompt = {
            let mut rng = rand::thread_rng();
            self.generator
                .generate(record.config.format, &self.dictionary, &mut rng)
        };
        let started_at_ms = now_ms();

        let write = with_retries("begin_round", || {
            self.store
                .begin_round(code, round, prompt.clone(), started_at_ms)
        })
        .await;
        if let Err(err) = write {
            return Err(self.abandon_room(code, err).await);
        }

        info!("room {} round {} began ({:?})", code, round, prompt);
        self.broadcaster.broadcast(
            code,
            ServerMessage::RoundBegan {
                prompt,
                round_number: round,
                total_rounds: record.config.total_rounds,
                duration_seconds: record.config.round_seconds,
                server_start_ms: started_at_ms,
            },
        );

        let window = Duration::from_secs(record.config.round_seconds as u64) + self.timing.grace;
        self.schedule(code, window, move |manager, code| async move {
            if let Err(err) = manager.close_round(&code, round).await {
                error!("closing round {} of {} failed: {}", round, code, err);
            }
        });
        Ok(())
        })
    }

    /// Record a word for the current round. Returns the rejection reason, or
    /// `None` when the submission was accepted. The caller relays the
    /// corresponding accepted/rejected message; cheap rejections never touch
    /// the store.
    pub async fn submit(
        &self,
        code: &str,
        session: SessionId,
        raw_word: &str,
    ) -> Result<Option<RejectReason>, RoomError> {
        let word = normalize(raw_word);
        if word.is_empty() {
            return Ok(Some(RejectReason::EmptyWord));
        }
        if word.len() < MIN_WORD_LEN {
            return Ok(Some(RejectReason::TooShort));
        }

        let record = self.store.fetch(code).await.map_err(map_store)?;
        if record.phase == RoomPhase::Lobby || record.phase == RoomPhase::GameOver {
            return Ok(Some(RejectReason::NotInRound));
        }

        // The store decides; the phase may have flipped since the fetch.
        let outcome = self
            .store
            .record_submission(code, record.current_round, session, word, now_ms())
            .await
            .map_err(map_store)?;

        Ok(match outcome {
            RecordOutcome::Accepted => None,
            RecordOutcome::AlreadySubmitted => Some(RejectReason::AlreadySubmitted),
            RecordOutcome::DuplicateWord => Some(RejectReason::DuplicateWord),
            RecordOutcome::RoundClosed => Some(RejectReason::RoundClosed),
            RecordOutcome::NotInRound => Some(RejectReason::NotInRound),
        })
    }

    /// Close round `round` and run the scoring pass. Stale invocations (the
    /// room has moved on, or was torn down) are silent no-ops, so a timer
    /// that lost a race with an explicit close does no harm.
    pub async fn close_round(&self, code: &str, round: u32) -> Result<(), RoomError> {
        let record = match self.store.fetch(code).await {
            Ok(record) => record,
            Err(StoreError::MissingRoom) => return Ok(()),
            Err(err) => return Err(map_store(err)),
        };
        if record.phase != RoomPhase::RoundActive || record.current_round != round {
            return Ok(());
        }
        let Some(prompt) = record.prompt.clone() else {
            error!("room {} in round {} without a prompt", code, round);
            return Ok(());
        };

        if let Err(err) =
            with_retries("set_phase", || self.store.set_phase(code, RoomPhase::Scoring)).await
        {
            return Err(self.abandon_room(code, err).await);
        }
        self.broadcaster.broadcast(code, ServerMessage::ScoringStarted);

        let snapshot = match with_retries("snapshot", || self.store.snapshot_submissions(code)).await
        {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(self.abandon_room(code, err).await),
        };

        let ctx = RoundContext {
            format: record.config.format,
            prompt,
            duration_seconds: record.config.round_seconds,
            started_at_ms: record.round_started_at_ms,
        };
        let results = score_round(&ctx, &group_by_player(&record, &snapshot), &self.dictionary);

        if let Err(err) =
            with_retries("apply_scores", || self.store.apply_round_scores(code, &results)).await
        {
            return Err(self.abandon_room(code, err).await);
        }

        let players = self.store.list_players(code).await.map_err(map_store)?;
        info!(
            "room {} round {} scored: {} submissions from {} players",
            code,
            round,
            snapshot.len(),
            results.len()
        );
        self.broadcaster.broadcast(
            code,
            ServerMessage::RoundScored {
                notable_word: notable_word(&results),
                results,
            },
        );
        self.broadcaster.broadcast(
            code,
            ServerMessage::LeaderboardUpdate {
                top10: leaderboard(&players),
            },
        );

        if round >= record.config.total_rounds {
            self.finish_game(code).await
        } else {
            self.schedule(code, self.timing.pacing, move |manager, code| async move {
                // Revalidate: the room must still be waiting on this round's
                // pacing delay.
                match manager.store.fetch(&code).await {
                    Ok(r) if r.phase == RoomPhase::Scoring && r.current_round == round => {
                        if let Err(err) = manager.begin_round(&code, round + 1).await {
                            error!("beginning round {} of {} failed: {}", round + 1, code, err);
                        }
                    }
                    _ => {}
                }
            });
            Ok(())
        }
    }

    /// Terminal transition. The final standings broadcast is never blocked on
    /// archival; per-player archive failures are logged and skipped.
    pub async fn finish_game(&self, code: &str) -> Result<(), RoomError> {
        if let Err(err) = with_retries("finish_game", || self.store.finish_game(code)).await {
            return Err(self.abandon_room(code, err).await);
        }

        let record = self.store.fetch(code).await.map_err(map_store)?;
        let players = self.store.list_players(code).await.map_err(map_store)?;
        info!("room {} game over after {} rounds", code, record.config.total_rounds);
        self.broadcaster.broadcast(
            code,
            ServerMessage::GameOver {
                final_top10: leaderboard(&players),
            },
        );

        if let Some(archive) = &self.archive {
            for player in &players {
                let result = FinalResult {
                    room_code: code.to_string(),
                    display_name: player.display_name.clone(),
                    final_points: player.total_points,
                    rounds_played: record.config.total_rounds,
                };
                if let Err(err) = archive.record_result(&result).await {
                    error!(
                        "archiving result for '{}' in {} failed: {}",
                        player.display_name, code, err
                    );
                }
            }
        }

        self.cancel_timer(code);
        Ok(())
    }

    /// A departing player keeps their totals and any submissions already
    /// recorded for the in-flight round; they only stop receiving broadcasts.
    pub async fn leave(&self, code: &str, session: SessionId) -> Result<(), RoomError> {
        match self.store.mark_disconnected(code, session).await {
            Ok(()) => {
                self.broadcaster.unsubscribe(code, session);
                self.broadcast_member_list(code).await;
                Ok(())
            }
            Err(StoreError::MissingRoom) => Ok(()),
            Err(err) => Err(map_store(err)),
        }
    }

    pub async fn member_list(&self, code: &str) -> Result<Vec<Player>, RoomError> {
        self.store.list_players(code).await.map_err(map_store)
    }

    fn check_host_token(&self, record: &RoomRecord, token: &str) -> Result<(), RoomError> {
        match Uuid::parse_str(token) {
            Ok(parsed) if parsed == record.host_token => Ok(()),
            _ => {
                warn!("rejected host command for room {}: bad credential", record.code);
                Err(RoomError::Unauthorized)
            }
        }
    }

    fn sanitize_display_name(&self, raw: &str) -> Result<String, RoomError> {
        let cleaned = self.name_filter.replace_all(raw.trim(), "");
        let name: String = cleaned.chars().take(MAX_DISPLAY_NAME_LEN).collect();
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(RoomError::invalid_input("display name required"));
        }
        Ok(name)
    }

    async fn broadcast_member_list(&self, code: &str) {
        if let Ok(players) = self.store.list_players(code).await {
            self.broadcaster
                .broadcast(code, ServerMessage::MemberList { players });
        }
    }

    /// Store gave up mid-transition: tell the room, then tear it down. The
    /// record delete is best-effort against a store that just failed.
    async fn abandon_room(&self, code: &str, err: StoreError) -> RoomError {
        error!("abandoning room {}: {}", code, err);
        let room_error = map_store(err);
        self.broadcaster.broadcast(
            code,
            ServerMessage::Error {
                code: room_error.code().to_string(),
                message: "room closed: state could not be saved".to_string(),
            },
        );
        self.cancel_timer(code);
        if let Err(delete_err) = self.store.delete_room(code).await {
            warn!("could not delete abandoned room {}: {}", code, delete_err);
        }
        self.broadcaster.drop_room(code);
        room_error
    }

    fn schedule<F, Fut>(&self, code: &str, delay: Duration, action: F)
    where
        F: FnOnce(Arc<RoomManager>, String) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let Some(manager) = self.weak_self.upgrade() else {
            return;
        };
        let code_owned = code.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(manager, code_owned).await;
        });
        self.cancel_timer(code);
        self.timers.insert(code.to_string(), handle);
    }

    fn cancel_timer(&self, code: &str) {
        if let Some((_, handle)) = self.timers.remove(code) {
            handle.abort();
        }
    }
}

impl Drop for RoomManager {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
    }
}

fn room_info_of(record: &RoomRecord) -> RoomInfo {
    RoomInfo {
        code: record.code.clone(),
        total_rounds: record.config.total_rounds,
        round_seconds: record.config.round_seconds,
        format: record.config.format,
        current_round: record.current_round,
        phase: record.phase,
    }
}

/// Group an arrival-ordered snapshot by player, attaching display names from
/// the room record. Groups keep their first-arrival order so the scoring
/// pass output is deterministic.
fn group_by_player(
    record: &RoomRecord,
    snapshot: &[(SessionId, Submission)],
) -> Vec<PlayerSubmissions> {
    let mut grouped: Vec<PlayerSubmissions> = Vec::new();
    for (session, submission) in snapshot {
        match grouped.iter_mut().find(|g| g.session_id == *session) {
            Some(group) => group.submissions.push(submission.clone()),
            None => {
                let display_name = record
                    .players
                    .get(session)
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                grouped.push(PlayerSubmissions {
                    session_id: *session,
                    display_name,
                    submissions: vec![submission.clone()],
                });
            }
        }
    }
    grouped
}

fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect()
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn map_store(err: StoreError) -> RoomError {
    match err {
        StoreError::MissingRoom => RoomError::NotFound,
        StoreError::Unavailable(message) => RoomError::StoreUnavailable { message },
    }
}

/// Wire form of an error for the websocket channel.
pub fn error_message(err: &RoomError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code().to_string(),
        message: err.to_string(),
    }
}
