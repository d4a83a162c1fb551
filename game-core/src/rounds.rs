use game_types::{
    LeaderboardEntry, NotableWord, Player, PlayerRoundResult, Prompt, RoundFormat, ScoreBreakdown,
    ScoredWord, SessionId, Submission,
};

use crate::dictionary::Dictionary;
use crate::scoring;

/// Bounded leaderboard length.
pub const LEADERBOARD_SIZE: usize = 10;

/// Everything the scoring pass needs to know about the round being closed.
#[derive(Debug, Clone)]
pub struct RoundContext {
    pub format: RoundFormat,
    pub prompt: Prompt,
    pub duration_seconds: u32,
    pub started_at_ms: u64,
}

/// One player's slice of a round snapshot, in store arrival order.
#[derive(Debug, Clone)]
pub struct PlayerSubmissions {
    pub session_id: SessionId,
    pub display_name: String,
    pub submissions: Vec<Submission>,
}

/// The deterministic scoring pass over a closed round's submission snapshot.
///
/// Pure function of its inputs: re-running it on an identical snapshot yields
/// identical per-player results, and it never consults the clock or the
/// store. Duplicate-word grouping and earliest-submitter resolution happen
/// across the full snapshot before any submission is scored.
pub fn score_round(
    ctx: &RoundContext,
    snapshot: &[PlayerSubmissions],
    dictionary: &Dictionary,
) -> Vec<PlayerRoundResult> {
    let flattened: Vec<(SessionId, Submission)> = snapshot
        .iter()
        .flat_map(|p| {
            p.submissions
                .iter()
                .map(move |s| (p.session_id, s.clone()))
        })
        .collect();

    let firsts = scoring::first_submitters(&flattened);
    let sizes = scoring::group_sizes(&flattened);
    let duration = ctx.duration_seconds as f64;

    snapshot
        .iter()
        .map(|player| {
            let words: Vec<ScoredWord> = player
                .submissions
                .iter()
                .map(|submission| {
                    let word = &submission.word;
                    let elapsed =
                        (submission.submitted_at_ms.saturating_sub(ctx.started_at_ms)) as f64
                            / 1000.0;
                    let valid = !word.is_empty() && dictionary.is_valid(word);
                    let group_size = sizes.get(word).copied().unwrap_or(1);
                    let unique = group_size == 1;
                    let first_of_duplicates = group_size > 1
                        && firsts.get(word) == Some(&player.session_id);

                    let breakdown = match (&ctx.format, &ctx.prompt) {
                        (RoundFormat::SharedLetters, Prompt::Letters { tiles }) => {
                            ScoreBreakdown::SharedLetters(scoring::score_shared_letters(
                                word,
                                tiles,
                                valid,
                                elapsed,
                                duration,
                                first_of_duplicates,
                            ))
                        }
                        (RoundFormat::Subwords, Prompt::MainWord { word: main }) => {
                            ScoreBreakdown::Subword(scoring::score_subword(
                                word,
                                main,
                                valid,
                                elapsed,
                                duration,
                                unique,
                                first_of_duplicates,
                            ))
                        }
                        // Prompt/format mismatch cannot score; record a zero
                        // subword breakdown so the submission is still reported.
                        _ => ScoreBreakdown::Subword(scoring::score_subword(
                            word, "", false, elapsed, duration, false, false,
                        )),
                    };

                    ScoredWord {
                        word: word.clone(),
                        submitted_at_ms: submission.submitted_at_ms,
                        breakdown,
                    }
                })
                .collect();

            let round_points =
                scoring::round_to_cents(words.iter().map(|w| w.breakdown.round_points()).sum());

            PlayerRoundResult {
                session_id: player.session_id,
                display_name: player.display_name.clone(),
                words,
                round_points,
            }
        })
        .collect()
}

/// Top-10 leaderboard: descending by cumulative total, stable under ties so
/// players keep their prior relative order.
pub fn leaderboard(players: &[Player]) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_points
            .partial_cmp(&a.total_points)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .map(|p| LeaderboardEntry {
            display_name: p.display_name.clone(),
            total_points: p.total_points,
        })
        .collect()
}

/// Highest-scoring word of the round; ties go to the earliest submission.
pub fn notable_word(results: &[PlayerRoundResult]) -> Option<NotableWord> {
    results
        .iter()
        .flat_map(|result| {
            result
                .words
                .iter()
                .map(move |word| (result.display_name.clone(), word))
        })
        .filter(|(_, word)| word.breakdown.round_points() > 0.0)
        .min_by(|(_, a), (_, b)| {
            b.breakdown
                .round_points()
                .partial_cmp(&a.breakdown.round_points())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.submitted_at_ms.cmp(&b.submitted_at_ms))
        })
        .map(|(display_name, word)| NotableWord {
            word: word.word.clone(),
            display_name,
            points: word.breakdown.round_points(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn dict() -> Dictionary {
        Dictionary::from_list("eats\nseat\neast\nteas\npale\nleap\nplea\napple\nale\ntea\nape")
    }

    fn letters_ctx() -> RoundContext {
        RoundContext {
            format: RoundFormat::SharedLetters,
            prompt: Prompt::Letters {
                tiles: vec!["a".into(), "t".into(), "e".into(), "s".into()],
            },
            duration_seconds: 15,
            started_at_ms: 10_000,
        }
    }

    fn entry(name: &str, subs: Vec<(&str, u64, u64)>) -> PlayerSubmissions {
        PlayerSubmissions {
            session_id: Uuid::new_v4(),
            display_name: name.to_string(),
            submissions: subs
                .into_iter()
                .map(|(word, at_ms, seq)| Submission {
                    word: word.to_string(),
                    submitted_at_ms: at_ms,
                    seq,
                })
                .collect(),
        }
    }

    fn player(name: &str, points: f64) -> Player {
        Player {
            session_id: Uuid::new_v4(),
            display_name: name.to_string(),
            total_points: points,
            last_words: Vec::new(),
            last_round_points: 0.0,
            joined_at: String::new(),
            is_connected: true,
        }
    }

    #[test]
    fn test_sole_submitter_worked_example() {
        // "eats" at 5s elapsed of a 15s round: 10 base * 1.0667 = 10.67
        let results = score_round(&letters_ctx(), &[entry("Ana", vec![("eats", 15_000, 1)])], &dict());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].round_points, 10.67);
        match &results[0].words[0].breakdown {
            ScoreBreakdown::SharedLetters(b) => {
                assert_eq!(b.base_points, 10);
                assert_eq!(b.originality_bonus, 0);
            }
            other => panic!("unexpected breakdown: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_group_awards_one_originality_bonus() {
        let first = entry("Ana", vec![("eats", 12_000, 1)]);
        let second = entry("Ben", vec![("eats", 13_000, 2)]);
        let results = score_round(&letters_ctx(), &[first, second], &dict());

        let points = |r: &PlayerRoundResult| match &r.words[0].breakdown {
            ScoreBreakdown::SharedLetters(b) => {
                (b.originality_bonus, b.valid_word, b.contains_all, b.speed_bonus)
            }
            _ => panic!("expected shared-letters breakdown"),
        };

        let (ana_orig, ana_v, ana_c, ana_s) = points(&results[0]);
        let (ben_orig, ben_v, ben_c, ben_s) = points(&results[1]);
        assert_eq!(ana_orig, 5);
        assert_eq!(ben_orig, 0);
        // Every other component identical
        assert_eq!((ana_v, ana_c, ana_s), (ben_v, ben_c, ben_s));
        assert!(results[0].round_points > results[1].round_points);
    }

    #[test]
    fn test_scoring_pass_is_idempotent() {
        let snapshot = vec![
            entry("Ana", vec![("eats", 12_000, 1)]),
            entry("Ben", vec![("seat", 13_000, 2)]),
            entry("Cam", vec![("eats", 14_000, 3)]),
        ];
        let ctx = letters_ctx();
        let d = dict();
        let first = score_round(&ctx, &snapshot, &d);
        let second = score_round(&ctx, &snapshot, &d);
        assert_eq!(first, second);
    }

    #[test]
    fn test_subword_round_sums_distinct_words() {
        let ctx = RoundContext {
            format: RoundFormat::Subwords,
            prompt: Prompt::MainWord {
                word: "apple".into(),
            },
            duration_seconds: 30,
            started_at_ms: 0,
        };
        // All within first quarter: each word gets speed bonus.
        // pale: 5+5+2+3+10 = 25, ale: 5+5+0+3+10 = 23, peppy: 0
        let results = score_round(
            &ctx,
            &[entry("Ana", vec![("pale", 1_000, 1), ("ale", 2_000, 2), ("peppy", 3_000, 3)])],
            &dict(),
        );
        assert_eq!(results[0].round_points, 48.0);
        assert_eq!(results[0].words.len(), 3);
        assert_eq!(results[0].words[2].breakdown.round_points(), 0.0);
    }

    #[test]
    fn test_leaderboard_bounded_descending_stable() {
        let mut players: Vec<Player> = (0..12).map(|i| player(&format!("p{}", i), 5.0)).collect();
        players[3].total_points = 9.0;
        players[7].total_points = 1.0;

        let board = leaderboard(&players);
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].display_name, "p3");
        // Ties keep prior relative order
        assert_eq!(board[1].display_name, "p0");
        assert_eq!(board[2].display_name, "p1");
        assert!(board.windows(2).all(|w| w[0].total_points >= w[1].total_points));
        assert!(!board.iter().any(|e| e.display_name == "p7"));
    }

    #[test]
    fn test_notable_word_highest_then_earliest() {
        let snapshot = vec![
            entry("Ana", vec![("eats", 12_000, 1)]),
            entry("Ben", vec![("teas", 11_000, 2)]),
        ];
        let results = score_round(&letters_ctx(), &snapshot, &dict());
        // Same score shape, Ben submitted earlier
        let notable = notable_word(&results).expect("notable word");
        assert_eq!(notable.word, "teas");
        assert_eq!(notable.display_name, "Ben");
    }

    #[test]
    fn test_notable_word_none_when_all_zero() {
        let results = score_round(
            &letters_ctx(),
            &[entry("Ana", vec![("zzz", 12_000, 1)])],
            &dict(),
        );
        assert!(notable_word(&results).is_none());
    }
}
