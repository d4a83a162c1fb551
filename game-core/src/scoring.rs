use game_types::{SessionId, SharedLettersBreakdown, Submission, SubwordBreakdown};
use std::collections::HashMap;

/// Shared-letters point table.
const SHARED_VALID_POINTS: u32 = 5;
const SHARED_CONTAINS_ALL_POINTS: u32 = 3;
const SHARED_SPEED_BONUS: u32 = 2;
const SHARED_ORIGINALITY_BONUS: u32 = 5;

/// Subword point table.
const SUBWORD_VALID_POINTS: u32 = 5;
const SUBWORD_FORMABLE_POINTS: u32 = 5;
const SUBWORD_SPEED_BONUS: u32 = 3;
const SUBWORD_UNIQUENESS_BONUS: u32 = 10;
const SUBWORD_FIRST_TO_FIND_BONUS: u32 = 5;

/// Trim and lowercase; every check downstream assumes this has been applied.
pub fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Round to 2 decimal places for every published point total.
pub fn round_to_cents(points: f64) -> f64 {
    (points * 100.0).round() / 100.0
}

/// Per-letter substring containment: every required tile must appear in the
/// word at least once. Repeats in the tile set do NOT require repeats in the
/// word; one occurrence can satisfy multiple identical tiles. This is not a
/// multiset check.
pub fn contains_all_letters(word: &str, tiles: &[String]) -> bool {
    tiles.iter().all(|tile| {
        tile.chars()
            .next()
            .map(|c| word.contains(c.to_ascii_lowercase()))
            .unwrap_or(false)
    })
}

/// Multiset-subset check: the word must be formable from the main word's
/// letters, consuming each occurrence at most once ("peppy" needs three p's,
/// "apple" only has two).
pub fn is_formable_from(word: &str, main_word: &str) -> bool {
    let mut available: HashMap<char, u32> = HashMap::new();
    for c in main_word.chars() {
        *available.entry(c).or_insert(0) += 1;
    }

    for c in word.chars() {
        match available.get_mut(&c) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }
    true
}

/// Length bonus for the shared-letters format: +1 per character beyond 5.
pub fn shared_letters_length_bonus(len: usize) -> u32 {
    len.saturating_sub(5) as u32
}

/// Fixed length bonus table for the subword format.
pub fn subword_length_bonus(len: usize) -> u32 {
    match len {
        0..=3 => 0,
        4 => 2,
        5 => 5,
        6 => 9,
        7 => 14,
        n => 20 + 3 * (n as u32 - 8),
    }
}

/// Score one shared-letters submission. `valid` is the dictionary verdict for
/// the (already normalized) word; duplicate grouping is resolved by the
/// caller and passed as `first_of_group`.
///
/// A word failing validity or containment scores exactly 0 but still gets a
/// breakdown so the player sees why.
pub fn score_shared_letters(
    word: &str,
    tiles: &[String],
    valid: bool,
    elapsed_seconds: f64,
    duration_seconds: f64,
    first_of_group: bool,
) -> SharedLettersBreakdown {
    let contains_all = contains_all_letters(word, tiles);
    if !valid || !contains_all {
        return SharedLettersBreakdown {
            valid_word: 0,
            contains_all: 0,
            length_bonus: 0,
            speed_bonus: 0,
            originality_bonus: 0,
            base_points: 0,
            time_multiplier: 1.0,
            round_points: 0.0,
        };
    }

    let elapsed = elapsed_seconds.clamp(0.0, duration_seconds);
    let valid_word = SHARED_VALID_POINTS;
    let contains_all_points = SHARED_CONTAINS_ALL_POINTS;
    let length_bonus = shared_letters_length_bonus(word.len());
    let speed_bonus = if elapsed <= duration_seconds / 2.0 {
        SHARED_SPEED_BONUS
    } else {
        0
    };
    let originality_bonus = if first_of_group {
        SHARED_ORIGINALITY_BONUS
    } else {
        0
    };

    let base_points =
        valid_word + contains_all_points + length_bonus + speed_bonus + originality_bonus;
    let remaining = duration_seconds - elapsed;
    let time_multiplier = 1.0 + (remaining / duration_seconds) * 0.1;
    let round_points = round_to_cents(base_points as f64 * time_multiplier);

    SharedLettersBreakdown {
        valid_word,
        contains_all: contains_all_points,
        length_bonus,
        speed_bonus,
        originality_bonus,
        base_points,
        time_multiplier,
        round_points,
    }
}

/// Score one subword submission. `unique` means no other player submitted the
/// same normalized word this round; `first_of_group` marks the earliest
/// submitter within a duplicate group. The two are mutually exclusive: a sole
/// submitter earns the uniqueness bonus, the earliest of a duplicate group
/// earns the smaller first-to-find bonus. No time multiplier in this format.
pub fn score_subword(
    word: &str,
    main_word: &str,
    valid: bool,
    elapsed_seconds: f64,
    duration_seconds: f64,
    unique: bool,
    first_of_group: bool,
) -> SubwordBreakdown {
    let formable = is_formable_from(word, main_word);
    if !valid || !formable {
        return SubwordBreakdown {
            valid_word: 0,
            formable: 0,
            length_bonus: 0,
            speed_bonus: 0,
            uniqueness_bonus: 0,
            first_to_find_bonus: 0,
            round_points: 0.0,
        };
    }

    let elapsed = elapsed_seconds.clamp(0.0, duration_seconds);
    let speed_bonus = if elapsed <= duration_seconds / 4.0 {
        SUBWORD_SPEED_BONUS
    } else {
        0
    };
    let uniqueness_bonus = if unique { SUBWORD_UNIQUENESS_BONUS } else { 0 };
    let first_to_find_bonus = if !unique && first_of_group {
        SUBWORD_FIRST_TO_FIND_BONUS
    } else {
        0
    };
    let length_bonus = subword_length_bonus(word.len());

    let total = SUBWORD_VALID_POINTS
        + SUBWORD_FORMABLE_POINTS
        + length_bonus
        + speed_bonus
        + uniqueness_bonus
        + first_to_find_bonus;

    SubwordBreakdown {
        valid_word: SUBWORD_VALID_POINTS,
        formable: SUBWORD_FORMABLE_POINTS,
        length_bonus,
        speed_bonus,
        uniqueness_bonus,
        first_to_find_bonus,
        round_points: total as f64,
    }
}

/// Resolve duplicate-word groups across a round's full submission set.
///
/// Returns, for every normalized word, the session whose submission has the
/// earliest server timestamp; timestamp ties fall back to arrival order at
/// the store (`seq`). Exactly one submitter per group wins.
pub fn first_submitters(submissions: &[(SessionId, Submission)]) -> HashMap<String, SessionId> {
    let mut earliest: HashMap<String, (u64, u64, SessionId)> = HashMap::new();

    for (session_id, submission) in submissions {
        let key = submission.word.clone();
        let candidate = (submission.submitted_at_ms, submission.seq, *session_id);
        earliest
            .entry(key)
            .and_modify(|current| {
                if (candidate.0, candidate.1) < (current.0, current.1) {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    earliest
        .into_iter()
        .map(|(word, (_, _, session))| (word, session))
        .collect()
}

/// Count how many distinct players submitted each normalized word.
pub fn group_sizes(submissions: &[(SessionId, Submission)]) -> HashMap<String, usize> {
    let mut sizes: HashMap<String, usize> = HashMap::new();
    for (_, submission) in submissions {
        *sizes.entry(submission.word.clone()).or_insert(0) += 1;
    }
    sizes
}
