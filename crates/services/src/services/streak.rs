//! Streak calculation over a habit's completion history.
//!
//! Day boundaries are UTC calendar days: the stored instants are UTC and
//! bucketing them in UTC keeps the result independent of server timezone
//! and DST. Completions timestamped after `today` (clock skew, manual
//! back-dating gone wrong) are clamped to `today` before bucketing.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Derived statistics for one habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct StreakStats {
    /// Consecutive days with at least one completion, ending at `today`.
    /// Zero when `today` itself has no completion.
    pub current_streak: i64,
    /// Longest consecutive-day run anywhere in the history.
    pub longest_streak: i64,
    /// Count of completion records; same-day duplicates are NOT collapsed.
    pub total_completions: i64,
}

/// Compute the stats triple from an unordered list of completion instants.
///
/// `today` is caller-supplied rather than read from the clock, so the
/// function is deterministic and total: any input degenerates to zeros
/// rather than failing.
pub fn compute_streaks(completed_at: &[DateTime<Utc>], today: NaiveDate) -> StreakStats {
    let total_completions = completed_at.len() as i64;

    // Bucket to UTC days, clamping future instants to today.
    let mut days: Vec<NaiveDate> = completed_at
        .iter()
        .map(|ts| ts.date_naive().min(today))
        .collect();
    days.sort_unstable();
    days.dedup();

    let mut longest_streak: i64 = 0;
    let mut run: i64 = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in &days {
        run = match prev {
            Some(p) if (day - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest_streak = longest_streak.max(run);
        prev = Some(day);
    }

    // Walk backward from today; the first missing day ends the streak.
    let day_set: HashSet<NaiveDate> = days.into_iter().collect();
    let mut current_streak: i64 = 0;
    let mut cursor = today;
    while day_set.contains(&cursor) {
        current_streak += 1;
        match cursor.pred_opt() {
            Some(prev_day) => cursor = prev_day,
            None => break,
        }
    }

    StreakStats {
        current_streak,
        // The run ending today may itself be the longest.
        longest_streak: longest_streak.max(current_streak),
        total_completions,
    }
}
