use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Persisted streak state for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub freezes_available: u32,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Classification of the gap between now and the last qualifying activity.
/// A same-day repeat login lands in `Active`: already counted, no increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GapState {
    /// First-ever activity.
    Fresh,
    /// Gap within the active window; streak unchanged.
    Active,
    /// Past the active window but inside the grace window; streak continues
    /// and increments.
    Grace,
    /// Past the grace window; streak breaks unless a freeze covers it.
    Breaking,
}

/// Result of the freeze-agnostic streak transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakCalculation {
    pub new_streak: u32,
    pub streak_maintained: bool,
    pub streak_broken: bool,
}

/// Whether a freeze should be spent to cover a missed window.
#[derive(Debug, Clone, Serialize)]
pub struct FreezeDecision {
    pub should_consume: bool,
    pub freeze_worth_using: bool,
    /// Diagnostic only; control flow never reads this.
    pub reason: String,
}

/// Full outcome of applying one activity to a streak record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub current_streak: u32,
    pub streak_preserved: bool,
    pub freeze_consumed: bool,
    pub new_freeze_count: u32,
    pub streak_incremented: bool,
    pub streak_broken: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreakRewards {
    pub base_xp: u64,
    pub multiplier: f64,
    pub total_xp: u64,
    pub bonus_xp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LongestStreakUpdate {
    pub longest_streak: u32,
    /// Strictly greater than the old record; a tie is not a new record.
    pub new_record: bool,
}

/// One day of streak history, ordered oldest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreakHistoryEntry {
    pub date: DateTime<Utc>,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreakStats {
    pub total_days: usize,
    pub breaks_count: u32,
    pub average_streak: f64,
    pub longest_streak: u32,
    pub perfect_streak: bool,
}

/// Streak happenings that deserve a user-facing message.
#[derive(Debug, Clone, Copy)]
pub enum StreakEvent {
    MilestoneReached { streak: u32 },
    InactivityWarning { hours_since_login: i64 },
    StreakLost { lost_streak: u32 },
    FreezeUsed { preserved_streak: u32, freezes_left: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StreakNotificationKind {
    Milestone,
    Warning,
    Break,
    Freeze,
}

/// Presentation payload handed to the notification layer. Producing one
/// never mutates streak state.
#[derive(Debug, Clone, Serialize)]
pub struct StreakNotification {
    pub kind: StreakNotificationKind,
    pub message: String,
}
