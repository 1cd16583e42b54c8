use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Durable gamification state for one user. Created zeroed at registration;
/// every activity event derives a new state from the old one.
///
/// Invariants: `level` always equals the level derived from `total_xp`, and
/// `longest_streak >= current_streak`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgressState {
    pub user_id: String,
    pub total_xp: u64,
    pub level: u32,
    pub points: u64,
    pub achievements_unlocked: HashSet<String>,
    pub badges_earned: HashSet<String>,
    pub missions_completed: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub freezes_available: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl UserProgressState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_xp: 0,
            level: 1,
            points: 0,
            achievements_unlocked: HashSet::new(),
            badges_earned: HashSet::new(),
            missions_completed: 0,
            current_streak: 0,
            longest_streak: 0,
            freezes_available: 0,
            last_activity_at: None,
        }
    }
}

/// A one-time threshold crossing detected by diffing an old/new state pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Xp(u64),
    Level(u32),
    Streak(u32),
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Milestone::Xp(threshold) => write!(f, "xp_{threshold}"),
            Milestone::Level(level) => write!(f, "level_{level}"),
            Milestone::Streak(days) => write!(f, "streak_{days}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallProgress {
    pub level_progress: f64,
    pub achievement_progress: f64,
    pub mission_progress: f64,
    pub streak_progress: f64,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Ahead {
    User1,
    User2,
    Equal,
}

/// Head-to-head comparison; positive differences mean the first user leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressComparison {
    pub xp_difference: i64,
    pub level_difference: i64,
    pub ahead: Ahead,
}

/// One day of XP history, ordered oldest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XpHistoryEntry {
    pub date: DateTime<Utc>,
    pub xp_gained: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressVelocity {
    pub avg_xp_per_day: f64,
    pub estimated_days_to_next_level: Option<u32>,
}
