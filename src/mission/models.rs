use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    Daily,
    Weekly,
    Special,
}

/// Immutable mission template; only administrative tooling changes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDefinition {
    pub id: String,
    pub mission_type: MissionType,
    pub target_count: u32,
    pub xp_reward: u64,
    pub points_reward: u64,
    /// Reward multiplier, 1.0 unless the mission is boosted.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

/// One user's progress against a mission. Frozen once `completed_at` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgress {
    pub mission_id: String,
    pub user_id: String,
    pub current_progress: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MissionProgress {
    pub fn new(mission_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            mission_id: mission_id.into(),
            user_id: user_id.into(),
            current_progress: 0,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissionStatus {
    /// Integer percentage, clamped to 0..=100 even when over-completed.
    pub percentage: u8,
    pub remaining: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MissionRewards {
    pub xp: u64,
    pub points: u64,
    pub bonus_applied: bool,
    /// Streak multiplier that was applied to XP, 1.0 when no bonus.
    pub streak_bonus: f64,
}
