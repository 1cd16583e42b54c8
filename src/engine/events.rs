use serde::{Deserialize, Serialize};

use crate::progress::{Milestone, UserProgressState};
use crate::streak::{StreakNotification, StreakUpdate};

/// One activity's worth of state delta entering the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityEvent {
    DailyCheckIn,
    QuizCompleted { base_xp: u64 },
    LessonProgress { base_xp: u64 },
    MissionProgress { mission_id: String, increment: u32 },
}

/// Everything the calling layer needs to persist and to dispatch to the
/// notification channel after one activity is applied.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityOutcome {
    pub state: UserProgressState,
    pub xp_awarded: u64,
    pub points_awarded: u64,
    pub leveled_up: bool,
    pub streak: StreakUpdate,
    pub milestones: Vec<Milestone>,
    pub notifications: Vec<StreakNotification>,
    pub completed_mission: Option<String>,
    pub unlocked_achievements: Vec<String>,
    pub earned_badges: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreezePurchase {
    pub cost: u64,
    pub freezes_available: u32,
    pub points_remaining: u64,
}
