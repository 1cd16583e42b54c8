mod engine;
pub mod models;

pub use engine::StreakEngine;
pub use models::{
    FreezeDecision, GapState, LongestStreakUpdate, StreakCalculation, StreakEvent,
    StreakHistoryEntry, StreakNotification, StreakNotificationKind, StreakRecord, StreakRewards,
    StreakStats, StreakUpdate,
};
