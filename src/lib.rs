// Library crate for the levelup gamification rules engine
// This file exposes the public API for integration tests

pub mod achievement;
pub mod config;
pub mod engine;
pub mod level;
pub mod mission;
pub mod progress;
pub mod streak;

// Re-export commonly used types for easier access in tests
pub use achievement::{AchievementDefinition, AchievementEvaluator, BadgeDefinition};
pub use config::ProgressionConfig;
pub use engine::{
    ActivityEvent, ActivityOutcome, EngineError, InMemoryProgressRepository, ProgressRepository,
    ProgressionService,
};
pub use level::LevelCalculator;
pub use mission::{MissionDefinition, MissionEngine, MissionError, MissionProgress};
pub use progress::{Milestone, ProgressAggregator, UserProgressState};
pub use streak::{StreakEngine, StreakRecord};
