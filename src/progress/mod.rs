mod aggregator;
pub mod models;

pub use aggregator::ProgressAggregator;
pub use models::{
    Ahead, Milestone, OverallProgress, ProgressComparison, ProgressVelocity, UserProgressState,
    XpHistoryEntry,
};
