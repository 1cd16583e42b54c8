mod evaluator;
pub mod models;

pub use evaluator::{AchievementEvaluator, UnlockResult};
pub use models::{
    AchievementDefinition, AchievementTier, BadgeDefinition, BadgeRarity, CriteriaType,
};
