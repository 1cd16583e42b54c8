use crate::progress::UserProgressState;

use super::models::{
    AchievementDefinition, AchievementTier, BadgeDefinition, BadgeRarity, CriteriaType,
};

/// Checks achievement/badge eligibility against accumulated counters and
/// applies idempotent unlocks. Runs after the other engines so it sees the
/// fully updated aggregate state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AchievementEvaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockResult {
    pub newly_unlocked: bool,
    pub xp_awarded: u64,
}

impl AchievementEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn counter(state: &UserProgressState, criteria: CriteriaType) -> u64 {
        match criteria {
            CriteriaType::TotalXp => state.total_xp,
            CriteriaType::Level => state.level as u64,
            CriteriaType::MissionsCompleted => state.missions_completed as u64,
            CriteriaType::CurrentStreak => state.current_streak as u64,
            CriteriaType::LongestStreak => state.longest_streak as u64,
        }
    }

    pub fn criterion_met(&self, state: &UserProgressState, criteria: CriteriaType, value: u64) -> bool {
        Self::counter(state, criteria) >= value
    }

    /// Achievements whose criteria are met but which the user has not
    /// unlocked yet.
    pub fn eligible_achievements<'a>(
        &self,
        catalog: &'a [AchievementDefinition],
        state: &UserProgressState,
    ) -> Vec<&'a AchievementDefinition> {
        catalog
            .iter()
            .filter(|def| {
                !state.achievements_unlocked.contains(&def.id)
                    && self.criterion_met(state, def.criteria, def.criteria_value)
            })
            .collect()
    }

    pub fn eligible_badges<'a>(
        &self,
        catalog: &'a [BadgeDefinition],
        state: &UserProgressState,
    ) -> Vec<&'a BadgeDefinition> {
        catalog
            .iter()
            .filter(|def| {
                !state.badges_earned.contains(&def.id)
                    && self.criterion_met(state, def.criteria, def.criteria_value)
            })
            .collect()
    }

    /// Records an unlock. Re-unlocking is a silent no-op with no award,
    /// unlike mission completion which strictly rejects a repeat.
    pub fn unlock_achievement(
        &self,
        state: &mut UserProgressState,
        definition: &AchievementDefinition,
    ) -> UnlockResult {
        if !state.achievements_unlocked.insert(definition.id.clone()) {
            return UnlockResult {
                newly_unlocked: false,
                xp_awarded: 0,
            };
        }

        let xp_awarded = if definition.xp_reward > 0 {
            definition.xp_reward
        } else {
            self.tier_xp_reward(definition.tier)
        };

        UnlockResult {
            newly_unlocked: true,
            xp_awarded,
        }
    }

    pub fn earn_badge(
        &self,
        state: &mut UserProgressState,
        definition: &BadgeDefinition,
    ) -> UnlockResult {
        if !state.badges_earned.insert(definition.id.clone()) {
            return UnlockResult {
                newly_unlocked: false,
                xp_awarded: 0,
            };
        }

        UnlockResult {
            newly_unlocked: true,
            xp_awarded: self.rarity_xp_reward(definition.rarity),
        }
    }

    pub fn tier_xp_reward(&self, tier: AchievementTier) -> u64 {
        match tier {
            AchievementTier::Bronze => 50,
            AchievementTier::Silver => 100,
            AchievementTier::Gold => 250,
            AchievementTier::Platinum => 500,
            AchievementTier::Diamond => 1000,
        }
    }

    pub fn rarity_xp_reward(&self, rarity: BadgeRarity) -> u64 {
        match rarity {
            BadgeRarity::Common => 25,
            BadgeRarity::Rare => 75,
            BadgeRarity::Epic => 200,
            BadgeRarity::Legendary => 600,
        }
    }
}
