use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::config::ProgressionConfig;

use super::errors::MissionError;
use super::models::{
    MissionDefinition, MissionProgress, MissionRewards, MissionStatus, MissionType,
};

/// Mission progress, completion, reward, and ordering rules.
#[derive(Debug, Clone)]
pub struct MissionEngine {
    config: ProgressionConfig,
}

impl MissionEngine {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    /// Boundary validation for definitions coming in from storage or admin
    /// tooling. The computation methods assume a valid definition.
    pub fn validate_definition(&self, mission: &MissionDefinition) -> Result<(), MissionError> {
        if mission.id.is_empty() {
            return Err(MissionError::Validation("mission id is empty".to_string()));
        }
        if mission.target_count == 0 {
            return Err(MissionError::Validation(format!(
                "mission {} has a zero target count",
                mission.id
            )));
        }
        if !mission.multiplier.is_finite() || mission.multiplier <= 0.0 {
            return Err(MissionError::Validation(format!(
                "mission {} has a non-positive multiplier",
                mission.id
            )));
        }
        Ok(())
    }

    /// Percentage complete, remaining amount, and completion flag.
    /// Over-completion clamps instead of erroring.
    pub fn mission_progress(
        &self,
        mission: &MissionDefinition,
        current_progress: u32,
    ) -> MissionStatus {
        let target = mission.target_count.max(1);
        let percentage = ((current_progress as u64 * 100) / target as u64).min(100) as u8;
        MissionStatus {
            percentage,
            remaining: target.saturating_sub(current_progress),
            completed: current_progress >= target,
        }
    }

    /// Target reached, regardless of mission type.
    pub fn is_complete(&self, mission: &MissionDefinition, current_progress: u32) -> bool {
        current_progress >= mission.target_count
    }

    /// Marks a mission completed at `now`. Rejects a repeat completion and a
    /// completion below target; both are caller-visible domain errors.
    pub fn complete_mission(
        &self,
        mission: &MissionDefinition,
        progress: &MissionProgress,
        now: DateTime<Utc>,
    ) -> Result<MissionProgress, MissionError> {
        if progress.is_completed() {
            return Err(MissionError::AlreadyCompleted(mission.id.clone()));
        }
        if !self.is_complete(mission, progress.current_progress) {
            return Err(MissionError::TargetNotReached {
                mission_id: mission.id.clone(),
                progress: progress.current_progress,
                target: mission.target_count,
            });
        }

        let mut completed = progress.clone();
        completed.completed_at = Some(now);
        Ok(completed)
    }

    /// Reward payout. The mission's own multiplier applies first, to both XP
    /// and points; a qualifying streak (7+ days) then boosts XP only. Each
    /// step floors so payouts stay integer-reproducible.
    pub fn mission_rewards(
        &self,
        mission: &MissionDefinition,
        user_streak: Option<u32>,
    ) -> MissionRewards {
        let mut xp = (mission.xp_reward as f64 * mission.multiplier).floor() as u64;
        let points = (mission.points_reward as f64 * mission.multiplier).floor() as u64;

        let streak_bonus = user_streak
            .map(|streak| self.config.multiplier_for_streak(streak))
            .unwrap_or(1.0);
        let bonus_applied = streak_bonus > 1.0;
        if bonus_applied {
            xp = (xp as f64 * streak_bonus).floor() as u64;
        }

        MissionRewards {
            xp,
            points,
            bonus_applied,
            streak_bonus,
        }
    }

    /// Reset cadence: daily after 24h, weekly after 7 days, special never.
    pub fn should_reset(
        &self,
        mission: &MissionDefinition,
        last_reset: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        let elapsed = now.signed_duration_since(last_reset);
        match mission.mission_type {
            MissionType::Daily => elapsed >= Duration::hours(24),
            MissionType::Weekly => elapsed >= Duration::days(7),
            MissionType::Special => false,
        }
    }

    /// Composite sort score: proximity to completion dominates, reward size
    /// and special status push a mission up the list.
    pub fn mission_priority(&self, mission: &MissionDefinition, current_progress: u32) -> f64 {
        let weights = self.config.priority_weights;
        let completion_ratio =
            (current_progress as f64 / mission.target_count.max(1) as f64).min(1.0);

        let mut score = weights.completion * completion_ratio
            + weights.xp_reward * (mission.xp_reward as f64 / 100.0);
        if mission.mission_type == MissionType::Special {
            score += weights.special_boost;
        }
        score
    }

    /// Total order for mission lists: higher priority first, ties broken by
    /// id so sorting is deterministic.
    pub fn priority_order(
        &self,
        a: (&MissionDefinition, u32),
        b: (&MissionDefinition, u32),
    ) -> Ordering {
        let score_a = self.mission_priority(a.0, a.1);
        let score_b = self.mission_priority(b.0, b.1);
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn engine() -> MissionEngine {
        MissionEngine::new(ProgressionConfig::default())
    }

    fn mission(id: &str, mission_type: MissionType, target: u32, xp: u64) -> MissionDefinition {
        MissionDefinition {
            id: id.to_string(),
            mission_type,
            target_count: target,
            xp_reward: xp,
            points_reward: 50,
            multiplier: 1.0,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case(0, 0, 10, false)]
    #[case(5, 50, 5, false)]
    #[case(10, 100, 0, true)]
    #[case(15, 100, 0, true)]
    fn progress_percentage_clamps(
        #[case] progress: u32,
        #[case] percentage: u8,
        #[case] remaining: u32,
        #[case] completed: bool,
    ) {
        let def = mission("m1", MissionType::Daily, 10, 100);
        let status = engine().mission_progress(&def, progress);
        assert_eq!(status.percentage, percentage);
        assert_eq!(status.remaining, remaining);
        assert_eq!(status.completed, completed);
    }

    #[test]
    fn completion_check_ignores_mission_type() {
        let eng = engine();
        for mission_type in [MissionType::Daily, MissionType::Weekly, MissionType::Special] {
            let def = mission("m", mission_type, 3, 10);
            assert!(eng.is_complete(&def, 3));
            assert!(!eng.is_complete(&def, 2));
        }
    }

    #[test]
    fn completing_once_sets_timestamp() {
        let def = mission("m1", MissionType::Daily, 5, 100);
        let mut progress = MissionProgress::new("m1", "user-1");
        progress.current_progress = 5;

        let completed = engine().complete_mission(&def, &progress, now()).unwrap();
        assert_eq!(completed.completed_at, Some(now()));
    }

    #[test]
    fn completing_twice_is_rejected() {
        let def = mission("m1", MissionType::Daily, 5, 100);
        let mut progress = MissionProgress::new("m1", "user-1");
        progress.current_progress = 5;

        let eng = engine();
        let completed = eng.complete_mission(&def, &progress, now()).unwrap();
        let second = eng.complete_mission(&def, &completed, now());
        assert_eq!(
            second,
            Err(MissionError::AlreadyCompleted("m1".to_string()))
        );
    }

    #[test]
    fn completing_below_target_is_rejected() {
        let def = mission("m1", MissionType::Daily, 5, 100);
        let mut progress = MissionProgress::new("m1", "user-1");
        progress.current_progress = 3;

        let result = engine().complete_mission(&def, &progress, now());
        assert!(matches!(result, Err(MissionError::TargetNotReached { .. })));
    }

    #[test]
    fn base_rewards_pass_through_without_streak() {
        let def = mission("m1", MissionType::Daily, 5, 100);
        let rewards = engine().mission_rewards(&def, None);
        assert_eq!(rewards.xp, 100);
        assert_eq!(rewards.points, 50);
        assert!(!rewards.bonus_applied);
    }

    #[test]
    fn seven_day_streak_boosts_xp_only() {
        let def = mission("m1", MissionType::Daily, 5, 100);
        let rewards = engine().mission_rewards(&def, Some(7));
        assert_eq!(rewards.xp, 150);
        assert_eq!(rewards.points, 50);
        assert!(rewards.bonus_applied);
        assert_eq!(rewards.streak_bonus, 1.5);
    }

    #[test]
    fn short_streak_earns_no_bonus() {
        let def = mission("m1", MissionType::Daily, 5, 100);
        let rewards = engine().mission_rewards(&def, Some(3));
        assert_eq!(rewards.xp, 100);
        assert!(!rewards.bonus_applied);
        assert_eq!(rewards.streak_bonus, 1.0);
    }

    #[test]
    fn type_multiplier_applies_before_streak_bonus() {
        let mut def = mission("m1", MissionType::Special, 5, 100);
        def.multiplier = 2.0;

        let rewards = engine().mission_rewards(&def, Some(7));
        // 100 * 2.0 = 200, then * 1.5 = 300
        assert_eq!(rewards.xp, 300);
        assert_eq!(rewards.points, 100);
        assert!(rewards.bonus_applied);
    }

    #[rstest]
    #[case(MissionType::Daily, 23, false)]
    #[case(MissionType::Daily, 24, true)]
    #[case(MissionType::Weekly, 167, false)]
    #[case(MissionType::Weekly, 168, true)]
    #[case(MissionType::Special, 10_000, false)]
    fn reset_cadence(
        #[case] mission_type: MissionType,
        #[case] hours_elapsed: i64,
        #[case] expected: bool,
    ) {
        let def = mission("m", mission_type, 5, 10);
        let last_reset = now() - Duration::hours(hours_elapsed);
        assert_eq!(engine().should_reset(&def, last_reset, now()), expected);
    }

    #[test]
    fn nearly_done_mission_outranks_richer_fresh_one() {
        let eng = engine();
        let nearly_done = mission("a", MissionType::Daily, 10, 50);
        let fresh_rich = mission("b", MissionType::Daily, 10, 500);

        let score_a = eng.mission_priority(&nearly_done, 9);
        let score_b = eng.mission_priority(&fresh_rich, 0);
        assert!(score_a > score_b);
    }

    #[test]
    fn special_missions_get_a_boost() {
        let eng = engine();
        let daily = mission("a", MissionType::Daily, 10, 100);
        let special = mission("b", MissionType::Special, 10, 100);
        assert!(eng.mission_priority(&special, 5) > eng.mission_priority(&daily, 5));
    }

    #[test]
    fn priority_order_breaks_ties_by_id() {
        let eng = engine();
        let first = mission("alpha", MissionType::Daily, 10, 100);
        let second = mission("beta", MissionType::Daily, 10, 100);

        assert_eq!(
            eng.priority_order((&first, 5), (&second, 5)),
            Ordering::Less
        );

        let mut list = vec![(&second, 5u32), (&first, 5u32)];
        list.sort_by(|a, b| eng.priority_order((a.0, a.1), (b.0, b.1)));
        assert_eq!(list[0].0.id, "alpha");
    }

    #[test]
    fn validation_rejects_malformed_definitions() {
        let eng = engine();
        let mut def = mission("", MissionType::Daily, 5, 10);
        assert!(eng.validate_definition(&def).is_err());

        def.id = "m".to_string();
        def.target_count = 0;
        assert!(eng.validate_definition(&def).is_err());

        def.target_count = 5;
        def.multiplier = f64::NAN;
        assert!(eng.validate_definition(&def).is_err());

        def.multiplier = 1.0;
        assert!(eng.validate_definition(&def).is_ok());
    }
}
