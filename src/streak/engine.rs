use chrono::{DateTime, Duration, Utc};

use crate::config::ProgressionConfig;

use super::models::{
    FreezeDecision, GapState, LongestStreakUpdate, StreakCalculation, StreakEvent,
    StreakHistoryEntry, StreakNotification, StreakNotificationKind, StreakRecord, StreakRewards,
    StreakStats, StreakUpdate,
};

/// Drives the daily-streak state machine. Every time-sensitive method takes
/// `now` explicitly so transitions replay deterministically in tests.
#[derive(Debug, Clone)]
pub struct StreakEngine {
    config: ProgressionConfig,
}

impl StreakEngine {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    /// Classifies the gap between `now` and the last qualifying activity.
    pub fn classify_gap(&self, last_login: Option<DateTime<Utc>>, now: DateTime<Utc>) -> GapState {
        let Some(last) = last_login else {
            return GapState::Fresh;
        };

        let gap = now.signed_duration_since(last);
        if gap <= Duration::hours(self.config.active_window_hours) {
            GapState::Active
        } else if gap <= Duration::hours(self.config.grace_window_hours) {
            GapState::Grace
        } else {
            GapState::Breaking
        }
    }

    /// The streak transition ignoring freezes. `update_streak` layers freeze
    /// consumption on top.
    pub fn calculate_streak(
        &self,
        last_login: Option<DateTime<Utc>>,
        current_streak: u32,
        now: DateTime<Utc>,
    ) -> StreakCalculation {
        match self.classify_gap(last_login, now) {
            GapState::Fresh => StreakCalculation {
                new_streak: 1,
                streak_maintained: true,
                streak_broken: false,
            },
            GapState::Active => StreakCalculation {
                new_streak: current_streak,
                streak_maintained: true,
                streak_broken: false,
            },
            GapState::Grace => StreakCalculation {
                new_streak: current_streak + 1,
                streak_maintained: true,
                streak_broken: false,
            },
            GapState::Breaking => StreakCalculation {
                new_streak: 0,
                streak_maintained: false,
                streak_broken: true,
            },
        }
    }

    /// Pure time predicate: has the grace window fully elapsed? Independent
    /// of freeze inventory. A first-ever login never breaks.
    pub fn should_break_streak(
        &self,
        last_login: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        self.classify_gap(last_login, now) == GapState::Breaking
    }

    /// A freeze is spent only when the streak would otherwise break, one is
    /// available, and there is a non-zero streak worth protecting.
    pub fn should_consume_freeze(
        &self,
        last_login: Option<DateTime<Utc>>,
        freezes_available: u32,
        current_streak: u32,
        now: DateTime<Utc>,
    ) -> FreezeDecision {
        if !self.should_break_streak(last_login, now) {
            return FreezeDecision {
                should_consume: false,
                freeze_worth_using: false,
                reason: "streak is not at risk".to_string(),
            };
        }
        if freezes_available == 0 {
            return FreezeDecision {
                should_consume: false,
                freeze_worth_using: current_streak > 0,
                reason: "no freezes available".to_string(),
            };
        }
        if current_streak == 0 {
            return FreezeDecision {
                should_consume: false,
                freeze_worth_using: false,
                reason: "no streak to protect".to_string(),
            };
        }
        FreezeDecision {
            should_consume: true,
            freeze_worth_using: true,
            reason: format!("protects a {current_streak}-day streak"),
        }
    }

    /// Applies one activity to a streak record. On a missed window with a
    /// freeze in stock the streak value is preserved as-is (not incremented)
    /// and exactly one freeze is consumed.
    pub fn update_streak(&self, record: &StreakRecord, now: DateTime<Utc>) -> StreakUpdate {
        let gap = self.classify_gap(record.last_login_at, now);

        if gap == GapState::Breaking {
            let decision = self.should_consume_freeze(
                record.last_login_at,
                record.freezes_available,
                record.current_streak,
                now,
            );
            if decision.should_consume {
                return StreakUpdate {
                    current_streak: record.current_streak,
                    streak_preserved: true,
                    freeze_consumed: true,
                    new_freeze_count: record.freezes_available - 1,
                    streak_incremented: false,
                    streak_broken: false,
                };
            }
            return StreakUpdate {
                current_streak: 0,
                streak_preserved: false,
                freeze_consumed: false,
                new_freeze_count: record.freezes_available,
                streak_incremented: false,
                streak_broken: true,
            };
        }

        let calc = self.calculate_streak(record.last_login_at, record.current_streak, now);
        StreakUpdate {
            current_streak: calc.new_streak,
            streak_preserved: true,
            freeze_consumed: false,
            new_freeze_count: record.freezes_available,
            streak_incremented: calc.new_streak > record.current_streak,
            streak_broken: false,
        }
    }

    /// Step function over streak length, total for all non-negative inputs.
    pub fn streak_multiplier(&self, streak_days: u32) -> f64 {
        self.config.multiplier_for_streak(streak_days)
    }

    pub fn streak_rewards(&self, base_xp: u64, streak: u32) -> StreakRewards {
        let multiplier = self.streak_multiplier(streak);
        let total_xp = (base_xp as f64 * multiplier).floor() as u64;
        StreakRewards {
            base_xp,
            multiplier,
            total_xp,
            bonus_xp: total_xp.saturating_sub(base_xp),
        }
    }

    pub fn update_longest_streak(&self, current: u32, longest: u32) -> LongestStreakUpdate {
        LongestStreakUpdate {
            longest_streak: current.max(longest),
            new_record: current > longest,
        }
    }

    pub fn can_purchase_freeze(&self, points: u64, cost: u64) -> bool {
        points >= cost
    }

    /// Freeze price grows geometrically with inventory so stockpiling stays
    /// expensive.
    pub fn freeze_cost(&self, owned_freezes: u32) -> u64 {
        let cost = self.config.freeze_base_cost as f64
            * self.config.freeze_cost_growth.powi(owned_freezes as i32);
        cost.round() as u64
    }

    /// Summarizes an ordered streak history. A break is any entry whose
    /// streak dropped below its predecessor's value.
    pub fn streak_stats(&self, history: &[StreakHistoryEntry]) -> StreakStats {
        if history.is_empty() {
            return StreakStats {
                total_days: 0,
                breaks_count: 0,
                average_streak: 0.0,
                longest_streak: 0,
                perfect_streak: true,
            };
        }

        let mut breaks_count = 0;
        for window in history.windows(2) {
            if window[1].streak < window[0].streak {
                breaks_count += 1;
            }
        }

        let total: u64 = history.iter().map(|entry| entry.streak as u64).sum();
        let longest_streak = history.iter().map(|entry| entry.streak).max().unwrap_or(0);

        StreakStats {
            total_days: history.len(),
            breaks_count,
            average_streak: total as f64 / history.len() as f64,
            longest_streak,
            perfect_streak: breaks_count == 0,
        }
    }

    /// Builds the user-facing message for a streak happening. Presentation
    /// only; the authoritative transition lives in `update_streak`.
    pub fn streak_notification(&self, event: &StreakEvent) -> StreakNotification {
        match event {
            StreakEvent::MilestoneReached { streak } => StreakNotification {
                kind: StreakNotificationKind::Milestone,
                message: format!("{streak}-day streak reached, keep it going!"),
            },
            StreakEvent::InactivityWarning { hours_since_login } => {
                let hours_left =
                    (self.config.grace_window_hours - hours_since_login).max(0);
                StreakNotification {
                    kind: StreakNotificationKind::Warning,
                    message: format!("Your streak expires in {hours_left} hours"),
                }
            }
            StreakEvent::StreakLost { lost_streak } => StreakNotification {
                kind: StreakNotificationKind::Break,
                message: format!("Your {lost_streak}-day streak has ended"),
            },
            StreakEvent::FreezeUsed {
                preserved_streak,
                freezes_left,
            } => StreakNotification {
                kind: StreakNotificationKind::Freeze,
                message: format!(
                    "A freeze saved your {preserved_streak}-day streak ({freezes_left} left)"
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn engine() -> StreakEngine {
        StreakEngine::new(ProgressionConfig::default())
    }

    fn at(secs_ago: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Some(now - Duration::seconds(secs_ago))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    const HOUR: i64 = 3600;

    #[test]
    fn first_ever_login_starts_streak_at_one() {
        let calc = engine().calculate_streak(None, 0, now());
        assert_eq!(calc.new_streak, 1);
        assert!(calc.streak_maintained);
        assert!(!calc.streak_broken);
    }

    #[test]
    fn gap_of_exactly_24h_keeps_streak_unchanged() {
        let calc = engine().calculate_streak(at(24 * HOUR, now()), 5, now());
        assert_eq!(calc.new_streak, 5);
        assert!(calc.streak_maintained);
    }

    #[test]
    fn one_second_past_24h_enters_grace_and_increments() {
        let calc = engine().calculate_streak(at(24 * HOUR + 1, now()), 5, now());
        assert_eq!(calc.new_streak, 6);
        assert!(calc.streak_maintained);
    }

    #[test]
    fn one_second_past_48h_breaks() {
        let calc = engine().calculate_streak(at(48 * HOUR + 1, now()), 5, now());
        assert_eq!(calc.new_streak, 0);
        assert!(!calc.streak_maintained);
        assert!(calc.streak_broken);
    }

    #[rstest]
    #[case(47 * HOUR, false)]
    #[case(48 * HOUR, false)]
    #[case(48 * HOUR + 1, true)]
    #[case(200 * HOUR, true)]
    fn break_predicate_is_a_pure_time_check(#[case] secs_ago: i64, #[case] expected: bool) {
        assert_eq!(
            engine().should_break_streak(at(secs_ago, now()), now()),
            expected
        );
    }

    #[test]
    fn freeze_not_spent_when_streak_is_safe() {
        let decision = engine().should_consume_freeze(at(10 * HOUR, now()), 3, 5, now());
        assert!(!decision.should_consume);
    }

    #[test]
    fn freeze_not_spent_on_zero_streak() {
        let decision = engine().should_consume_freeze(at(72 * HOUR, now()), 3, 0, now());
        assert!(!decision.should_consume);
        assert!(!decision.freeze_worth_using);
    }

    #[test]
    fn freeze_not_spent_when_none_available() {
        let decision = engine().should_consume_freeze(at(72 * HOUR, now()), 0, 5, now());
        assert!(!decision.should_consume);
    }

    #[test]
    fn freeze_spent_exactly_once_and_preserves_streak() {
        let record = StreakRecord {
            current_streak: 10,
            longest_streak: 10,
            freezes_available: 2,
            last_login_at: at(50 * HOUR, now()),
        };

        let update = engine().update_streak(&record, now());
        assert_eq!(update.current_streak, 10);
        assert!(update.streak_preserved);
        assert!(update.freeze_consumed);
        assert_eq!(update.new_freeze_count, 1);
        assert!(!update.streak_incremented);
        assert!(!update.streak_broken);
    }

    #[test]
    fn breach_without_freeze_resets_to_zero() {
        let record = StreakRecord {
            current_streak: 10,
            longest_streak: 10,
            freezes_available: 0,
            last_login_at: at(50 * HOUR, now()),
        };

        let update = engine().update_streak(&record, now());
        assert_eq!(update.current_streak, 0);
        assert!(update.streak_broken);
        assert!(!update.freeze_consumed);
    }

    #[test]
    fn grace_gap_increments_without_touching_freezes() {
        let record = StreakRecord {
            current_streak: 3,
            longest_streak: 8,
            freezes_available: 2,
            last_login_at: at(30 * HOUR, now()),
        };

        let update = engine().update_streak(&record, now());
        assert_eq!(update.current_streak, 4);
        assert!(update.streak_incremented);
        assert_eq!(update.new_freeze_count, 2);
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(6, 1.0)]
    #[case(7, 1.5)]
    #[case(14, 2.0)]
    #[case(30, 3.0)]
    #[case(1000, 3.0)]
    fn multiplier_bands(#[case] streak: u32, #[case] expected: f64) {
        assert_eq!(engine().streak_multiplier(streak), expected);
    }

    #[test]
    fn rewards_floor_the_multiplied_total() {
        let rewards = engine().streak_rewards(101, 7);
        assert_eq!(rewards.total_xp, 151);
        assert_eq!(rewards.bonus_xp, 50);
        assert_eq!(rewards.multiplier, 1.5);
    }

    #[test]
    fn longest_streak_round_trip() {
        let eng = engine();
        let up = eng.update_longest_streak(15, 10);
        assert_eq!(up.longest_streak, 15);
        assert!(up.new_record);

        let up = eng.update_longest_streak(8, 15);
        assert_eq!(up.longest_streak, 15);
        assert!(!up.new_record);
    }

    #[test]
    fn tie_is_not_a_new_record() {
        let up = engine().update_longest_streak(15, 15);
        assert_eq!(up.longest_streak, 15);
        assert!(!up.new_record);
    }

    #[test]
    fn freeze_cost_strictly_increases_with_inventory() {
        let eng = engine();
        let mut previous = 0;
        for owned in 0..8 {
            let cost = eng.freeze_cost(owned);
            assert!(cost > previous, "cost did not grow at {owned} owned");
            previous = cost;
        }
    }

    #[test]
    fn purchase_requires_sufficient_points() {
        let eng = engine();
        let cost = eng.freeze_cost(0);
        assert!(eng.can_purchase_freeze(cost, cost));
        assert!(!eng.can_purchase_freeze(cost - 1, cost));
    }

    #[test]
    fn stats_over_empty_history_are_zeroed_and_perfect() {
        let stats = engine().streak_stats(&[]);
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.average_streak, 0.0);
        assert!(stats.perfect_streak);
    }

    #[test]
    fn stats_count_breaks_and_track_longest() {
        let day = |offset: i64, streak: u32| StreakHistoryEntry {
            date: now() + Duration::days(offset),
            streak,
        };
        let history = vec![day(0, 1), day(1, 2), day(2, 3), day(3, 0), day(4, 1)];

        let stats = engine().streak_stats(&history);
        assert_eq!(stats.total_days, 5);
        assert_eq!(stats.breaks_count, 1);
        assert_eq!(stats.longest_streak, 3);
        assert!(!stats.perfect_streak);
        assert!((stats.average_streak - 1.4).abs() < 1e-9);
    }

    #[test]
    fn notifications_classify_by_event() {
        let eng = engine();
        let milestone = eng.streak_notification(&StreakEvent::MilestoneReached { streak: 7 });
        assert_eq!(milestone.kind, StreakNotificationKind::Milestone);

        let warning =
            eng.streak_notification(&StreakEvent::InactivityWarning { hours_since_login: 40 });
        assert_eq!(warning.kind, StreakNotificationKind::Warning);
        assert!(warning.message.contains('8'));

        let lost = eng.streak_notification(&StreakEvent::StreakLost { lost_streak: 12 });
        assert_eq!(lost.kind, StreakNotificationKind::Break);

        let freeze = eng.streak_notification(&StreakEvent::FreezeUsed {
            preserved_streak: 12,
            freezes_left: 1,
        });
        assert_eq!(freeze.kind, StreakNotificationKind::Freeze);
    }
}
