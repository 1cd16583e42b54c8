use crate::config::ProgressionConfig;
use crate::level::{LevelCalculator, XpProgress};

use super::models::{
    Ahead, Milestone, OverallProgress, ProgressComparison, ProgressVelocity, UserProgressState,
    XpHistoryEntry,
};

/// Cross-cutting progress math over full user records: composite scoring,
/// old/new milestone diffing, head-to-head comparison, and velocity.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    config: ProgressionConfig,
    calculator: LevelCalculator,
}

impl ProgressAggregator {
    pub fn new(config: ProgressionConfig) -> Self {
        let calculator = LevelCalculator::from_config(&config);
        Self { config, calculator }
    }

    pub fn xp_progress(&self, state: &UserProgressState) -> XpProgress {
        self.calculator.xp_progress(state.level, state.total_xp)
    }

    pub fn level_progress(&self, state: &UserProgressState) -> f64 {
        self.xp_progress(state).progress_percentage
    }

    pub fn next_level_requirement(&self, state: &UserProgressState) -> u64 {
        self.xp_progress(state).next_level_xp
    }

    /// Weighted composite over every progression axis. The level component
    /// uses a continuous XP-derived value rather than the cached integer
    /// level, so strictly more XP always means a strictly higher score.
    pub fn overall_progress(&self, state: &UserProgressState) -> OverallProgress {
        let weights = self.config.overall_weights;

        let continuous_level = (state.total_xp as f64 / 100.0).sqrt() + 1.0;
        let achievement_count =
            (state.achievements_unlocked.len() + state.badges_earned.len()) as f64;

        let overall_score = weights.level * continuous_level
            + weights.achievements * achievement_count
            + weights.missions * state.missions_completed as f64
            + weights.streak * state.current_streak as f64;

        OverallProgress {
            level_progress: self.level_progress(state),
            achievement_progress: achievement_count,
            mission_progress: state.missions_completed as f64,
            streak_progress: state.current_streak as f64,
            overall_score,
        }
    }

    /// Milestones newly crossed between two states: XP round-number
    /// boundaries, level-ups, and streak thresholds from the milestone
    /// table. Empty when nothing was crossed; each milestone fires at most
    /// once per transition because the diff is over the pair.
    pub fn progress_milestones(
        &self,
        old: &UserProgressState,
        new: &UserProgressState,
    ) -> Vec<Milestone> {
        let mut milestones = Vec::new();

        let step = self.config.xp_milestone_step.max(1);
        let mut boundary = (old.total_xp / step + 1) * step;
        while boundary <= new.total_xp {
            milestones.push(Milestone::Xp(boundary));
            boundary += step;
        }

        for level in (old.level + 1)..=new.level {
            milestones.push(Milestone::Level(level));
        }

        for milestone in &self.config.streak_milestones {
            if old.current_streak < milestone.days && new.current_streak >= milestone.days {
                milestones.push(Milestone::Streak(milestone.days));
            }
        }

        milestones
    }

    /// Signed so that positive means the first user is ahead.
    pub fn compare_progress(
        &self,
        user1: &UserProgressState,
        user2: &UserProgressState,
    ) -> ProgressComparison {
        let xp_difference = user1.total_xp as i64 - user2.total_xp as i64;
        let level_difference = user1.level as i64 - user2.level as i64;

        let ahead = match xp_difference {
            d if d > 0 => Ahead::User1,
            d if d < 0 => Ahead::User2,
            _ => Ahead::Equal,
        };

        ProgressComparison {
            xp_difference,
            level_difference,
            ahead,
        }
    }

    /// Average XP gained per calendar day spanned by the history. An empty
    /// history yields zero velocity and no estimate.
    pub fn progress_velocity(&self, history: &[XpHistoryEntry]) -> ProgressVelocity {
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            return ProgressVelocity {
                avg_xp_per_day: 0.0,
                estimated_days_to_next_level: None,
            };
        };

        let days_spanned = last.date.signed_duration_since(first.date).num_days() + 1;
        let total_gained: u64 = history.iter().map(|entry| entry.xp_gained).sum();

        ProgressVelocity {
            avg_xp_per_day: total_gained as f64 / days_spanned.max(1) as f64,
            estimated_days_to_next_level: None,
        }
    }

    /// Estimate with an explicit rate and target: ceil of the remaining XP
    /// over the rate. An already-met target estimates zero days.
    pub fn velocity_with_target(
        &self,
        avg_xp_per_day: f64,
        current_xp: u64,
        target_xp: u64,
    ) -> ProgressVelocity {
        let estimated_days_to_next_level = if avg_xp_per_day > 0.0 {
            let remaining = target_xp.saturating_sub(current_xp) as f64;
            Some((remaining / avg_xp_per_day).ceil() as u32)
        } else {
            None
        };

        ProgressVelocity {
            avg_xp_per_day,
            estimated_days_to_next_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn aggregator() -> ProgressAggregator {
        ProgressAggregator::new(ProgressionConfig::default())
    }

    fn state_with(xp: u64, level: u32) -> UserProgressState {
        let mut state = UserProgressState::new("user-1");
        state.total_xp = xp;
        state.level = level;
        state
    }

    #[test]
    fn wrappers_delegate_to_level_calculator() {
        let agg = aggregator();
        let state = state_with(150, 2);
        let progress = agg.xp_progress(&state);
        assert_eq!(progress.next_level_xp, 400);
        assert_eq!(agg.next_level_requirement(&state), 400);
        assert!(agg.level_progress(&state) > 0.0);
    }

    #[test]
    fn overall_score_strictly_grows_when_dominating() {
        let agg = aggregator();
        let weaker = state_with(500, 3);
        let mut stronger = state_with(501, 3);
        stronger.missions_completed = 1;
        stronger.current_streak = 1;
        stronger.achievements_unlocked.insert("a".to_string());

        let weak = agg.overall_progress(&weaker);
        let strong = agg.overall_progress(&stronger);
        assert!(strong.overall_score > weak.overall_score);
    }

    #[test]
    fn more_xp_alone_raises_the_score() {
        let agg = aggregator();
        // Same cached level, different XP.
        let a = agg.overall_progress(&state_with(450, 3));
        let b = agg.overall_progress(&state_with(460, 3));
        assert!(b.overall_score > a.overall_score);
    }

    #[test]
    fn no_milestones_without_a_crossing() {
        let agg = aggregator();
        // 850 XP stays under the 1000 boundary and level is unchanged.
        let old = state_with(500, 3);
        let new = state_with(850, 3);
        assert!(agg.progress_milestones(&old, &new).is_empty());
    }

    #[test]
    fn xp_boundary_fires_once_on_first_crossing() {
        let agg = aggregator();
        let old = state_with(950, 4);
        let new = state_with(1050, 4);
        let milestones = agg.progress_milestones(&old, &new);
        assert_eq!(milestones, vec![Milestone::Xp(1000)]);
        assert_eq!(milestones[0].to_string(), "xp_1000");
    }

    #[test]
    fn big_jump_fires_each_crossed_boundary_and_level() {
        let agg = aggregator();
        let old = state_with(900, 4);
        let new = state_with(2600, 6);
        let milestones = agg.progress_milestones(&old, &new);
        assert!(milestones.contains(&Milestone::Xp(1000)));
        assert!(milestones.contains(&Milestone::Xp(2000)));
        assert!(milestones.contains(&Milestone::Level(5)));
        assert!(milestones.contains(&Milestone::Level(6)));
    }

    #[test]
    fn streak_milestones_fire_on_newly_reached_days() {
        let agg = aggregator();
        let mut old = state_with(0, 1);
        old.current_streak = 6;
        let mut new = state_with(0, 1);
        new.current_streak = 7;

        let milestones = agg.progress_milestones(&old, &new);
        assert_eq!(milestones, vec![Milestone::Streak(7)]);

        // Staying at 7 does not re-fire.
        assert!(agg.progress_milestones(&new, &new.clone()).is_empty());
    }

    #[test]
    fn comparison_is_signed_toward_first_user() {
        let agg = aggregator();
        let ahead = state_with(1000, 4);
        let behind = state_with(400, 3);

        let cmp = agg.compare_progress(&ahead, &behind);
        assert_eq!(cmp.xp_difference, 600);
        assert_eq!(cmp.level_difference, 1);
        assert_eq!(cmp.ahead, Ahead::User1);

        let cmp = agg.compare_progress(&behind, &ahead);
        assert_eq!(cmp.xp_difference, -600);
        assert_eq!(cmp.ahead, Ahead::User2);

        let cmp = agg.compare_progress(&ahead, &ahead.clone());
        assert_eq!(cmp.ahead, Ahead::Equal);
    }

    #[test]
    fn velocity_from_empty_history_is_zero() {
        let velocity = aggregator().progress_velocity(&[]);
        assert_eq!(velocity.avg_xp_per_day, 0.0);
        assert!(velocity.estimated_days_to_next_level.is_none());
    }

    #[test]
    fn velocity_averages_over_calendar_days() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let history: Vec<XpHistoryEntry> = (0..5)
            .map(|day| XpHistoryEntry {
                date: start + Duration::days(day),
                xp_gained: 100,
            })
            .collect();

        let velocity = aggregator().progress_velocity(&history);
        assert_eq!(velocity.avg_xp_per_day, 100.0);
    }

    #[test]
    fn target_estimate_uses_ceiling() {
        let agg = aggregator();
        let velocity = agg.velocity_with_target(30.0, 900, 1000);
        assert_eq!(velocity.estimated_days_to_next_level, Some(4));

        let met = agg.velocity_with_target(30.0, 1200, 1000);
        assert_eq!(met.estimated_days_to_next_level, Some(0));
    }
}
