use serde::Deserialize;

/// Tuning constants for the progression engine.
///
/// Deployments override these through configuration rather than code
/// changes, so nothing in the engines hardcodes a band or threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Level cap; `level_from_xp` never returns above this.
    pub max_level: u32,
    /// Gap at or below this keeps the streak unchanged (already counted).
    pub active_window_hours: i64,
    /// Gap at or below this (but above the active window) continues the
    /// streak with an increment. Beyond it the streak breaks.
    pub grace_window_hours: i64,
    /// Streak-length bands mapping to XP multipliers. Must be sorted by
    /// `min_days` ascending and start at 0.
    pub multiplier_bands: Vec<MultiplierBand>,
    /// Streak day counts that trigger a milestone, with their bonus points.
    pub streak_milestones: Vec<StreakMilestone>,
    /// XP round-number boundary step for milestone detection.
    pub xp_milestone_step: u64,
    /// Base XP granted for a daily check-in, before streak multipliers.
    pub daily_checkin_xp: u64,
    /// Cost of the first streak freeze.
    pub freeze_base_cost: u64,
    /// Multiplicative growth per freeze already owned. Must exceed 1 so the
    /// cost is strictly increasing.
    pub freeze_cost_growth: f64,
    pub priority_weights: PriorityWeights,
    pub overall_weights: OverallWeights,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MultiplierBand {
    pub min_days: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StreakMilestone {
    pub days: u32,
    pub bonus_points: u64,
}

/// Weights for ordering a user's active mission list.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PriorityWeights {
    /// Applied to the completion ratio (0..=1). Weighted heavily so nearly
    /// done missions sort first.
    pub completion: f64,
    /// Applied per 100 XP of reward.
    pub xp_reward: f64,
    /// Additive boost for special missions.
    pub special_boost: f64,
}

/// Weights for the overall progress composite score.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OverallWeights {
    pub level: f64,
    pub achievements: f64,
    pub missions: f64,
    pub streak: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            max_level: 100,
            active_window_hours: 24,
            grace_window_hours: 48,
            multiplier_bands: vec![
                MultiplierBand {
                    min_days: 0,
                    multiplier: 1.0,
                },
                MultiplierBand {
                    min_days: 7,
                    multiplier: 1.5,
                },
                MultiplierBand {
                    min_days: 14,
                    multiplier: 2.0,
                },
                MultiplierBand {
                    min_days: 30,
                    multiplier: 3.0,
                },
            ],
            streak_milestones: vec![
                StreakMilestone {
                    days: 3,
                    bonus_points: 10,
                },
                StreakMilestone {
                    days: 7,
                    bonus_points: 25,
                },
                StreakMilestone {
                    days: 14,
                    bonus_points: 60,
                },
                StreakMilestone {
                    days: 30,
                    bonus_points: 150,
                },
                StreakMilestone {
                    days: 100,
                    bonus_points: 500,
                },
            ],
            xp_milestone_step: 1000,
            daily_checkin_xp: 10,
            freeze_base_cost: 50,
            freeze_cost_growth: 1.5,
            priority_weights: PriorityWeights {
                completion: 100.0,
                xp_reward: 1.0,
                special_boost: 25.0,
            },
            overall_weights: OverallWeights {
                level: 10.0,
                achievements: 5.0,
                missions: 3.0,
                streak: 2.0,
            },
        }
    }
}

impl ProgressionConfig {
    /// XP multiplier for a streak length, from the configured bands.
    /// Total over all non-negative streak values.
    pub fn multiplier_for_streak(&self, streak_days: u32) -> f64 {
        self.multiplier_bands
            .iter()
            .rev()
            .find(|band| streak_days >= band.min_days)
            .map(|band| band.multiplier)
            .unwrap_or(1.0)
    }

    /// Bonus points attached to a streak milestone day count, if any.
    pub fn milestone_bonus(&self, streak_days: u32) -> Option<u64> {
        self.streak_milestones
            .iter()
            .find(|m| m.days == streak_days)
            .map(|m| m.bonus_points)
    }
}
