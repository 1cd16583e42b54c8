use serde::{Deserialize, Serialize};

use crate::config::ProgressionConfig;

/// Maps accumulated XP to levels using a progressive-scaling curve:
/// each level costs quadratically more than the last.
#[derive(Debug, Clone, Copy)]
pub struct LevelCalculator {
    max_level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpProgress {
    pub current_xp: u64,
    pub next_level_xp: u64,
    pub xp_needed: u64,
    pub progress_percentage: f64,
    pub is_max_level: bool,
}

impl LevelCalculator {
    pub fn new(max_level: u32) -> Self {
        Self {
            max_level: max_level.max(1),
        }
    }

    pub fn from_config(config: &ProgressionConfig) -> Self {
        Self::new(config.max_level)
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Level for an XP total: `floor(sqrt(xp / 100)) + 1`, clamped to the
    /// configured cap. Negative or NaN input is treated as zero XP.
    pub fn level_from_xp(&self, xp: f64) -> u32 {
        let xp = if xp.is_nan() || xp < 0.0 { 0.0 } else { xp };
        let level = (xp / 100.0).sqrt().floor() as u32 + 1;
        level.min(self.max_level)
    }

    /// Total XP required to reach a level. Returns 0 as a "no further
    /// requirement" sentinel at or above the cap.
    pub fn xp_required_for_level(&self, level: u32) -> u64 {
        if level >= self.max_level {
            return 0;
        }
        Self::threshold(level)
    }

    /// Raw curve threshold without the cap sentinel.
    fn threshold(level: u32) -> u64 {
        let base = level.max(1) as u64 - 1;
        base * base * 100
    }

    /// Position within the current level: how much XP remains until the next
    /// threshold and how far along the level the user is.
    pub fn xp_progress(&self, current_level: u32, current_xp: u64) -> XpProgress {
        if current_level >= self.max_level {
            return XpProgress {
                current_xp,
                next_level_xp: 0,
                xp_needed: 0,
                progress_percentage: 100.0,
                is_max_level: true,
            };
        }

        let level_start = Self::threshold(current_level);
        let next_level_xp = Self::threshold(current_level + 1);
        let xp_needed = next_level_xp.saturating_sub(current_xp);

        let span = (next_level_xp - level_start) as f64;
        let into_level = current_xp.saturating_sub(level_start) as f64;
        let progress_percentage = ((into_level / span) * 100.0).clamp(0.0, 100.0);

        XpProgress {
            current_xp,
            next_level_xp,
            xp_needed,
            progress_percentage,
            is_max_level: false,
        }
    }
}
