use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::achievement::{AchievementDefinition, AchievementEvaluator, BadgeDefinition};
use crate::config::ProgressionConfig;
use crate::level::LevelCalculator;
use crate::mission::{
    MissionDefinition, MissionEngine, MissionError, MissionProgress, MissionStatus,
};
use crate::progress::{Milestone, ProgressAggregator, UserProgressState};
use crate::streak::{StreakEngine, StreakEvent, StreakRecord};

use super::errors::EngineError;
use super::events::{ActivityEvent, ActivityOutcome, FreezePurchase};
use super::repository::ProgressRepository;

/// Applies one activity event at a time to a user's progression state:
/// load, run the rule engines, persist under an optimistic version check,
/// and retry with fresh state when a concurrent writer got there first.
pub struct ProgressionService {
    config: ProgressionConfig,
    calculator: LevelCalculator,
    streak_engine: StreakEngine,
    mission_engine: MissionEngine,
    aggregator: ProgressAggregator,
    evaluator: AchievementEvaluator,
    repository: Arc<dyn ProgressRepository>,
    missions: HashMap<String, MissionDefinition>,
    achievements: Vec<AchievementDefinition>,
    badges: Vec<BadgeDefinition>,
    max_retries: u32,
}

impl ProgressionService {
    pub fn builder(repository: Arc<dyn ProgressRepository>) -> ProgressionServiceBuilder {
        ProgressionServiceBuilder::new(repository)
    }

    pub async fn register_user(&self, user_id: &str) -> Result<UserProgressState, EngineError> {
        let state = UserProgressState::new(user_id);
        self.repository.create_state(state.clone()).await?;
        info!(user_id, "registered user with zeroed progression state");
        Ok(state)
    }

    pub async fn get_state(&self, user_id: &str) -> Result<UserProgressState, EngineError> {
        self.repository
            .get_state(user_id)
            .await?
            .map(|versioned| versioned.state)
            .ok_or_else(|| EngineError::NotFound(user_id.to_string()))
    }

    /// Applies exactly one activity's worth of computation. `now` is passed
    /// explicitly so replays are deterministic.
    pub async fn apply_activity(
        &self,
        user_id: &str,
        event: &ActivityEvent,
        now: DateTime<Utc>,
    ) -> Result<ActivityOutcome, EngineError> {
        let mut attempt = 0;
        loop {
            let versioned = self
                .repository
                .get_state(user_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(user_id.to_string()))?;

            let (outcome, mission_progress) =
                self.apply_once(versioned.state, event, now).await?;

            match self
                .repository
                .update_state(outcome.state.clone(), versioned.version)
                .await
            {
                Ok(version) => {
                    if let Some(progress) = mission_progress {
                        self.repository.upsert_mission_progress(progress).await?;
                    }
                    debug!(
                        user_id,
                        version,
                        xp_awarded = outcome.xp_awarded,
                        milestones = outcome.milestones.len(),
                        "persisted activity outcome"
                    );
                    return Ok(outcome);
                }
                Err(EngineError::Conflict(_)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(user_id, attempt, "version conflict, retrying with fresh state");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Pure computation over a loaded state. Only the mission-progress
    /// lookup touches the repository.
    async fn apply_once(
        &self,
        state: UserProgressState,
        event: &ActivityEvent,
        now: DateTime<Utc>,
    ) -> Result<(ActivityOutcome, Option<MissionProgress>), EngineError> {
        let old = state.clone();
        let mut new_state = state;
        let mut notifications = Vec::new();

        // Streak transition first; every qualifying activity counts.
        let record = StreakRecord {
            current_streak: old.current_streak,
            longest_streak: old.longest_streak,
            freezes_available: old.freezes_available,
            last_login_at: old.last_activity_at,
        };
        let streak = self.streak_engine.update_streak(&record, now);
        new_state.current_streak = streak.current_streak;
        new_state.freezes_available = streak.new_freeze_count;
        new_state.longest_streak = self
            .streak_engine
            .update_longest_streak(streak.current_streak, old.longest_streak)
            .longest_streak;

        if streak.freeze_consumed {
            notifications.push(self.streak_engine.streak_notification(
                &StreakEvent::FreezeUsed {
                    preserved_streak: streak.current_streak,
                    freezes_left: streak.new_freeze_count,
                },
            ));
        }
        if streak.streak_broken {
            notifications.push(
                self.streak_engine
                    .streak_notification(&StreakEvent::StreakLost {
                        lost_streak: old.current_streak,
                    }),
            );
        }

        let mut xp_awarded = 0u64;
        let mut points_awarded = 0u64;
        let mut completed_mission = None;
        let mut mission_progress_out = None;

        match event {
            ActivityEvent::DailyCheckIn => {
                let rewards = self
                    .streak_engine
                    .streak_rewards(self.config.daily_checkin_xp, new_state.current_streak);
                xp_awarded = rewards.total_xp;
            }
            ActivityEvent::QuizCompleted { base_xp }
            | ActivityEvent::LessonProgress { base_xp } => {
                let rewards = self
                    .streak_engine
                    .streak_rewards(*base_xp, new_state.current_streak);
                xp_awarded = rewards.total_xp;
            }
            ActivityEvent::MissionProgress {
                mission_id,
                increment,
            } => {
                let definition = self.missions.get(mission_id).ok_or_else(|| {
                    EngineError::Validation(format!("unknown mission {mission_id}"))
                })?;

                let mut progress = self
                    .repository
                    .get_mission_progress(&new_state.user_id, mission_id)
                    .await?
                    .unwrap_or_else(|| MissionProgress::new(mission_id, &new_state.user_id));

                if progress.is_completed() {
                    return Err(MissionError::AlreadyCompleted(mission_id.clone()).into());
                }

                progress.current_progress =
                    progress.current_progress.saturating_add(*increment);

                if self
                    .mission_engine
                    .is_complete(definition, progress.current_progress)
                {
                    progress = self
                        .mission_engine
                        .complete_mission(definition, &progress, now)?;
                    let rewards = self
                        .mission_engine
                        .mission_rewards(definition, Some(new_state.current_streak));
                    xp_awarded = rewards.xp;
                    points_awarded = rewards.points;
                    new_state.missions_completed += 1;
                    completed_mission = Some(definition.id.clone());
                    info!(
                        user_id = %new_state.user_id,
                        mission_id = %definition.id,
                        xp = rewards.xp,
                        bonus_applied = rewards.bonus_applied,
                        "mission completed"
                    );
                }
                mission_progress_out = Some(progress);
            }
        }

        new_state.total_xp += xp_awarded;
        new_state.points += points_awarded;
        new_state.level = self.calculator.level_from_xp(new_state.total_xp as f64);

        // Achievements run last, over the updated aggregate counters.
        let mut unlocked_achievements = Vec::new();
        let eligible: Vec<AchievementDefinition> = self
            .evaluator
            .eligible_achievements(&self.achievements, &new_state)
            .into_iter()
            .cloned()
            .collect();
        for definition in eligible {
            let result = self.evaluator.unlock_achievement(&mut new_state, &definition);
            if result.newly_unlocked {
                new_state.total_xp += result.xp_awarded;
                xp_awarded += result.xp_awarded;
                unlocked_achievements.push(definition.id);
            }
        }

        let mut earned_badges = Vec::new();
        let eligible: Vec<BadgeDefinition> = self
            .evaluator
            .eligible_badges(&self.badges, &new_state)
            .into_iter()
            .cloned()
            .collect();
        for definition in eligible {
            let result = self.evaluator.earn_badge(&mut new_state, &definition);
            if result.newly_unlocked {
                new_state.total_xp += result.xp_awarded;
                xp_awarded += result.xp_awarded;
                earned_badges.push(definition.id);
            }
        }

        // Restore the cached-level invariant after the award pass.
        new_state.level = self.calculator.level_from_xp(new_state.total_xp as f64);
        new_state.last_activity_at = Some(now);

        let milestones = self.aggregator.progress_milestones(&old, &new_state);
        for milestone in &milestones {
            if let Milestone::Streak(days) = milestone {
                if let Some(bonus) = self.config.milestone_bonus(*days) {
                    new_state.points += bonus;
                    points_awarded += bonus;
                }
                notifications.push(self.streak_engine.streak_notification(
                    &StreakEvent::MilestoneReached { streak: *days },
                ));
            }
        }

        let outcome = ActivityOutcome {
            leveled_up: new_state.level > old.level,
            xp_awarded,
            points_awarded,
            streak,
            milestones,
            notifications,
            completed_mission,
            unlocked_achievements,
            earned_badges,
            state: new_state,
        };
        Ok((outcome, mission_progress_out))
    }

    /// Spends points on a streak freeze at the current inventory-scaled
    /// price.
    pub async fn purchase_freeze(&self, user_id: &str) -> Result<FreezePurchase, EngineError> {
        let mut attempt = 0;
        loop {
            let versioned = self
                .repository
                .get_state(user_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(user_id.to_string()))?;

            let mut state = versioned.state;
            let cost = self.streak_engine.freeze_cost(state.freezes_available);
            if !self.streak_engine.can_purchase_freeze(state.points, cost) {
                return Err(EngineError::Validation(format!(
                    "insufficient points for freeze: have {}, need {cost}",
                    state.points
                )));
            }

            state.points -= cost;
            state.freezes_available += 1;

            match self.repository.update_state(state.clone(), versioned.version).await {
                Ok(_) => {
                    info!(user_id, cost, freezes = state.freezes_available, "freeze purchased");
                    return Ok(FreezePurchase {
                        cost,
                        freezes_available: state.freezes_available,
                        points_remaining: state.points,
                    });
                }
                Err(EngineError::Conflict(_)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(user_id, attempt, "version conflict on freeze purchase, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// The user's mission list with per-mission status, ordered by priority.
    pub async fn prioritized_missions(
        &self,
        user_id: &str,
    ) -> Result<Vec<(MissionDefinition, MissionStatus)>, EngineError> {
        let mut entries = Vec::with_capacity(self.missions.len());
        for definition in self.missions.values() {
            let progress = self
                .repository
                .get_mission_progress(user_id, &definition.id)
                .await?
                .map(|p| p.current_progress)
                .unwrap_or(0);
            entries.push((definition.clone(), progress));
        }

        entries.sort_by(|a, b| {
            self.mission_engine
                .priority_order((&a.0, a.1), (&b.0, b.1))
        });

        Ok(entries
            .into_iter()
            .map(|(definition, progress)| {
                let status = self.mission_engine.mission_progress(&definition, progress);
                (definition, status)
            })
            .collect())
    }

    pub fn aggregator(&self) -> &ProgressAggregator {
        &self.aggregator
    }

    pub fn streak_engine(&self) -> &StreakEngine {
        &self.streak_engine
    }

    pub fn mission_engine(&self) -> &MissionEngine {
        &self.mission_engine
    }
}

pub struct ProgressionServiceBuilder {
    config: ProgressionConfig,
    repository: Arc<dyn ProgressRepository>,
    missions: Vec<MissionDefinition>,
    achievements: Vec<AchievementDefinition>,
    badges: Vec<BadgeDefinition>,
    max_retries: u32,
}

impl ProgressionServiceBuilder {
    fn new(repository: Arc<dyn ProgressRepository>) -> Self {
        Self {
            config: ProgressionConfig::default(),
            repository,
            missions: Vec::new(),
            achievements: Vec::new(),
            badges: Vec::new(),
            max_retries: 3,
        }
    }

    pub fn with_config(mut self, config: ProgressionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mission(mut self, mission: MissionDefinition) -> Self {
        self.missions.push(mission);
        self
    }

    pub fn with_achievement(mut self, achievement: AchievementDefinition) -> Self {
        self.achievements.push(achievement);
        self
    }

    pub fn with_badge(mut self, badge: BadgeDefinition) -> Self {
        self.badges.push(badge);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Validates the mission catalog at the boundary so the engines can
    /// assume well-formed definitions.
    pub fn build(self) -> Result<ProgressionService, EngineError> {
        let mission_engine = MissionEngine::new(self.config.clone());
        let mut missions = HashMap::with_capacity(self.missions.len());
        for mission in self.missions {
            mission_engine.validate_definition(&mission)?;
            missions.insert(mission.id.clone(), mission);
        }

        Ok(ProgressionService {
            calculator: LevelCalculator::from_config(&self.config),
            streak_engine: StreakEngine::new(self.config.clone()),
            aggregator: ProgressAggregator::new(self.config.clone()),
            evaluator: AchievementEvaluator::new(),
            mission_engine,
            config: self.config,
            repository: self.repository,
            missions,
            achievements: self.achievements,
            badges: self.badges,
            max_retries: self.max_retries,
        })
    }
}
