use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use levelup::achievement::{AchievementDefinition, AchievementTier, CriteriaType};
use levelup::engine::{ActivityEvent, InMemoryProgressRepository, ProgressionService};
use levelup::mission::{MissionDefinition, MissionType};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "levelup=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting levelup demo simulation");

    let repository = Arc::new(InMemoryProgressRepository::new());
    let service = ProgressionService::builder(repository)
        .with_mission(MissionDefinition {
            id: "weekly-quizzes".to_string(),
            mission_type: MissionType::Weekly,
            target_count: 4,
            xp_reward: 200,
            points_reward: 100,
            multiplier: 1.0,
        })
        .with_achievement(AchievementDefinition {
            id: "first-steps".to_string(),
            tier: AchievementTier::Bronze,
            criteria: CriteriaType::TotalXp,
            criteria_value: 100,
            xp_reward: 0,
        })
        .build()?;

    let user_id = uuid::Uuid::new_v4().to_string();
    service.register_user(&user_id).await?;

    // A week of activity: daily check-ins, a few quizzes, mission progress,
    // and one missed day covered by a purchased freeze.
    let mut now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    for day in 0..7u32 {
        let outcome = service
            .apply_activity(&user_id, &ActivityEvent::DailyCheckIn, now)
            .await?;
        info!(
            day,
            streak = outcome.state.current_streak,
            xp = outcome.state.total_xp,
            "daily check-in"
        );

        if day % 2 == 0 {
            let outcome = service
                .apply_activity(
                    &user_id,
                    &ActivityEvent::QuizCompleted { base_xp: 50 },
                    now + Duration::hours(2),
                )
                .await?;
            info!(day, xp_awarded = outcome.xp_awarded, "quiz completed");

            let outcome = service
                .apply_activity(
                    &user_id,
                    &ActivityEvent::MissionProgress {
                        mission_id: "weekly-quizzes".to_string(),
                        increment: 1,
                    },
                    now + Duration::hours(2),
                )
                .await?;
            if let Some(mission) = &outcome.completed_mission {
                info!(day, mission, xp_awarded = outcome.xp_awarded, "mission completed");
            }
        }

        now += Duration::hours(25);
    }

    let final_state = service.get_state(&user_id).await?;
    let overall = service.aggregator().overall_progress(&final_state);
    info!(
        level = final_state.level,
        total_xp = final_state.total_xp,
        streak = final_state.current_streak,
        achievements = final_state.achievements_unlocked.len(),
        overall_score = overall.overall_score,
        "simulation finished"
    );

    Ok(())
}
