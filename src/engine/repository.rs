use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::mission::MissionProgress;
use crate::progress::UserProgressState;

use super::errors::EngineError;

/// A state snapshot with the version it was read at. Writes must present the
/// version back, so concurrent activity events for the same user serialize
/// instead of silently erasing each other's freeze consumption or rewards.
#[derive(Debug, Clone)]
pub struct VersionedState {
    pub state: UserProgressState,
    pub version: u64,
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn get_state(&self, user_id: &str) -> Result<Option<VersionedState>, EngineError>;
    async fn create_state(&self, state: UserProgressState) -> Result<(), EngineError>;
    /// Stores the new state only if the record is still at
    /// `expected_version`; returns the new version, or `Conflict` when the
    /// record moved underneath the caller.
    async fn update_state(
        &self,
        state: UserProgressState,
        expected_version: u64,
    ) -> Result<u64, EngineError>;
    async fn get_mission_progress(
        &self,
        user_id: &str,
        mission_id: &str,
    ) -> Result<Option<MissionProgress>, EngineError>;
    async fn upsert_mission_progress(&self, progress: MissionProgress)
        -> Result<(), EngineError>;
}

#[derive(Debug, Default)]
pub struct InMemoryProgressRepository {
    states: Arc<RwLock<HashMap<String, (UserProgressState, u64)>>>,
    missions: Arc<RwLock<HashMap<(String, String), MissionProgress>>>,
}

impl InMemoryProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn get_state(&self, user_id: &str) -> Result<Option<VersionedState>, EngineError> {
        let states = self.states.read().await;
        Ok(states.get(user_id).map(|(state, version)| VersionedState {
            state: state.clone(),
            version: *version,
        }))
    }

    async fn create_state(&self, state: UserProgressState) -> Result<(), EngineError> {
        let mut states = self.states.write().await;
        if states.contains_key(&state.user_id) {
            return Err(EngineError::Validation(format!(
                "user {} already registered",
                state.user_id
            )));
        }
        states.insert(state.user_id.clone(), (state, 0));
        Ok(())
    }

    async fn update_state(
        &self,
        state: UserProgressState,
        expected_version: u64,
    ) -> Result<u64, EngineError> {
        let mut states = self.states.write().await;
        let entry = states
            .get_mut(&state.user_id)
            .ok_or_else(|| EngineError::NotFound(state.user_id.clone()))?;

        if entry.1 != expected_version {
            return Err(EngineError::Conflict(state.user_id.clone()));
        }

        let new_version = expected_version + 1;
        *entry = (state, new_version);
        Ok(new_version)
    }

    async fn get_mission_progress(
        &self,
        user_id: &str,
        mission_id: &str,
    ) -> Result<Option<MissionProgress>, EngineError> {
        let missions = self.missions.read().await;
        Ok(missions
            .get(&(user_id.to_string(), mission_id.to_string()))
            .cloned())
    }

    async fn upsert_mission_progress(
        &self,
        progress: MissionProgress,
    ) -> Result<(), EngineError> {
        let mut missions = self.missions.write().await;
        missions.insert(
            (progress.user_id.clone(), progress.mission_id.clone()),
            progress,
        );
        Ok(())
    }
}
