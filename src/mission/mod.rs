mod engine;
mod errors;
pub mod models;

pub use engine::MissionEngine;
pub use errors::MissionError;
pub use models::{MissionDefinition, MissionProgress, MissionRewards, MissionStatus, MissionType};
