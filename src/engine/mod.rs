mod errors;
mod events;
mod repository;
mod service;

pub use errors::EngineError;
pub use events::{ActivityEvent, ActivityOutcome, FreezePurchase};
pub use repository::{InMemoryProgressRepository, ProgressRepository, VersionedState};
pub use service::{ProgressionService, ProgressionServiceBuilder};
