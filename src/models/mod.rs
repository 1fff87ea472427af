pub mod progress;
pub mod reading;
pub mod user;

pub use progress::{AttemptRecord, Badge, ScenarioProgress, UserProgress};
pub use reading::BpReading;
pub use user::User;
