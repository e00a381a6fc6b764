pub mod control;
pub mod overlay;

pub use control::{BakeRequest, BakeResponse, LeaderboardEntry, LeaderboardQuery, TestTriggerResponse};
pub use overlay::OverlayMessage;
