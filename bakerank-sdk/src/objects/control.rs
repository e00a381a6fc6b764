//! Request and response bodies of the control API.

use serde::{Deserialize, Serialize};

use super::OverlayMessage;

/// `POST /api/bake` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BakeRequest {
    /// Chat user name. Trimmed and lowercased by the server.
    pub user: String,
}

/// `POST /api/bake` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BakeResponse {
    /// The bake counted and was broadcast to overlays.
    Accepted {
        event: OverlayMessage,
        /// Human readable reward name, e.g. `Golden Loaf`.
        item_display_name: String,
    },
    /// The user is still on cooldown.
    CooldownRejected { remaining_seconds: u64 },
}

/// `GET /api/leaderboard` query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user: String,
    pub score: u64,
    pub title: String,
    /// Score at which the next title unlocks; `None` at the top rank.
    pub next_threshold: Option<u64>,
}

/// `POST /api/test/*` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTriggerResponse {
    pub event: OverlayMessage,
    pub item_display_name: String,
    /// Number of overlays the event reached.
    pub delivered: usize,
}
