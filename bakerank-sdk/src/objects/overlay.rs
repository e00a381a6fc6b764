//! Messages pushed to overlay display clients.
//!
//! The `GET /ws` endpoint upgrades to a WebSocket connection and pushes one
//! [`OverlayMessage`] JSON text frame per accepted bake. Overlays never
//! send anything back; the server ignores any client frames other than
//! close and ping.

use serde::{Deserialize, Serialize};

/// Server-to-overlay WebSocket message.
///
/// Serialized as an internally-tagged JSON object, dispatched on `"event"`:
///
/// ```json
/// {"event":"bake","user":"alice","rank":"Floury Beginner","score":1,
///  "item":"croissant.png","is_legendary":false,
///  "trigger_explosion":false,"ranked_up":false}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OverlayMessage {
    Bake {
        /// User who baked.
        user: String,
        /// Rank title after the bake.
        rank: String,
        /// Score after the bake.
        score: u64,
        /// Reward asset identifier, e.g. `croissant.png`.
        item: String,
        is_legendary: bool,
        /// Play the big effect (rank-up or legendary).
        trigger_explosion: bool,
        ranked_up: bool,
    },
}

impl OverlayMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
