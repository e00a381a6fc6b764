//! Application state shared across all request handlers.

use bakerank_core::engine::BakeEngine;
use bakerank_core::events::BakeHandle;
use bakerank_core::hub::BroadcastHub;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Read access to the engine (leaderboard).
    pub engine: Arc<BakeEngine>,
    /// Overlay subscriber set.
    pub hub: Arc<BroadcastHub>,
    /// Command queue into the bake dispatcher; all mutations go through here.
    pub bakes: BakeHandle,
}

impl AppState {
    pub fn new(engine: Arc<BakeEngine>, hub: Arc<BroadcastHub>, bakes: BakeHandle) -> Self {
        Self { engine, hub, bakes }
    }
}
