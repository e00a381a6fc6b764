//! Control API handlers.
//!
//! Called by producers: a chat bridge forwarding `!bake` / `!TopBakers`, and
//! the control panel.
//!
//! # Endpoints
//!
//! - `POST /bake`            – count a bake for a user
//! - `GET  /leaderboard`     – top bakers (`?limit=N`, default 5)
//! - `POST /test/explosion`  – broadcast a non-scoring effect bake
//! - `POST /test/legendary`  – broadcast a non-scoring legendary bake

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bakerank_core::engine::{BakeEvent, EngineError};
use bakerank_core::events::DispatchError;
use bakerank_core::ledger::LedgerError;
use bakerank_sdk::objects::OverlayMessage;

use crate::state::AppState;

mod bake;
mod leaderboard;
mod test_triggers;
pub mod ws;

/// Build the control API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bake", post(bake::bake))
        .route("/leaderboard", get(leaderboard::leaderboard))
        .route("/test/explosion", post(test_triggers::test_explosion))
        .route("/test/legendary", post(test_triggers::test_legendary))
}

fn to_message(event: &BakeEvent) -> OverlayMessage {
    OverlayMessage::from(event)
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in control API handlers.
#[derive(Debug)]
enum ApiError {
    /// The dispatcher or engine failed.
    Dispatch(DispatchError),
}

impl From<DispatchError> for ApiError {
    fn from(value: DispatchError) -> Self {
        ApiError::Dispatch(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let ApiError::Dispatch(e) = self;
        match e {
            DispatchError::Closed => {
                tracing::error!("Control API: bake dispatcher is not running");
                (StatusCode::SERVICE_UNAVAILABLE, "bake dispatcher unavailable").into_response()
            }
            DispatchError::Engine(EngineError::Ledger(LedgerError::InvalidUserId(_))) => {
                (StatusCode::BAD_REQUEST, "invalid user name").into_response()
            }
            DispatchError::Engine(EngineError::NoLegendaryRewards) => (
                StatusCode::NOT_FOUND,
                "no legendary rewards found, add Legendary-*.png files to the overlay folder",
            )
                .into_response(),
            DispatchError::Engine(e) => {
                tracing::error!(error = %e, "Control API engine error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
