use axum::{Json, extract::State};
use bakerank_core::engine::BakeOutcome;
use bakerank_sdk::objects::{BakeRequest, BakeResponse};
use time::OffsetDateTime;

use super::{ApiError, to_message};
use crate::state::AppState;

/// `POST /bake`: count a bake for `user`.
///
/// The name is trimmed and lowercased so `Alice` and `alice` share a score.
/// Accepted bakes are broadcast to overlays in the background.
pub(super) async fn bake(
    State(state): State<AppState>,
    Json(request): Json<BakeRequest>,
) -> Result<Json<BakeResponse>, ApiError> {
    let user_id = request.user.trim().to_lowercase();
    let outcome = state.bakes.bake(user_id, OffsetDateTime::now_utc()).await?;

    let response = match outcome {
        BakeOutcome::Accepted { event } => BakeResponse::Accepted {
            event: to_message(&event),
            item_display_name: event.reward_display_name(),
        },
        BakeOutcome::CooldownRejected { remaining_seconds } => {
            BakeResponse::CooldownRejected { remaining_seconds }
        }
    };
    Ok(Json(response))
}
