use axum::{Json, extract::State};
use bakerank_core::engine::TestTrigger;
use bakerank_core::events::TestDelivery;
use bakerank_sdk::objects::TestTriggerResponse;

use super::{ApiError, to_message};
use crate::state::AppState;

/// `POST /test/explosion`: effect bake with a random reward. Not scored.
pub(super) async fn test_explosion(
    State(state): State<AppState>,
) -> Result<Json<TestTriggerResponse>, ApiError> {
    let delivery = state.bakes.test(TestTrigger::Explosion).await?;
    Ok(Json(to_response(delivery)))
}

/// `POST /test/legendary`: legendary bake with a random legendary reward.
/// Not scored.
pub(super) async fn test_legendary(
    State(state): State<AppState>,
) -> Result<Json<TestTriggerResponse>, ApiError> {
    let delivery = state.bakes.test(TestTrigger::Legendary).await?;
    Ok(Json(to_response(delivery)))
}

fn to_response(delivery: TestDelivery) -> TestTriggerResponse {
    TestTriggerResponse {
        event: to_message(&delivery.event),
        item_display_name: delivery.event.reward_display_name(),
        delivered: delivery.report.delivered,
    }
}
