use axum::{
    Json,
    extract::{Query, State},
};
use bakerank_core::engine::GetLeaderboard;
use bakerank_sdk::objects::{LeaderboardEntry, LeaderboardQuery};
use kanau::processor::Processor;

use crate::state::AppState;

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 100;

/// `GET /leaderboard`: top bakers by score.
pub(super) async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<Vec<LeaderboardEntry>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let rows = state
        .engine
        .process(GetLeaderboard { limit })
        .await
        .unwrap_or_default();

    Json(
        rows.into_iter()
            .map(|row| LeaderboardEntry {
                user: row.user_id,
                score: row.score,
                title: row.title,
                next_threshold: row.next_threshold,
            })
            .collect(),
    )
}
