//! The bake engine.
//!
//! A bake runs: cooldown check, score increment, rank-up detection, reward
//! draw. The cooldown check and the increment share one critical section on
//! the ledger, so two concurrent bakes by the same user can never both land
//! inside one cooldown window.
//!
//! The engine only builds [`BakeEvent`]s. Delivering them to overlays is the
//! caller's job (see [`crate::processors::BakeDispatcher`]).

use crate::ledger::{Ledger, LedgerError};
use crate::ranks::RankTable;
use crate::rewards::{CatalogError, RewardCatalog, format_display_name};
use bakerank_sdk::objects::OverlayMessage;
use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Minimum time between two counted bakes of the same user.
pub const COOLDOWN: Duration = Duration::seconds(60);

/// User name carried by overlay test events.
pub const TEST_USER: &str = "TEST";

/// Rank title carried by overlay test events.
pub const TEST_RANK: &str = "Test Mode";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ledger failure: {0}")]
    Ledger(#[from] LedgerError),

    #[error("reward catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("no legendary rewards available")]
    NoLegendaryRewards,

    #[error("ledger write task failed: {0}")]
    LedgerTask(#[from] tokio::task::JoinError),
}

/// One counted bake, broadcast verbatim to every overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakeEvent {
    pub user_id: String,
    pub new_score: u64,
    pub rank_title: String,
    pub reward_id: String,
    pub is_legendary: bool,
    pub ranked_up: bool,
    /// `ranked_up || is_legendary`, except for forced test effects.
    pub trigger_effect: bool,
}

impl BakeEvent {
    pub fn reward_display_name(&self) -> String {
        format_display_name(&self.reward_id)
    }
}

impl From<&BakeEvent> for OverlayMessage {
    fn from(event: &BakeEvent) -> Self {
        OverlayMessage::Bake {
            user: event.user_id.clone(),
            rank: event.rank_title.clone(),
            score: event.new_score,
            item: event.reward_id.clone(),
            is_legendary: event.is_legendary,
            trigger_explosion: event.trigger_effect,
            ranked_up: event.ranked_up,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BakeOutcome {
    /// Still cooling down; nothing changed.
    CooldownRejected { remaining_seconds: u64 },
    Accepted { event: BakeEvent },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub score: u64,
    pub title: String,
    pub next_threshold: Option<u64>,
}

/// Overlay test effects that never touch the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestTrigger {
    /// Any reward, effect forced on.
    Explosion,
    /// A random legendary reward.
    Legendary,
}

pub struct BakeEngine {
    ledger: Arc<Mutex<Ledger>>,
    ranks: RankTable,
    catalog: RewardCatalog,
    cooldown: Duration,
}

impl BakeEngine {
    pub fn new(ledger: Ledger, ranks: RankTable, catalog: RewardCatalog) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            ranks,
            catalog,
            cooldown: COOLDOWN,
        }
    }

    /// Override the cooldown window.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    /// Handle one bake by `user_id` at `now`.
    pub async fn process_action(
        &self,
        user_id: &str,
        now: OffsetDateTime,
    ) -> Result<BakeOutcome, EngineError> {
        let mut ledger = self.ledger.clone().lock_owned().await;
        let record = ledger.get(user_id);

        let elapsed = now - record.last_action_at;
        if elapsed < self.cooldown {
            let remaining_seconds = remaining_whole_seconds(self.cooldown - elapsed, self.cooldown);
            debug!(user = user_id, remaining_seconds, "Bake rejected, oven cooling");
            return Ok(BakeOutcome::CooldownRejected { remaining_seconds });
        }

        // Draw before mutating so a catalog failure leaves the ledger untouched.
        let (reward, is_legendary) = self.catalog.draw()?;

        let old_title = self.ranks.title_for(record.score);
        // The write-through save is file i/o; the guard moves along so the
        // lock is held until the record is stored.
        let owned_id = user_id.to_string();
        let updated =
            tokio::task::spawn_blocking(move || ledger.record_action(&owned_id, now)).await??;

        let new_title = self.ranks.title_for(updated.score);
        let ranked_up = old_title != new_title;

        let event = BakeEvent {
            user_id: updated.user_id,
            new_score: updated.score,
            rank_title: new_title.to_string(),
            reward_id: reward.id,
            is_legendary,
            ranked_up,
            trigger_effect: ranked_up || is_legendary,
        };

        if is_legendary {
            info!(user = %event.user_id, item = %event.reward_id, score = event.new_score, "Legendary bake");
        } else {
            info!(user = %event.user_id, item = %event.reward_id, score = event.new_score, "Bake");
        }
        if ranked_up {
            info!(user = %event.user_id, rank = %event.rank_title, "Ranked up");
        }

        Ok(BakeOutcome::Accepted { event })
    }

    /// Top `n` users with their titles.
    pub async fn leaderboard(&self, n: usize) -> Vec<LeaderboardRow> {
        let top = self.ledger.lock().await.top_n(n);
        top.into_iter()
            .map(|record| LeaderboardRow {
                title: self.ranks.title_for(record.score).to_string(),
                next_threshold: self.ranks.next_threshold(record.score),
                user_id: record.user_id,
                score: record.score,
            })
            .collect()
    }

    /// Build a non-scoring event for checking overlays.
    pub fn test_event(&self, trigger: TestTrigger) -> Result<BakeEvent, EngineError> {
        let (reward, is_legendary) = match trigger {
            TestTrigger::Explosion => self.catalog.draw()?,
            TestTrigger::Legendary => {
                let reward = self
                    .catalog
                    .pick_legendary_with(&mut rand::rng())
                    .ok_or(EngineError::NoLegendaryRewards)?;
                (reward, true)
            }
        };
        Ok(BakeEvent {
            user_id: TEST_USER.to_string(),
            new_score: 0,
            rank_title: TEST_RANK.to_string(),
            reward_id: reward.id,
            is_legendary,
            ranked_up: false,
            trigger_effect: true,
        })
    }
}

/// Seconds left on a cooldown, rounded up and capped at the full window.
fn remaining_whole_seconds(remaining: Duration, cooldown: Duration) -> u64 {
    let remaining = remaining.min(cooldown);
    let mut seconds = remaining.whole_seconds();
    if remaining.subsec_nanoseconds() > 0 {
        seconds += 1;
    }
    u64::try_from(seconds).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Processor trait implementations
// ---------------------------------------------------------------------------

/// Process one bake for `user_id` at `now`.
#[derive(Debug, Clone)]
pub struct ProcessAction {
    pub user_id: String,
    pub now: OffsetDateTime,
}

impl Processor<ProcessAction> for BakeEngine {
    type Output = BakeOutcome;
    type Error = EngineError;
    #[tracing::instrument(skip_all, err, name = "Engine:ProcessAction")]
    async fn process(&self, action: ProcessAction) -> Result<BakeOutcome, EngineError> {
        self.process_action(&action.user_id, action.now).await
    }
}

/// Read the top `limit` users.
#[derive(Debug, Clone)]
pub struct GetLeaderboard {
    pub limit: usize,
}

impl Processor<GetLeaderboard> for BakeEngine {
    type Output = Vec<LeaderboardRow>;
    type Error = Infallible;
    async fn process(&self, query: GetLeaderboard) -> Result<Vec<LeaderboardRow>, Infallible> {
        Ok(self.leaderboard(query.limit).await)
    }
}
