//! Command channel factory and the producer-side handle.

use super::types::{BakeCommand, TestDelivery};
use crate::engine::{BakeOutcome, EngineError, TestTrigger};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot};

/// Default buffer size for the command channel.
///
/// Enough to absorb a chat burst while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for BakeCommand events.
pub type BakeCommandSender = mpsc::Sender<BakeCommand>;
/// Receiver handle for BakeCommand events.
pub type BakeCommandReceiver = mpsc::Receiver<BakeCommand>;

/// Create a new BakeCommand channel.
///
/// The receiver belongs to the single `BakeDispatcher`; wrap the sender in a
/// [`BakeHandle`] and clone it for every producer.
pub fn bake_command_channel() -> (BakeCommandSender, BakeCommandReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("bake dispatcher is not running")]
    Closed,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Producer-side handle to the bake dispatcher.
#[derive(Debug, Clone)]
pub struct BakeHandle {
    tx: BakeCommandSender,
}

impl BakeHandle {
    pub fn new(tx: BakeCommandSender) -> Self {
        Self { tx }
    }

    /// Submit a bake and wait for the engine's verdict.
    pub async fn bake(
        &self,
        user_id: impl Into<String>,
        now: OffsetDateTime,
    ) -> Result<BakeOutcome, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BakeCommand::Bake {
                user_id: user_id.into(),
                now,
                reply,
            })
            .await
            .map_err(|_| DispatchError::Closed)?;
        Ok(rx.await.map_err(|_| DispatchError::Closed)??)
    }

    /// Broadcast a non-scoring test event.
    pub async fn test(&self, trigger: TestTrigger) -> Result<TestDelivery, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BakeCommand::Test { trigger, reply })
            .await
            .map_err(|_| DispatchError::Closed)?;
        Ok(rx.await.map_err(|_| DispatchError::Closed)??)
    }
}
