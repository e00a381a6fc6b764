//! Fan-out of bake events to connected overlays.
//!
//! Each subscriber owns a small bounded queue. Publishing serializes the event
//! once and pushes it into every queue concurrently, each push bounded by a
//! timeout. A subscriber whose queue is closed or stays full past the timeout
//! is dropped from the hub; the others are unaffected. Delivery is at most
//! once: no retries, and late subscribers never see earlier events.

use crate::engine::BakeEvent;
use bakerank_sdk::objects::OverlayMessage;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

/// Default bound on a single subscriber push.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Default per-subscriber queue length.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 32;

pub type SubscriberId = Uuid;

/// Serialized frame shared by every subscriber queue.
pub type Frame = Arc<str>;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize overlay message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Receiving end handed to a connected overlay.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Frame>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next frame, or `None` once the hub dropped this subscriber.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }
}

pub struct BroadcastHub {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Frame>>>,
    send_timeout: Duration,
    buffer: usize,
}

impl BroadcastHub {
    pub fn new(send_timeout: Duration, buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            send_timeout,
            buffer: buffer.max(1),
        }
    }

    pub async fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        let count = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, tx);
            subscribers.len()
        };
        debug!(subscriber = %id, subscribers = count, "Overlay subscribed");
        Subscription { id, receiver }
    }

    /// Remove a subscriber. Returns whether it was still registered.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().await.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, "Overlay unsubscribed");
        }
        removed
    }

    /// Bound applied to every push; overlay writers use it for socket writes too.
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Send `event` to every current subscriber.
    pub async fn publish(&self, event: &BakeEvent) -> Result<PublishReport, PublishError> {
        let frame: Frame = OverlayMessage::from(event).to_json()?.into();
        Ok(self.publish_frame(frame).await)
    }

    /// Send an already serialized frame to every current subscriber.
    pub async fn publish_frame(&self, frame: Frame) -> PublishReport {
        let targets: Vec<(SubscriberId, mpsc::Sender<Frame>)> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        if targets.is_empty() {
            return PublishReport::default();
        }

        let send_timeout = self.send_timeout;
        let sends = targets.into_iter().map(|(id, tx)| {
            let frame = frame.clone();
            async move {
                let delivered = matches!(
                    tokio::time::timeout(send_timeout, tx.send(frame)).await,
                    Ok(Ok(()))
                );
                (id, delivered)
            }
        });
        let results = join_all(sends).await;

        let failed: Vec<SubscriberId> = results
            .iter()
            .filter(|(_, delivered)| !delivered)
            .map(|(id, _)| *id)
            .collect();

        if !failed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &failed {
                subscribers.remove(id);
                debug!(subscriber = %id, "Dropping overlay after failed send");
            }
        }

        PublishReport {
            delivered: results.len() - failed.len(),
            dropped: failed.len(),
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT, DEFAULT_SUBSCRIBER_BUFFER)
    }
}
