//! BakeDispatcher processor.
//!
//! The BakeDispatcher is responsible for:
//! - Receiving `BakeCommand`s from the command queue
//! - Running them against the `BakeEngine`
//! - Replying to the producer
//! - Publishing accepted and test events to the `BroadcastHub` without
//!   holding up the queue on slow overlays

use crate::engine::{BakeEngine, BakeEvent, BakeOutcome};
use crate::events::{BakeCommand, BakeCommandReceiver, TestDelivery};
use crate::hub::{BroadcastHub, PublishReport};
use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct BakeDispatcher {
    engine: Arc<BakeEngine>,
    hub: Arc<BroadcastHub>,
}

impl BakeDispatcher {
    pub fn new(engine: Arc<BakeEngine>, hub: Arc<BroadcastHub>) -> Self {
        Self { engine, hub }
    }

    /// Run until shutdown is signaled or every producer is gone.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut command_rx: BakeCommandReceiver,
    ) {
        info!("BakeDispatcher started");

        loop {
            tokio::select! {
                biased;

                // Check for shutdown; a dropped sender counts as one.
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("BakeDispatcher received shutdown signal");
                        break;
                    }
                }

                Some(command) = command_rx.recv() => {
                    let _ = self.process(command).await;
                }

                else => {
                    info!("BakeCommand channel closed");
                    break;
                }
            }
        }

        info!("BakeDispatcher shutdown complete");
    }
}

async fn publish(hub: &BroadcastHub, event: &BakeEvent) -> PublishReport {
    match hub.publish(event).await {
        Ok(report) => {
            debug!(
                user = %event.user_id,
                delivered = report.delivered,
                dropped = report.dropped,
                "Bake event published"
            );
            report
        }
        Err(e) => {
            error!(error = %e, user = %event.user_id, "Failed to publish bake event");
            PublishReport::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Processor trait implementation
// ---------------------------------------------------------------------------

impl Processor<BakeCommand> for BakeDispatcher {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, command: BakeCommand) -> Result<(), Infallible> {
        match command {
            BakeCommand::Bake {
                user_id,
                now,
                reply,
            } => {
                let result = self.engine.process_action(&user_id, now).await;
                match &result {
                    Ok(BakeOutcome::Accepted { event }) => {
                        let hub = self.hub.clone();
                        let event = event.clone();
                        tokio::spawn(async move {
                            publish(&hub, &event).await;
                        });
                    }
                    Ok(BakeOutcome::CooldownRejected { .. }) => {}
                    Err(e) => warn!(user = %user_id, error = %e, "Bake failed"),
                }
                if reply.send(result).is_err() {
                    debug!(user = %user_id, "Bake producer went away before the reply");
                }
            }
            BakeCommand::Test { trigger, reply } => match self.engine.test_event(trigger) {
                Ok(event) => {
                    // The reply reports delivery, so it waits for the publish.
                    let hub = self.hub.clone();
                    tokio::spawn(async move {
                        let report = publish(&hub, &event).await;
                        info!(?trigger, item = %event.reward_id, delivered = report.delivered, "Test event sent");
                        let _ = reply.send(Ok(TestDelivery { event, report }));
                    });
                }
                Err(e) => {
                    warn!(?trigger, error = %e, "Test event failed");
                    let _ = reply.send(Err(e));
                }
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TestTrigger;
    use crate::events::{BakeCommandSender, BakeHandle, DispatchError, bake_command_channel};
    use crate::ledger::{Ledger, MemoryStore};
    use crate::ranks::RankTable;
    use crate::rewards::{RewardCatalog, StaticAssets};
    use bakerank_sdk::objects::OverlayMessage;
    use std::time::Duration;
    use time::OffsetDateTime;
    use tokio::sync::oneshot;

    struct Harness {
        handle: BakeHandle,
        commands: BakeCommandSender,
        hub: Arc<BroadcastHub>,
        shutdown_tx: watch::Sender<bool>,
        task: tokio::task::JoinHandle<()>,
    }

    fn start(assets: &[&str]) -> Harness {
        start_with_hub(assets, BroadcastHub::default())
    }

    fn start_with_hub(assets: &[&str], hub: BroadcastHub) -> Harness {
        let engine = Arc::new(BakeEngine::new(
            Ledger::open(MemoryStore::default()),
            RankTable::default(),
            RewardCatalog::new(StaticAssets(assets.iter().map(|s| s.to_string()).collect())),
        ));
        let hub = Arc::new(hub);
        let (tx, rx) = bake_command_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(BakeDispatcher::new(engine, hub.clone()).run(shutdown_rx, rx));
        Harness {
            handle: BakeHandle::new(tx.clone()),
            commands: tx,
            hub,
            shutdown_tx,
            task,
        }
    }

    #[tokio::test]
    async fn test_accepted_bake_reaches_overlays() {
        let harness = start(&["donut.png"]);
        let mut overlay = harness.hub.subscribe().await;
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();

        let outcome = harness.handle.bake("alice", now).await.unwrap();
        assert!(matches!(outcome, BakeOutcome::Accepted { .. }));

        let frame = overlay.recv().await.unwrap();
        let msg: OverlayMessage = serde_json::from_str(&frame).unwrap();
        let OverlayMessage::Bake { user, score, item, .. } = msg;
        assert_eq!(user, "alice");
        assert_eq!(score, 1);
        assert_eq!(item, "donut.png");

        let outcome = harness.handle.bake("alice", now).await.unwrap();
        assert_eq!(
            outcome,
            BakeOutcome::CooldownRejected {
                remaining_seconds: 60
            }
        );
    }

    #[tokio::test]
    async fn test_test_trigger_reports_delivery() {
        let harness = start(&["donut.png", "Legendary-Crown.png"]);
        let _overlay = harness.hub.subscribe().await;

        let delivery = harness.handle.test(TestTrigger::Legendary).await.unwrap();
        assert_eq!(delivery.report.delivered, 1);
        assert!(delivery.event.is_legendary);
    }

    #[tokio::test]
    async fn test_stalled_overlay_does_not_hold_up_bakes() {
        let harness = start_with_hub(
            &["donut.png"],
            BroadcastHub::new(Duration::from_secs(3600), 1),
        );
        // Never read; one frame fills its queue.
        let _stalled = harness.hub.subscribe().await;
        harness.hub.publish_frame(Arc::from("{}")).await;

        let (reply, mut test_reply) = oneshot::channel();
        harness
            .commands
            .send(BakeCommand::Test {
                trigger: TestTrigger::Explosion,
                reply,
            })
            .await
            .unwrap();

        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), harness.handle.bake("alice", now))
            .await
            .expect("bake queued behind a test publish")
            .unwrap();
        assert!(matches!(outcome, BakeOutcome::Accepted { .. }));
        assert!(test_reply.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let harness = start(&["donut.png"]);
        harness.shutdown_tx.send(true).unwrap();
        harness.task.await.unwrap();

        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert!(matches!(
            harness.handle.bake("alice", now).await,
            Err(DispatchError::Closed)
        ));
    }
}
