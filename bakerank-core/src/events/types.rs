use crate::engine::{BakeEvent, BakeOutcome, EngineError, TestTrigger};
use crate::hub::PublishReport;
use time::OffsetDateTime;
use tokio::sync::oneshot;

/// A broadcast test event and how many overlays it reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDelivery {
    pub event: BakeEvent,
    pub report: PublishReport,
}

/// Work submitted to the bake dispatcher.
#[derive(Debug)]
pub enum BakeCommand {
    /// A viewer bake. Accepted bakes are broadcast in the background; the
    /// reply does not wait for overlays.
    Bake {
        user_id: String,
        now: OffsetDateTime,
        reply: oneshot::Sender<Result<BakeOutcome, EngineError>>,
    },
    /// A non-scoring overlay test. The reply waits for the broadcast.
    Test {
        trigger: TestTrigger,
        reply: oneshot::Sender<Result<TestDelivery, EngineError>>,
    },
}
