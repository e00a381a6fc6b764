#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod events;
pub mod hub;
pub mod ledger;
pub mod processors;
pub mod ranks;
pub mod rewards;
