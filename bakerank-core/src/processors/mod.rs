//! Long-running processors.
//!
//! - `BakeDispatcher`: Receives `BakeCommand`, drives the `BakeEngine`,
//!   publishes events to the `BroadcastHub`

pub mod bake_dispatcher;

pub use bake_dispatcher::BakeDispatcher;
