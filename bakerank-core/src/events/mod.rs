//! Command queue between producers and the bake dispatcher.
//!
//! Producers (the control API, a chat bridge, the control panel) never touch
//! the engine state directly. They submit a [`BakeCommand`] through a
//! [`BakeHandle`] and await the reply.
//!
//! # Command Flow
//!
//! 1. Producer → `BakeCommand` → `BakeDispatcher`
//! 2. `BakeDispatcher` → `BakeEngine` → `BakeOutcome` (replied to the producer)
//! 3. `BakeDispatcher` → `BroadcastHub` → every overlay

pub mod channels;
pub mod types;

pub use channels::{
    BakeCommandReceiver, BakeCommandSender, BakeHandle, DEFAULT_CHANNEL_BUFFER, DispatchError,
    bake_command_channel,
};
pub use types::{BakeCommand, TestDelivery};
