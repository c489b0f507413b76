//! Streaming: rooms in and out of fixed-capacity sprite slots.
//!
//! # Invariants
//! - Loading claims every slot a room needs or none of them.
//! - Unloading returns every claimed slot and clears it.
//! - The active interactables are the union over loaded rooms.
//! - Slot bookkeeping errors are bugs and panic.

mod config;
mod error;
pub mod task;
mod world;

pub use config::{StreamConfig, StreamStats, TimingWindow};
pub use error::{SpriteLayer, StreamError};
pub use task::{Progress, TaskHandle, spawn_task};
pub use world::{SpriteSet, World};

pub fn crate_info() -> &'static str {
    "isoroom-stream v0.1.0"
}
