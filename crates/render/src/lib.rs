//! Rendering adapter: sprite batches and a renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read batches; they never write slot data.
//! - A batch column is written on one side (CPU or GPU) between syncs.
//!
//! The GPU is modelled by the [`GpuBuffer`] trait. [`HostBuffer`] keeps the
//! bytes in memory so the whole stack runs headless.

mod batch;
mod renderer;
mod synced;

pub use batch::{FieldValue, SlotId, Sprite, SpriteBatch, SpriteField};
pub use renderer::{DebugTextRenderer, Renderer};
pub use synced::{BufferError, GpuBuffer, HostBuffer, SyncDirection, SyncedArray};

pub fn crate_info() -> &'static str {
    "isoroom-render v0.1.0"
}
