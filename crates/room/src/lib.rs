//! Rooms: immutable tile collections built from map levels, and the registry
//! that finds them by name or by position.
//!
//! # Invariants
//! - A room never changes after construction.
//! - Auto-computed bounds contain every tile position ± 0.5 on all axes.
//! - Column tiles precede the surface tile of their cell.

mod builder;
mod registry;
mod room;

pub use builder::{
    BuildError, GeometryBuilder, Placement, TerrainGrid, TileKind, TileTable, world_offset,
};
pub use registry::RoomRegistry;
pub use room::{Room, Tile};

pub fn crate_info() -> &'static str {
    "isoroom-room v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("room"));
    }
}
