//! Shared value types for the isoroom workspace.

mod types;

pub use types::{Bounds, InteractableId};

/// Grid-to-world conversion constants fixed by the asset pipeline.
pub mod units {
    /// Level editor pixels per grid cell.
    pub const PIXELS_PER_CELL: i32 = 4;
    /// World-space elevation levels per editor depth layer.
    pub const LEVELS_PER_DEPTH: i32 = 5;
}

pub fn crate_info() -> &'static str {
    "isoroom-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
