use glam::Vec3;
use isoroom_assets::TextureId;
use isoroom_common::{Bounds, InteractableId};
use std::collections::BTreeSet;

/// One renderable unit of a room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub texture: TextureId,
    pub transparent: bool,
    /// Grid position; `z` is the elevation level.
    pub position: Vec3,
}

impl Tile {
    pub fn new(texture: TextureId, transparent: bool, position: Vec3) -> Self {
        Self {
            texture,
            transparent,
            position,
        }
    }
}

/// A named, immutable collection of tiles.
///
/// Counts and bounds are derived once at construction. Rooms never hold GPU
/// slots themselves; the streaming controller tracks which slot renders each
/// tile while the room is resident.
#[derive(Debug, Clone)]
pub struct Room {
    name: String,
    tiles: Vec<Tile>,
    transparent_count: usize,
    interactables: BTreeSet<InteractableId>,
    bounds: Bounds,
}

impl Room {
    /// Build a room whose bounds enclose every tile's unit cube.
    /// A room without tiles gets the unit box.
    pub fn new(name: impl Into<String>, tiles: Vec<Tile>) -> Self {
        let bounds = Bounds::enclosing(tiles.iter().map(|t| t.position)).unwrap_or_default();
        let transparent_count = tiles.iter().filter(|t| t.transparent).count();
        Self {
            name: name.into(),
            tiles,
            transparent_count,
            interactables: BTreeSet::new(),
            bounds,
        }
    }

    /// Replace the computed bounds with explicit ones.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_interactables(mut self, interactables: impl IntoIterator<Item = InteractableId>) -> Self {
        self.interactables.extend(interactables);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Total tile count.
    pub fn size(&self) -> usize {
        self.tiles.len()
    }

    pub fn transparent_count(&self) -> usize {
        self.transparent_count
    }

    pub fn opaque_count(&self) -> usize {
        self.tiles.len() - self.transparent_count
    }

    pub fn interactables(&self) -> &BTreeSet<InteractableId> {
        &self.interactables
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}
