use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an interactable object contributed by a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractableId(pub Uuid);

impl InteractableId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an editor instance id. Returns `None` if it is not a UUID.
    pub fn parse(iid: &str) -> Option<Self> {
        Uuid::parse_str(iid).ok().map(Self)
    }
}

impl Default for InteractableId {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned bounding volume in world/grid units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Half-extent of the cube a single tile occupies.
    pub const TILE_MARGIN: f32 = 0.5;

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The unit box `[0, 1]` on every axis.
    pub fn unit() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE)
    }

    /// Cube of side 1 centred on `position`.
    pub fn around(position: Vec3) -> Self {
        let margin = Vec3::splat(Self::TILE_MARGIN);
        Self::new(position - margin, position + margin)
    }

    /// Union of the unit cubes around every position, or `None` when empty.
    pub fn enclosing(positions: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        positions
            .into_iter()
            .map(Self::around)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn union(&self, other: &Bounds) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Inclusive containment on all three axes.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unit()
    }
}
