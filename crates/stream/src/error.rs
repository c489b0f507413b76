use std::fmt;

use isoroom_render::BufferError;
use isoroom_room::BuildError;

/// Which of the two sprite pools a tile lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteLayer {
    Opaque,
    Transparent,
}

impl SpriteLayer {
    pub fn of(transparent: bool) -> Self {
        if transparent {
            SpriteLayer::Transparent
        } else {
            SpriteLayer::Opaque
        }
    }
}

impl fmt::Display for SpriteLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteLayer::Opaque => f.pad("opaque"),
            SpriteLayer::Transparent => f.pad("transparent"),
        }
    }
}

fn residency(loaded: &bool) -> &'static str {
    if *loaded { "loaded" } else { "unloaded" }
}

/// Errors from streaming operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("room {room:?} is not registered")]
    NotFound { room: String },
    #[error("room {room:?} is already {}", residency(.loaded))]
    AlreadyInState { room: String, loaded: bool },
    #[error("{layer} pool has {remaining} free slots, room needs {needed}")]
    CapacityExhausted {
        layer: SpriteLayer,
        needed: usize,
        remaining: usize,
    },
    #[error("world build failed: {0}")]
    Build(#[from] BuildError),
    #[error("batch sync failed: {0}")]
    Buffer(#[from] BufferError),
}
