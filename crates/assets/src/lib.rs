//! Texture table: resolves logical tile names to texture handles.
//!
//! Handles are content-addressed from the texture's source path, so two names
//! that point at the same image share a handle. Decoding and uploading the
//! image is the renderer's business; this crate only names things.
//!
//! # Layout
//! The table is built once at startup (see [`TextureRegistry::builtin`]) or
//! read from a JSON manifest, then injected into whatever needs it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Logical texture names the geometry builder relies on.
pub mod names {
    pub const GROUND: &str = "ground";
    pub const BRIDGE: &str = "bridge";
    pub const STAIR_UPPER: &str = "stair_upper";
    pub const STAIR_LOWER: &str = "stair_lower";
    pub const BLOCK: &str = "block";
    pub const WATER: &str = "water";
    pub const WATER_FALL: &str = "water_fall";
    pub const WATER_COLUMN: &str = "water_column";
    pub const DEFAULT: &str = "default";
}

/// The texture table shipped with the game: logical name → source image.
pub const BUILTIN_TEXTURES: &[(&str, &str)] = &[
    (names::GROUND, "tile_1"),
    (names::BRIDGE, "tile_2"),
    (names::STAIR_UPPER, "tile_3"),
    (names::STAIR_LOWER, "tile_4"),
    (names::BLOCK, "tile_5"),
    (names::WATER, "tile_6"),
    (names::WATER_FALL, "tile_7"),
    (names::WATER_COLUMN, "tile_8"),
    (names::DEFAULT, "tile_10"),
];

/// Content-addressed texture handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

impl TextureId {
    /// Handle for an image source path.
    pub fn from_source(source: &str) -> Self {
        let digest = Sha256::digest(source.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        TextureId(u64::from_le_bytes(bytes))
    }
}

/// One entry of the texture table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDescriptor {
    pub name: String,
    /// Image path relative to the texture root, without extension.
    pub source: String,
    pub id: TextureId,
}

/// Errors from texture table operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("there is no texture with name {0:?} defined")]
    NotFound(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Explicit name → texture mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureRegistry {
    textures: BTreeMap<String, TextureDescriptor>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`BUILTIN_TEXTURES`].
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, source) in BUILTIN_TEXTURES {
            registry.register(name, source);
        }
        registry
    }

    /// Register (or replace) a texture and return its handle.
    pub fn register(&mut self, name: &str, source: &str) -> TextureId {
        let id = TextureId::from_source(source);
        if let Some(old) = self.textures.get(name) {
            tracing::debug!(name, old = %old.source, new = %source, "replacing texture");
        }
        self.textures.insert(
            name.to_string(),
            TextureDescriptor {
                name: name.to_string(),
                source: source.to_string(),
                id,
            },
        );
        id
    }

    /// Resolve a logical name to its handle.
    pub fn lookup(&self, name: &str) -> Result<TextureId, AssetError> {
        self.textures
            .get(name)
            .map(|d| d.id)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }

    pub fn descriptor(&self, name: &str) -> Option<&TextureDescriptor> {
        self.textures.get(name)
    }

    /// Reverse lookup: the first descriptor (by name) using this handle.
    pub fn descriptor_for(&self, id: TextureId) -> Option<&TextureDescriptor> {
        self.textures.values().find(|d| d.id == id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.textures.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Save the table as a JSON manifest.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a table from a JSON manifest.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        let registry: Self = serde_json::from_reader(file)?;
        Ok(registry)
    }
}

pub fn crate_info() -> &'static str {
    "isoroom-assets v0.1.0"
}
