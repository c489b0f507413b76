//! Map documents: the typed tree of a level-editor export.
//!
//! The tree is read-only input to the room builder. Optional or absent fields
//! deserialize to empty values rather than failing.

mod document;
mod tileset;

use std::path::Path;

pub use document::{
    CustomData, Definitions, EntityInstance, HEIGHT_LAYER, Layer, LayerType, Level, MapDocument,
    TERRAIN_LAYER, TileInstance, TilesetDefinition, WorldDefinition,
};
pub use tileset::{TRANSPARENT_MARKER, TileInfo, parse_custom_data, tile_catalog};

/// Errors from reading map documents.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a document from JSON text.
pub fn parse_document(json: &str) -> Result<MapDocument, MapError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a document from disk.
pub fn load_document(path: impl AsRef<Path>) -> Result<MapDocument, MapError> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)?;
    let document = parse_document(&data)?;
    tracing::debug!(
        path = %path.display(),
        levels = document.all_levels().count(),
        "map document loaded"
    );
    Ok(document)
}

pub fn crate_info() -> &'static str {
    "isoroom-map v0.1.0"
}
