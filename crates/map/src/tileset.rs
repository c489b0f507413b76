use std::collections::BTreeMap;

use crate::document::MapDocument;

/// Marker line that flags a tile as see-through.
pub const TRANSPARENT_MARKER: &str = "transparent";

/// What a tileset's custom data says about one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileInfo {
    /// Logical name, also the texture name.
    pub name: String,
    pub transparent: bool,
}

/// Parse a custom-data string.
///
/// The first line is the logical name; any later line containing
/// [`TRANSPARENT_MARKER`] marks the tile transparent. Returns `None` when the
/// name line is blank.
pub fn parse_custom_data(data: &str) -> Option<TileInfo> {
    let mut lines = data.lines();
    let name = lines.next()?.trim();
    if name.is_empty() {
        return None;
    }
    let transparent = lines.any(|line| line.contains(TRANSPARENT_MARKER));
    Some(TileInfo {
        name: name.to_string(),
        transparent,
    })
}

/// Tile id → info for every annotated tile of every tileset in the document.
///
/// Tile ids are merged across tilesets; a later tileset wins on collision.
pub fn tile_catalog(document: &MapDocument) -> BTreeMap<u32, TileInfo> {
    let mut catalog = BTreeMap::new();
    for tileset in &document.defs.tilesets {
        for entry in &tileset.custom_data {
            let Some(info) = parse_custom_data(&entry.data) else {
                tracing::debug!(
                    tileset = %tileset.identifier,
                    tile_id = entry.tile_id,
                    "custom data has no name line"
                );
                continue;
            };
            if let Some(previous) = catalog.insert(entry.tile_id, info) {
                tracing::warn!(
                    tile_id = entry.tile_id,
                    previous = %previous.name,
                    "tile id defined by more than one tileset"
                );
            }
        }
    }
    catalog
}
