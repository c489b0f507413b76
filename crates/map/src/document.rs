use isoroom_common::units::PIXELS_PER_CELL;
use serde::{Deserialize, Serialize};

/// Name of the integer-grid layer carrying per-cell heights.
pub const HEIGHT_LAYER: &str = "HeightOffset";
/// Name of the tile layer carrying terrain placements.
pub const TERRAIN_LAYER: &str = "Terrain";

/// Root of a level-editor export.
///
/// Single-world projects keep their levels at the root; multi-world projects
/// nest them under `worlds`. [`MapDocument::all_levels`] walks both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapDocument {
    pub iid: String,
    pub json_version: String,
    pub defs: Definitions,
    pub levels: Vec<Level>,
    pub worlds: Vec<WorldDefinition>,
}

impl MapDocument {
    pub fn all_levels(&self) -> impl Iterator<Item = &Level> {
        self.levels
            .iter()
            .chain(self.worlds.iter().flat_map(|w| w.levels.iter()))
    }

    pub fn level(&self, identifier: &str) -> Option<&Level> {
        self.all_levels().find(|l| l.identifier == identifier)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Definitions {
    pub tilesets: Vec<TilesetDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TilesetDefinition {
    pub uid: i64,
    pub identifier: String,
    pub tile_grid_size: u32,
    pub custom_data: Vec<CustomData>,
}

/// Free-form text attached to one tile of a tileset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomData {
    pub tile_id: u32,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldDefinition {
    pub identifier: String,
    pub iid: String,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Level {
    pub identifier: String,
    pub iid: String,
    pub uid: i64,
    pub world_x: i32,
    pub world_y: i32,
    pub world_depth: i32,
    pub px_wid: i32,
    pub px_hei: i32,
    /// `None` when the level's layers live in an external file.
    pub layer_instances: Option<Vec<Layer>>,
}

impl Level {
    pub fn layers(&self) -> &[Layer] {
        self.layer_instances.as_deref().unwrap_or_default()
    }

    pub fn layer(&self, identifier: &str) -> Option<&Layer> {
        self.layers().iter().find(|l| l.identifier == identifier)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityInstance> {
        self.layers()
            .iter()
            .filter(|l| l.layer_type == LayerType::Entities)
            .flat_map(|l| l.entity_instances.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerType {
    #[default]
    IntGrid,
    Entities,
    Tiles,
    AutoLayer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Layer {
    #[serde(rename = "__identifier")]
    pub identifier: String,
    #[serde(rename = "__type")]
    pub layer_type: LayerType,
    #[serde(rename = "__cWid")]
    pub c_wid: u32,
    #[serde(rename = "__cHei")]
    pub c_hei: u32,
    #[serde(rename = "__gridSize")]
    pub grid_size: u32,
    pub int_grid_csv: Vec<i32>,
    pub grid_tiles: Vec<TileInstance>,
    pub auto_layer_tiles: Vec<TileInstance>,
    pub entity_instances: Vec<EntityInstance>,
}

impl Layer {
    /// Hand-placed tiles followed by auto-layer tiles.
    pub fn tiles(&self) -> impl Iterator<Item = &TileInstance> {
        self.grid_tiles.iter().chain(self.auto_layer_tiles.iter())
    }

    pub fn cell_count(&self) -> usize {
        self.c_wid as usize * self.c_hei as usize
    }
}

/// One tile placement inside a tile layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TileInstance {
    /// Pixel position inside the layer.
    pub px: [i32; 2],
    /// Pixel position inside the tileset image.
    pub src: [i32; 2],
    /// Tile id inside the tileset.
    pub t: u32,
    /// Flip bits.
    pub f: u8,
    /// Alpha.
    pub a: f32,
}

impl TileInstance {
    /// Grid cell this placement covers.
    pub fn cell(&self) -> (i32, i32) {
        (
            self.px[0].div_euclid(PIXELS_PER_CELL),
            self.px[1].div_euclid(PIXELS_PER_CELL),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityInstance {
    #[serde(rename = "__identifier")]
    pub identifier: String,
    #[serde(rename = "__grid")]
    pub grid: [i32; 2],
    pub iid: String,
    pub px: [i32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "iid": "root",
            "jsonVersion": "1.5.3",
            "defs": {
                "tilesets": [{
                    "uid": 1,
                    "identifier": "Dungeon",
                    "tileGridSize": 4,
                    "customData": [{ "tileId": 0, "data": "ground" }]
                }]
            },
            "levels": [{
                "identifier": "Entrance",
                "iid": "l1",
                "worldX": 8,
                "worldY": 4,
                "worldDepth": 1,
                "layerInstances": [
                    {
                        "__identifier": "HeightOffset",
                        "__type": "IntGrid",
                        "__cWid": 2,
                        "__cHei": 1,
                        "__gridSize": 4,
                        "intGridCsv": [0, 2]
                    },
                    {
                        "__identifier": "Terrain",
                        "__type": "Tiles",
                        "__cWid": 2,
                        "__cHei": 1,
                        "gridTiles": [
                            { "px": [0, 0], "src": [0, 0], "t": 0, "f": 0, "a": 1.0 },
                            { "px": [4, 0], "src": [0, 0], "t": 0, "f": 0, "a": 1.0 }
                        ]
                    }
                ]
            }],
            "worlds": [{
                "identifier": "Caves",
                "levels": [{ "identifier": "Cave_1", "layerInstances": null }]
            }]
        })
    }

    #[test]
    fn parses_nested_document() {
        let doc: MapDocument = serde_json::from_value(sample()).unwrap();
        assert_eq!(doc.json_version, "1.5.3");
        assert_eq!(doc.defs.tilesets[0].custom_data[0].data, "ground");

        let names: Vec<_> = doc.all_levels().map(|l| l.identifier.as_str()).collect();
        assert_eq!(names, ["Entrance", "Cave_1"]);
    }

    #[test]
    fn layer_lookup_by_name() {
        let doc: MapDocument = serde_json::from_value(sample()).unwrap();
        let level = doc.level("Entrance").unwrap();
        let heights = level.layer(HEIGHT_LAYER).unwrap();
        assert_eq!(heights.layer_type, LayerType::IntGrid);
        assert_eq!(heights.int_grid_csv, [0, 2]);
        assert_eq!(heights.cell_count(), 2);

        let terrain = level.layer(TERRAIN_LAYER).unwrap();
        let cells: Vec<_> = terrain.tiles().map(TileInstance::cell).collect();
        assert_eq!(cells, [(0, 0), (1, 0)]);
    }

    #[test]
    fn missing_layers_default_to_empty() {
        let doc: MapDocument = serde_json::from_value(sample()).unwrap();
        let cave = doc.level("Cave_1").unwrap();
        assert!(cave.layers().is_empty());
        assert!(cave.layer(TERRAIN_LAYER).is_none());
        assert_eq!(cave.entities().count(), 0);
    }

    #[test]
    fn entities_are_collected_from_entity_layers() {
        let level: Level = serde_json::from_value(json!({
            "identifier": "Hall",
            "layerInstances": [{
                "__identifier": "Objects",
                "__type": "Entities",
                "entityInstances": [
                    { "__identifier": "Chest", "__grid": [1, 2], "iid": "x", "px": [4, 8] }
                ]
            }]
        }))
        .unwrap();
        let entities: Vec<_> = level.entities().collect();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].identifier, "Chest");
        assert_eq!(entities[0].grid, [1, 2]);
    }

    #[test]
    fn cell_divides_pixel_position() {
        let tile = TileInstance {
            px: [12, 7],
            ..TileInstance::default()
        };
        assert_eq!(tile.cell(), (3, 1));
    }
}
