//! Tile geometry: terrain placements plus a heightmap become stacked tiles.
//!
//! Every terrain cell yields one surface tile at its height. Cells on the grid
//! border, or standing above a lower neighbour, also grow a column of tiles
//! underneath so the side of the ledge is drawn. Columns are emitted before
//! their surface tile.

use glam::Vec3;
use isoroom_assets::{AssetError, TextureId, TextureRegistry, names};
use isoroom_common::InteractableId;
use isoroom_common::units::{LEVELS_PER_DEPTH, PIXELS_PER_CELL};
use isoroom_map::{HEIGHT_LAYER, Level, TERRAIN_LAYER};
use std::collections::BTreeMap;

use crate::room::{Room, Tile};

/// What a tile id means to the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileKind {
    pub name: String,
    pub texture: TextureId,
    pub transparent: bool,
}

/// Tile id → kind, rebuilt whenever a new map document is loaded.
pub type TileTable = BTreeMap<u32, TileKind>;

/// Errors from building geometry.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("texture lookup failed: {0}")]
    Asset(#[from] AssetError),
}

/// One terrain placement on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub cell: (i32, i32),
    pub tile_id: u32,
}

/// A level's terrain reduced to what the builder needs.
#[derive(Debug, Clone, Default)]
pub struct TerrainGrid {
    pub width: i32,
    pub height: i32,
    /// Row-major heights; missing cells read as 0.
    pub heights: Vec<i32>,
    pub placements: Vec<Placement>,
}

impl TerrainGrid {
    /// Extract the terrain and height layers of a level. Missing layers give
    /// an empty grid or a flat one respectively.
    pub fn from_level(level: &Level) -> Self {
        let Some(terrain) = level.layer(TERRAIN_LAYER) else {
            return Self::default();
        };
        let heights = level
            .layer(HEIGHT_LAYER)
            .map(|l| l.int_grid_csv.clone())
            .unwrap_or_default();
        let placements = terrain
            .tiles()
            .map(|t| Placement {
                cell: t.cell(),
                tile_id: t.t,
            })
            .collect();
        Self {
            width: terrain.c_wid as i32,
            height: terrain.c_hei as i32,
            heights,
            placements,
        }
    }

    pub fn in_grid(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    pub fn height_at(&self, x: i32, y: i32) -> i32 {
        if !self.in_grid(x, y) {
            return 0;
        }
        let idx = (y * self.width + x) as usize;
        self.heights.get(idx).copied().unwrap_or(0)
    }

    pub fn on_border(&self, x: i32, y: i32) -> bool {
        x == 0 || x == self.width - 1 || y == 0 || y == self.height - 1
    }

    /// Lowest height among the in-grid 4-neighbours.
    pub fn lowest_neighbour(&self, x: i32, y: i32) -> Option<i32> {
        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .into_iter()
            .filter(|&(nx, ny)| self.in_grid(nx, ny))
            .map(|(nx, ny)| self.height_at(nx, ny))
            .min()
    }
}

/// World-space offset of a level: editor pixels to grid units, depth layers
/// to elevation levels.
pub fn world_offset(level: &Level) -> Vec3 {
    Vec3::new(
        level.world_x as f32 / PIXELS_PER_CELL as f32,
        level.world_y as f32 / PIXELS_PER_CELL as f32,
        (level.world_depth * LEVELS_PER_DEPTH) as f32,
    )
}

/// Turns terrain grids into tile lists.
pub struct GeometryBuilder<'a> {
    textures: &'a TextureRegistry,
    tiles: &'a TileTable,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(textures: &'a TextureRegistry, tiles: &'a TileTable) -> Self {
        Self { textures, tiles }
    }

    /// Build the tiles of one terrain grid placed at `offset`.
    pub fn build_tiles(&self, grid: &TerrainGrid, offset: Vec3) -> Result<Vec<Tile>, BuildError> {
        let mut out = Vec::with_capacity(grid.placements.len());
        for placement in &grid.placements {
            let (tx, ty) = placement.cell;
            if !grid.in_grid(tx, ty) {
                tracing::warn!(x = tx, y = ty, "terrain placement outside the grid, skipped");
                continue;
            }
            self.build_cell(grid, placement, offset, &mut out)?;
        }
        Ok(out)
    }

    fn build_cell(
        &self,
        grid: &TerrainGrid,
        placement: &Placement,
        offset: Vec3,
        out: &mut Vec<Tile>,
    ) -> Result<(), BuildError> {
        let (tx, ty) = placement.cell;
        let h = grid.height_at(tx, ty);
        let kind = self.kind(placement.tile_id)?;

        let needs_column = kind.name != names::BRIDGE
            && (grid.on_border(tx, ty) || grid.lowest_neighbour(tx, ty).is_some_and(|low| low < h));

        let mut surface_texture = kind.texture;
        let mut surface_transparent = kind.transparent;
        let column = |z: i32| offset + Vec3::new(tx as f32, ty as f32, z as f32);

        if needs_column {
            let (texture, transparent, levels) = if kind.name == names::WATER {
                surface_texture = self.textures.lookup(names::WATER_FALL)?;
                surface_transparent = true;
                (self.textures.lookup(names::WATER_COLUMN)?, true, 1..h)
            } else {
                (self.textures.lookup(names::BLOCK)?, false, 0..h)
            };
            out.extend(levels.map(|z| Tile::new(texture, transparent, column(z))));
        }

        out.push(Tile::new(surface_texture, surface_transparent, column(h)));
        Ok(())
    }

    /// Kind for a tile id, falling back to the default texture.
    fn kind(&self, tile_id: u32) -> Result<TileKind, BuildError> {
        if let Some(kind) = self.tiles.get(&tile_id) {
            return Ok(kind.clone());
        }
        tracing::trace!(tile_id, "unknown tile id, using default texture");
        Ok(TileKind {
            name: names::DEFAULT.to_string(),
            texture: self.textures.lookup(names::DEFAULT)?,
            transparent: false,
        })
    }

    /// Build the room for one level: geometry, interactables, name.
    pub fn build_room(&self, level: &Level) -> Result<Room, BuildError> {
        let grid = TerrainGrid::from_level(level);
        let tiles = self.build_tiles(&grid, world_offset(level))?;
        let interactables = level.entities().filter_map(|entity| {
            let id = InteractableId::parse(&entity.iid);
            if id.is_none() {
                tracing::warn!(
                    level = %level.identifier,
                    entity = %entity.identifier,
                    iid = %entity.iid,
                    "entity iid is not a UUID, skipped"
                );
            }
            id
        });
        Ok(Room::new(level.identifier.clone(), tiles).with_interactables(interactables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GROUND: u32 = 0;
    const WATER: u32 = 1;
    const BRIDGE: u32 = 2;

    fn table(textures: &TextureRegistry) -> TileTable {
        let mut t = TileTable::new();
        for (id, name, transparent) in [
            (GROUND, names::GROUND, false),
            (WATER, names::WATER, true),
            (BRIDGE, names::BRIDGE, false),
        ] {
            t.insert(
                id,
                TileKind {
                    name: name.to_string(),
                    texture: textures.lookup(name).unwrap(),
                    transparent,
                },
            );
        }
        t
    }

    fn grid(width: i32, height: i32, heights: Vec<i32>, tile_id: u32) -> TerrainGrid {
        let placements = (0..height)
            .flat_map(|y| (0..width).map(move |x| Placement { cell: (x, y), tile_id }))
            .collect();
        TerrainGrid {
            width,
            height,
            heights,
            placements,
        }
    }

    fn tiles_at(tiles: &[Tile], x: f32, y: f32) -> Vec<Tile> {
        tiles
            .iter()
            .filter(|t| t.position.x == x && t.position.y == y)
            .copied()
            .collect()
    }

    #[test]
    fn flat_grid_has_only_surfaces() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let tiles = builder
            .build_tiles(&grid(3, 3, vec![0; 9], GROUND), Vec3::ZERO)
            .unwrap();
        assert_eq!(tiles.len(), 9);
        assert!(tiles.iter().all(|t| t.position.z == 0.0));
    }

    #[test]
    fn ledge_grows_column_under_raised_cell() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let mut heights = vec![0; 25];
        heights[2 * 5 + 2] = 3;
        let tiles = builder
            .build_tiles(&grid(5, 5, heights, GROUND), Vec3::ZERO)
            .unwrap();

        let block = textures.lookup(names::BLOCK).unwrap();
        let centre = tiles_at(&tiles, 2.0, 2.0);
        assert_eq!(centre.len(), 4);
        let zs: Vec<f32> = centre.iter().map(|t| t.position.z).collect();
        assert_eq!(zs, [0.0, 1.0, 2.0, 3.0]);
        assert!(centre[..3].iter().all(|t| t.texture == block));

        for (x, y) in [(1.0, 2.0), (3.0, 2.0), (2.0, 1.0), (2.0, 3.0)] {
            let cell = tiles_at(&tiles, x, y);
            assert_eq!(cell.len(), 1, "neighbour ({x}, {y})");
            assert_eq!(cell[0].position.z, 0.0);
        }
        // 24 flat cells + centre column (3) + centre surface
        assert_eq!(tiles.len(), 28);
    }

    #[test]
    fn border_cells_grow_columns() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let tiles = builder
            .build_tiles(&grid(3, 3, vec![2; 9], GROUND), Vec3::ZERO)
            .unwrap();
        // 8 border cells × (2 column + 1 surface) + centre surface only
        assert_eq!(tiles.len(), 8 * 3 + 1);
        assert_eq!(tiles_at(&tiles, 1.0, 1.0).len(), 1);
    }

    #[test]
    fn water_column_special_case() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let tiles = builder
            .build_tiles(&grid(1, 1, vec![4], WATER), Vec3::ZERO)
            .unwrap();
        let water_column = textures.lookup(names::WATER_COLUMN).unwrap();
        let water_fall = textures.lookup(names::WATER_FALL).unwrap();

        assert_eq!(tiles.len(), 4);
        for (tile, z) in tiles[..3].iter().zip(1..4) {
            assert_eq!(tile.texture, water_column);
            assert!(tile.transparent);
            assert_eq!(tile.position.z, z as f32);
        }
        let surface = tiles[3];
        assert_eq!(surface.texture, water_fall);
        assert!(surface.transparent);
        assert_eq!(surface.position.z, 4.0);
    }

    #[test]
    fn bridges_never_grow_columns() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let tiles = builder
            .build_tiles(&grid(1, 1, vec![5], BRIDGE), Vec3::ZERO)
            .unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].position.z, 5.0);
    }

    #[test]
    fn unknown_tile_uses_default_texture() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let tiles = builder
            .build_tiles(&grid(1, 1, vec![0], 999), Vec3::ZERO)
            .unwrap();
        assert_eq!(tiles[0].texture, textures.lookup(names::DEFAULT).unwrap());
        assert!(!tiles[0].transparent);
    }

    #[test]
    fn missing_builder_texture_propagates() {
        let mut textures = TextureRegistry::new();
        textures.register(names::GROUND, "tile_1");
        let table = table(&TextureRegistry::builtin());
        let builder = GeometryBuilder::new(&textures, &table);

        let err = builder
            .build_tiles(&grid(1, 1, vec![2], GROUND), Vec3::ZERO)
            .unwrap_err();
        assert!(matches!(err, BuildError::Asset(AssetError::NotFound(ref n)) if n == names::BLOCK));
    }

    #[test]
    fn offset_is_applied() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let tiles = builder
            .build_tiles(&grid(1, 1, vec![0], GROUND), Vec3::new(10.0, 20.0, 5.0))
            .unwrap();
        assert_eq!(tiles[0].position, Vec3::new(10.0, 20.0, 5.0));
    }

    #[test]
    fn short_height_grid_reads_zero() {
        let g = grid(2, 2, vec![3], GROUND);
        assert_eq!(g.height_at(0, 0), 3);
        assert_eq!(g.height_at(1, 1), 0);
        assert_eq!(g.height_at(-1, 0), 0);
    }

    #[test]
    fn build_room_from_level() {
        let textures = TextureRegistry::builtin();
        let table = table(&textures);
        let builder = GeometryBuilder::new(&textures, &table);

        let level: Level = serde_json::from_value(json!({
            "identifier": "Entrance",
            "worldX": 16,
            "worldY": 8,
            "worldDepth": 1,
            "layerInstances": [
                { "__identifier": "HeightOffset", "__type": "IntGrid", "__cWid": 2, "__cHei": 1, "intGridCsv": [0, 1] },
                { "__identifier": "Terrain", "__type": "Tiles", "__cWid": 2, "__cHei": 1,
                  "gridTiles": [ { "px": [0, 0], "t": 0 }, { "px": [4, 0], "t": 1 } ] },
                { "__identifier": "Objects", "__type": "Entities",
                  "entityInstances": [
                    { "__identifier": "Lever", "iid": "5f1c2c70-4b6e-11ee-9d6e-0242ac120002" },
                    { "__identifier": "Broken", "iid": "nope" }
                  ] }
            ]
        }))
        .unwrap();

        let room = builder.build_room(&level).unwrap();
        assert_eq!(room.name(), "Entrance");
        // ground surface, water column over [1, 1) is empty, water_fall surface
        assert_eq!(room.size(), 2);
        assert_eq!(room.transparent_count(), 1);
        assert_eq!(room.interactables().len(), 1);
        assert_eq!(room.tiles()[0].position, Vec3::new(4.0, 2.0, 5.0));
        assert_eq!(room.tiles()[1].position, Vec3::new(5.0, 2.0, 6.0));
    }

    #[test]
    fn level_without_terrain_is_empty() {
        let textures = TextureRegistry::builtin();
        let table = TileTable::new();
        let builder = GeometryBuilder::new(&textures, &table);

        let room = builder.build_room(&Level::default()).unwrap();
        assert_eq!(room.size(), 0);
    }
}
