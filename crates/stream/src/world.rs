use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use glam::{Vec2, Vec3};
use isoroom_assets::TextureRegistry;
use isoroom_common::InteractableId;
use isoroom_map::{MapDocument, tile_catalog};
use isoroom_pool::{Pool, PoolStrategy};
use isoroom_render::{Renderer, SlotId, SpriteBatch};
use isoroom_room::{BuildError, GeometryBuilder, Room, RoomRegistry, TileKind, TileTable};

use crate::config::{StreamConfig, StreamStats, TimingWindow};
use crate::error::{SpriteLayer, StreamError};

const LOAD_HISTORY: usize = 32;

/// A slot pool and the sprite batch its slots index.
#[derive(Debug)]
pub struct SpriteSet {
    pool: Box<dyn Pool<SlotId>>,
    batch: SpriteBatch,
}

impl SpriteSet {
    fn new(capacity: usize, strategy: PoolStrategy) -> Self {
        let batch = SpriteBatch::new(capacity);
        let pool = strategy.build(batch.slots());
        Self { pool, batch }
    }

    pub fn pool(&self) -> &dyn Pool<SlotId> {
        self.pool.as_ref()
    }

    pub fn batch(&self) -> &SpriteBatch {
        &self.batch
    }

    pub fn remaining(&self) -> usize {
        self.pool.remaining()
    }

    fn ensure(&self, layer: SpriteLayer, needed: usize) -> Result<(), StreamError> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(StreamError::CapacityExhausted {
                layer,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    fn release(&mut self, layer: SpriteLayer, slot: SlotId) {
        if let Err(err) = self.pool.give(&slot) {
            panic!("{layer} slot {} released out of turn: {err}", slot.0);
        }
        if let Err(err) = self.batch.clear(slot) {
            panic!("{layer} slot {} cannot be cleared: {err}", slot.0);
        }
    }
}

/// The room streaming controller.
///
/// Owns the room registry and two sprite sets (opaque and transparent). Rooms
/// move between unloaded and loaded; each transition either fully happens or
/// changes nothing. While a room is loaded, its residency entry records the
/// slot that renders each of its tiles, in tile order.
#[derive(Debug)]
pub struct World {
    config: StreamConfig,
    textures: TextureRegistry,
    opaque: SpriteSet,
    transparent: SpriteSet,
    rooms: RoomRegistry,
    residency: BTreeMap<String, Vec<(SpriteLayer, SlotId)>>,
    interactables: BTreeSet<InteractableId>,
    tiles: TileTable,
    tile_names: BTreeMap<u32, String>,
    current_room: Option<String>,
    stats: StreamStats,
    load_times: TimingWindow,
}

impl World {
    pub fn new(config: StreamConfig, textures: TextureRegistry) -> Self {
        let opaque = SpriteSet::new(config.opaque_capacity, config.opaque_strategy);
        let transparent = SpriteSet::new(config.transparent_capacity, config.transparent_strategy);
        tracing::debug!(
            opaque = config.opaque_capacity,
            transparent = config.transparent_capacity,
            "world created"
        );
        Self {
            config,
            textures,
            opaque,
            transparent,
            rooms: RoomRegistry::new(),
            residency: BTreeMap::new(),
            interactables: BTreeSet::new(),
            tiles: TileTable::new(),
            tile_names: BTreeMap::new(),
            current_room: None,
            stats: StreamStats::default(),
            load_times: TimingWindow::new(LOAD_HISTORY),
        }
    }

    /// Replace the world with the rooms of `document`.
    ///
    /// Every loaded room is unloaded first; the registry, the tile table and
    /// the name table are rebuilt. Returns the number of registered rooms.
    pub fn load_world(&mut self, document: &MapDocument) -> Result<usize, BuildError> {
        let _span = tracing::info_span!("load_world", iid = %document.iid).entered();

        let resident: Vec<String> = self.residency.keys().cloned().collect();
        for name in resident {
            self.unload_room(&name);
        }
        self.rooms.clear();
        self.tiles.clear();
        self.tile_names.clear();
        self.current_room = None;

        for (id, info) in tile_catalog(document) {
            self.tile_names.insert(id, info.name.clone());
            match self.textures.lookup(&info.name) {
                Ok(texture) => {
                    self.tiles.insert(
                        id,
                        TileKind {
                            name: info.name,
                            texture,
                            transparent: info.transparent,
                        },
                    );
                }
                Err(err) => {
                    tracing::warn!(tile_id = id, name = %info.name, %err, "tile has no known texture, skipped");
                }
            }
        }

        let builder = GeometryBuilder::new(&self.textures, &self.tiles);
        for level in document.all_levels() {
            let room = builder.build_room(level)?;
            tracing::debug!(room = room.name(), tiles = room.size(), "room built");
            self.rooms.add_room(room);
        }

        tracing::info!(rooms = self.rooms.len(), tiles = self.tiles.len(), "world loaded");
        Ok(self.rooms.len())
    }

    /// Register a room. A loaded room of the same name is unloaded first.
    pub fn add_room(&mut self, room: Room) {
        if self.residency.contains_key(room.name()) {
            self.unload_room(room.name());
        }
        self.rooms.add_room(room);
    }

    /// Stream a room in. Reports and ignores failures; returns whether the
    /// room was loaded.
    pub fn load_room(&mut self, name: &str) -> bool {
        match self.try_load_room(name) {
            Ok(()) => true,
            Err(err) => {
                self.stats.requests_rejected += 1;
                tracing::warn!(room = name, %err, "load request ignored");
                false
            }
        }
    }

    /// Stream a room in, or explain why not. Nothing is claimed on failure.
    pub fn try_load_room(&mut self, name: &str) -> Result<(), StreamError> {
        let _span = tracing::info_span!("load_room", room = name).entered();
        let start = Instant::now();

        let Self {
            config,
            opaque,
            transparent,
            rooms,
            residency,
            interactables,
            ..
        } = &mut *self;

        let room = rooms.get(name).ok_or_else(|| StreamError::NotFound {
            room: name.to_string(),
        })?;
        if residency.contains_key(name) {
            return Err(StreamError::AlreadyInState {
                room: name.to_string(),
                loaded: true,
            });
        }
        opaque.ensure(SpriteLayer::Opaque, room.opaque_count())?;
        transparent.ensure(SpriteLayer::Transparent, room.transparent_count())?;

        let mut bindings = Vec::with_capacity(room.size());
        for tile in room.tiles() {
            let layer = SpriteLayer::of(tile.transparent);
            let set = match layer {
                SpriteLayer::Opaque => &mut *opaque,
                SpriteLayer::Transparent => &mut *transparent,
            };
            let slot = match set.pool.get() {
                Ok(slot) => slot,
                Err(err) => panic!("{layer} pool drained after capacity check: {err}"),
            };
            let Vec3 { x, y, z } = tile.position;
            if let Err(err) = set.batch.bind(slot, Vec2::new(x, y), z, tile.texture) {
                panic!("{layer} pool handed out unusable slot {}: {err}", slot.0);
            }
            bindings.push((layer, slot));
        }

        if room.transparent_count() > 0 {
            transparent
                .batch
                .sort_draw_order_by(|s| config.transparent_key(s.position.x, s.position.y, s.depth));
        }
        interactables.extend(room.interactables().iter().copied());
        residency.insert(name.to_string(), bindings);

        let elapsed = start.elapsed();
        self.load_times.record(elapsed);
        self.stats.rooms_loaded += 1;
        self.stats.last_load_time = elapsed;
        self.refresh_residency_stats();
        tracing::debug!(room = name, ?elapsed, "room loaded");
        Ok(())
    }

    /// Stream a room out. Reports and ignores failures; returns whether the
    /// room was unloaded.
    pub fn unload_room(&mut self, name: &str) -> bool {
        match self.try_unload_room(name) {
            Ok(()) => true,
            Err(err) => {
                self.stats.requests_rejected += 1;
                tracing::warn!(room = name, %err, "unload request ignored");
                false
            }
        }
    }

    /// Stream a room out, or explain why not.
    ///
    /// # Panics
    /// If a recorded slot cannot be returned to its pool. That means the
    /// residency table and the pools disagree.
    pub fn try_unload_room(&mut self, name: &str) -> Result<(), StreamError> {
        let _span = tracing::info_span!("unload_room", room = name).entered();

        let room = self.rooms.get(name).ok_or_else(|| StreamError::NotFound {
            room: name.to_string(),
        })?;
        let bindings = self
            .residency
            .remove(name)
            .ok_or_else(|| StreamError::AlreadyInState {
                room: name.to_string(),
                loaded: false,
            })?;
        for id in room.interactables() {
            self.interactables.remove(id);
        }

        for (layer, slot) in bindings {
            self.sprites_mut(layer).release(layer, slot);
        }

        self.stats.rooms_unloaded += 1;
        self.refresh_residency_stats();
        tracing::debug!(room = name, "room unloaded");
        Ok(())
    }

    /// Name of the room containing `point`, preferring the current room.
    pub fn location(&self, point: Vec3) -> Option<&str> {
        self.rooms
            .get_bounds_owner(point, self.current_room.as_deref())
    }

    /// Mark the room the player is in. Unknown names are reported and ignored.
    pub fn set_current_room(&mut self, name: &str) -> bool {
        if !self.rooms.contains(name) {
            tracing::warn!(room = name, "current room is not registered, ignored");
            return false;
        }
        self.current_room = Some(name.to_string());
        true
    }

    pub fn clear_current_room(&mut self) {
        self.current_room = None;
    }

    /// Per-frame: push dirty batch data to the GPU buffers. Returns the number
    /// of columns that moved data.
    pub fn update(&mut self) -> Result<usize, StreamError> {
        let moved = self.opaque.batch.sync()? + self.transparent.batch.sync()?;
        if moved > 0 {
            tracing::trace!(columns = moved, "batches synced");
        }
        Ok(moved)
    }

    /// Draw opaque then transparent sprites inside a depth-test scope.
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        renderer.set_depth_test(true);
        renderer.draw_batch(&self.opaque.batch, true);
        renderer.draw_batch(&self.transparent.batch, true);
        renderer.set_depth_test(false);
    }

    fn sprites_mut(&mut self, layer: SpriteLayer) -> &mut SpriteSet {
        match layer {
            SpriteLayer::Opaque => &mut self.opaque,
            SpriteLayer::Transparent => &mut self.transparent,
        }
    }

    fn refresh_residency_stats(&mut self) {
        self.stats.resident_opaque = self.opaque.pool.used();
        self.stats.resident_transparent = self.transparent.pool.used();
    }

    pub fn sprites(&self, layer: SpriteLayer) -> &SpriteSet {
        match layer {
            SpriteLayer::Opaque => &self.opaque,
            SpriteLayer::Transparent => &self.transparent,
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.residency.contains_key(name)
    }

    pub fn loaded_rooms(&self) -> impl Iterator<Item = &str> {
        self.residency.keys().map(String::as_str)
    }

    /// Slots bound to a loaded room's tiles, in tile order.
    pub fn residency(&self, name: &str) -> Option<&[(SpriteLayer, SlotId)]> {
        self.residency.get(name).map(Vec::as_slice)
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn interactables(&self) -> &BTreeSet<InteractableId> {
        &self.interactables
    }

    pub fn tile_table(&self) -> &TileTable {
        &self.tiles
    }

    pub fn tile_name(&self, tile_id: u32) -> Option<&str> {
        self.tile_names.get(&tile_id).map(String::as_str)
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    pub fn current_room(&self) -> Option<&str> {
        self.current_room.as_deref()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn load_times(&self) -> &TimingWindow {
        &self.load_times
    }
}
