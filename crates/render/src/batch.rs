use glam::Vec2;
use isoroom_assets::TextureId;

use crate::synced::{BufferError, GpuBuffer, HostBuffer, SyncedArray};

/// Index of a sprite slot inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl SlotId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The columns of a sprite batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteField {
    Position,
    Depth,
    Texture,
    Visible,
}

impl SpriteField {
    pub const ALL: [SpriteField; 4] = [
        SpriteField::Position,
        SpriteField::Depth,
        SpriteField::Texture,
        SpriteField::Visible,
    ];

    /// Components per slot in this column.
    pub fn components(self) -> usize {
        match self {
            SpriteField::Position => 2,
            SpriteField::Depth | SpriteField::Texture | SpriteField::Visible => 1,
        }
    }

    /// Bytes per component.
    pub fn component_size(self) -> usize {
        match self {
            SpriteField::Position | SpriteField::Depth => std::mem::size_of::<f32>(),
            SpriteField::Texture => std::mem::size_of::<u64>(),
            SpriteField::Visible => std::mem::size_of::<u32>(),
        }
    }
}

/// A value read from or written to one column of one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Position(Vec2),
    Depth(f32),
    Texture(TextureId),
    Visible(bool),
}

impl FieldValue {
    pub fn field(&self) -> SpriteField {
        match self {
            FieldValue::Position(_) => SpriteField::Position,
            FieldValue::Depth(_) => SpriteField::Depth,
            FieldValue::Texture(_) => SpriteField::Texture,
            FieldValue::Visible(_) => SpriteField::Visible,
        }
    }
}

/// Row view of one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub slot: SlotId,
    pub position: Vec2,
    pub depth: f32,
    pub texture: TextureId,
    pub visible: bool,
}

/// Fixed-capacity columnar sprite storage, one synced array per field.
///
/// Slots are addressed by [`SlotId`]; the draw order is a separate index
/// list so sorting never moves slot data.
#[derive(Debug)]
pub struct SpriteBatch {
    capacity: usize,
    position: SyncedArray<f32>,
    depth: SyncedArray<f32>,
    texture: SyncedArray<u64>,
    visible: SyncedArray<u32>,
    draw_order: Vec<SlotId>,
}

impl SpriteBatch {
    /// Batch backed by host buffers.
    pub fn new(capacity: usize) -> Self {
        Self::with_buffers(capacity, |_, bytes| Box::new(HostBuffer::new(bytes)))
    }

    /// Batch whose columns are backed by buffers from `make(field, byte_len)`.
    pub fn with_buffers(
        capacity: usize,
        mut make: impl FnMut(SpriteField, usize) -> Box<dyn GpuBuffer>,
    ) -> Self {
        let mut column = |field: SpriteField| {
            let bytes = capacity * field.components() * field.component_size();
            (make(field, bytes), field.components())
        };
        let (position, position_step) = column(SpriteField::Position);
        let (depth, depth_step) = column(SpriteField::Depth);
        let (texture, texture_step) = column(SpriteField::Texture);
        let (visible, visible_step) = column(SpriteField::Visible);
        Self {
            capacity,
            position: SyncedArray::new(capacity, position_step, position),
            depth: SyncedArray::new(capacity, depth_step, depth),
            texture: SyncedArray::new(capacity, texture_step, texture),
            visible: SyncedArray::new(capacity, visible_step, visible),
            draw_order: (0..capacity as u32).map(SlotId).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every slot id, in index order. These are the items a pool hands out.
    pub fn slots(&self) -> Vec<SlotId> {
        (0..self.capacity as u32).map(SlotId).collect()
    }

    fn check(&self, slot: SlotId) -> Result<usize, BufferError> {
        let idx = slot.index();
        if idx >= self.capacity {
            return Err(BufferError::SlotOutOfRange {
                slot: idx,
                capacity: self.capacity,
            });
        }
        Ok(idx)
    }

    /// Read one field of one slot.
    pub fn get(&self, slot: SlotId, field: SpriteField) -> Result<FieldValue, BufferError> {
        let idx = self.check(slot)?;
        let out_of_range = BufferError::SlotOutOfRange {
            slot: idx,
            capacity: self.capacity,
        };
        let value = match field {
            SpriteField::Position => {
                let p = self.position.get(idx).ok_or(out_of_range)?;
                FieldValue::Position(Vec2::new(p[0], p[1]))
            }
            SpriteField::Depth => FieldValue::Depth(self.depth.get(idx).ok_or(out_of_range)?[0]),
            SpriteField::Texture => {
                FieldValue::Texture(TextureId(self.texture.get(idx).ok_or(out_of_range)?[0]))
            }
            SpriteField::Visible => {
                FieldValue::Visible(self.visible.get(idx).ok_or(out_of_range)?[0] != 0)
            }
        };
        Ok(value)
    }

    /// Write one field of one slot; the value's variant names the field.
    pub fn set(&mut self, slot: SlotId, value: FieldValue) -> Result<(), BufferError> {
        let idx = self.check(slot)?;
        match value {
            FieldValue::Position(p) => self.position.set(idx, &[p.x, p.y]),
            FieldValue::Depth(d) => self.depth.set(idx, &[d]),
            FieldValue::Texture(t) => self.texture.set(idx, &[t.0]),
            FieldValue::Visible(v) => self.visible.set(idx, &[u32::from(v)]),
        }
    }

    /// Make a slot visible with the given placement and texture.
    pub fn bind(
        &mut self,
        slot: SlotId,
        position: Vec2,
        depth: f32,
        texture: TextureId,
    ) -> Result<(), BufferError> {
        self.set(slot, FieldValue::Position(position))?;
        self.set(slot, FieldValue::Depth(depth))?;
        self.set(slot, FieldValue::Texture(texture))?;
        self.set(slot, FieldValue::Visible(true))
    }

    /// Hide a slot and zero its placement.
    pub fn clear(&mut self, slot: SlotId) -> Result<(), BufferError> {
        self.set(slot, FieldValue::Visible(false))?;
        self.set(slot, FieldValue::Position(Vec2::ZERO))?;
        self.set(slot, FieldValue::Depth(0.0))
    }

    /// Row view of a slot, `None` if out of range.
    pub fn sprite(&self, slot: SlotId) -> Option<Sprite> {
        let idx = slot.index();
        let p = self.position.get(idx)?;
        Some(Sprite {
            slot,
            position: Vec2::new(p[0], p[1]),
            depth: self.depth.get(idx)?[0],
            texture: TextureId(self.texture.get(idx)?[0]),
            visible: self.visible.get(idx)?[0] != 0,
        })
    }

    pub fn draw_order(&self) -> &[SlotId] {
        &self.draw_order
    }

    /// Visible sprites in draw order.
    pub fn visible_sprites(&self) -> impl Iterator<Item = Sprite> + '_ {
        self.draw_order
            .iter()
            .filter_map(|&slot| self.sprite(slot))
            .filter(|s| s.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_sprites().count()
    }

    /// Stable sort of the draw order by an ascending key.
    pub fn sort_draw_order_by(&mut self, key: impl Fn(&Sprite) -> f32) {
        let mut keyed: Vec<(f32, SlotId)> = self
            .draw_order
            .iter()
            .filter_map(|&slot| self.sprite(slot).map(|s| (key(&s), slot)))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.draw_order = keyed.into_iter().map(|(_, slot)| slot).collect();
    }

    pub fn is_dirty(&self) -> bool {
        self.position.is_dirty()
            || self.depth.is_dirty()
            || self.texture.is_dirty()
            || self.visible.is_dirty()
    }

    /// Sync every column. Returns how many columns moved data.
    pub fn sync(&mut self) -> Result<usize, BufferError> {
        use crate::synced::SyncDirection::Clean;
        let moved = [
            self.position.sync()?,
            self.depth.sync()?,
            self.texture.sync()?,
            self.visible.sync()?,
        ];
        let count = moved.iter().filter(|d| **d != Clean).count();
        if count > 0 {
            tracing::trace!(capacity = self.capacity, columns = count, "sprite batch synced");
        }
        Ok(count)
    }
}
