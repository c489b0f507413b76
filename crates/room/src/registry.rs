use glam::Vec3;
use std::collections::BTreeMap;

use crate::room::Room;

/// Every known room, by name.
///
/// Spatial lookup is a linear scan over bounds; room counts are small.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: BTreeMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a room, replacing any room with the same name.
    pub fn add_room(&mut self, room: Room) -> Option<Room> {
        let previous = self.rooms.insert(room.name().to_string(), room);
        if let Some(old) = &previous {
            tracing::debug!(room = old.name(), "room replaced");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    /// Name of the room whose bounds contain `point`.
    ///
    /// The `active` room wins if it contains the point. Otherwise the first
    /// match in name order is returned; overlapping rooms are not ranked.
    pub fn get_bounds_owner(&self, point: Vec3, active: Option<&str>) -> Option<&str> {
        if let Some(room) = active.and_then(|name| self.rooms.get(name))
            && room.bounds().contains(point)
        {
            return Some(room.name());
        }
        self.rooms
            .values()
            .find(|room| room.bounds().contains(point))
            .map(Room::name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
