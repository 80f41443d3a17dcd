//! Host-side spatial and naming components.

use serde::{Deserialize, Serialize};

/// 2D position on a map grid, in tiles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Identifier of a loaded map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(pub u32);

/// A resolved location in the world: which map, and where on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCoordinates {
    pub map: MapId,
    pub position: Vec2,
}

impl MapCoordinates {
    pub fn new(map: MapId, position: Vec2) -> Self {
        Self { map, position }
    }
}

/// Spatial transform component
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    /// Map the entity is on. `None` while in nullspace or being carried.
    pub map: Option<MapId>,
    /// Bolted to the floor
    pub anchored: bool,
}

impl Transform {
    /// Anchored transform on `map` at `position`.
    pub fn anchored(map: MapId, position: Vec2) -> Self {
        Self {
            position,
            map: Some(map),
            anchored: true,
        }
    }

    pub fn unanchored(map: MapId, position: Vec2) -> Self {
        Self {
            position,
            map: Some(map),
            anchored: false,
        }
    }

    /// World location, if the entity is on a map.
    pub fn map_coordinates(&self) -> Option<MapCoordinates> {
        self.map.map(|map| MapCoordinates::new(map, self.position))
    }
}

/// Display name for entities that have one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityName(pub String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
