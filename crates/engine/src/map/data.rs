use std::collections::HashMap;

use thiserror::Error;

use super::entity::Entity;
use super::tileset::{TileId, Tileset, EMPTY_TILE};

/// Layer whose non-zero cells override tileset solidity entirely.
pub const COLLISION_LAYER: &str = "collision";

/// One named full-grid array of tile ids, row-major (`y * width + x`).
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    pub data: Vec<TileId>,
    pub visible: bool,
}

/// Asking for a layer name the map does not have is a caller bug, not a
/// data problem, and is the only query-surface error.
#[derive(Debug, Error)]
#[error("unknown layer '{layer}' in map '{map}'")]
pub struct UnknownLayerError {
    pub map: String,
    pub layer: String,
}

/// A loaded, validated map. Effectively immutable once built: queries
/// borrow it, nothing in the engine mutates it during play.
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub tileset: Tileset,
    pub layers: HashMap<String, TileLayer>,
    pub entities: Vec<Entity>,
}

impl MapData {
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Row-major cell index. Callers must have bounds-checked `(x, y)`.
    pub(crate) fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Out-of-bounds reads are defined as empty, not as errors.
    pub fn get_tile(&self, layer_name: &str, x: i32, y: i32) -> Result<TileId, UnknownLayerError> {
        let layer = self
            .layers
            .get(layer_name)
            .ok_or_else(|| UnknownLayerError {
                map: self.name.clone(),
                layer: layer_name.to_string(),
            })?;
        if !self.in_bounds(x, y) {
            return Ok(EMPTY_TILE);
        }
        Ok(layer.data[self.index(x, y)])
    }

    /// The map boundary is implicitly solid. Inside the map, an explicit
    /// `collision` layer takes total precedence; without one, any
    /// non-empty tile the tileset marks solid blocks the cell, on any
    /// layer.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return true;
        }
        let index = self.index(x, y);
        if let Some(collision) = self.layers.get(COLLISION_LAYER) {
            return collision.data[index] != EMPTY_TILE;
        }
        self.layers.values().any(|layer| {
            let tile_id = layer.data[index];
            tile_id != EMPTY_TILE && self.tileset.is_solid(tile_id)
        })
    }

    /// Entities of one type, in document order.
    pub fn get_entities_by_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a Entity> {
        self.entities
            .iter()
            .filter(move |entity| entity.type_name() == type_name)
    }

    /// First entity (in document order) covering `(x, y)`, optionally
    /// restricted to a type allow-list. Document order is the documented
    /// tie-break for overlapping entities.
    pub fn get_entity_at(&self, x: i32, y: i32, types: Option<&[&str]>) -> Option<&Entity> {
        self.entities.iter().find(|entity| {
            if let Some(types) = types {
                if !types.contains(&entity.type_name()) {
                    return false;
                }
            }
            entity.covers_tile(x, y)
        })
    }
}
