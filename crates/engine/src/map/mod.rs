//! Data-driven map engine: JSON map/tileset loading and validation, the
//! loaded map's query surface, tile-layer compositing, and the
//! interaction/trigger resolver that ties player intent to map
//! semantics.

mod data;
mod entity;
mod interactions;
mod loader;
mod renderer;
mod tileset;

pub use data::{MapData, TileLayer, UnknownLayerError, COLLISION_LAYER};
pub use entity::{Entity, EntityKind, OnEnter};
pub use interactions::{
    check_trigger, get_facing_tile, interact, Facing, InteractionResult, PlayerState,
};
pub use loader::{MapLoadError, MapLoader, MAP_FORMAT_TAG};
pub use renderer::{MapRenderer, TileRenderCommand, LAYER_ORDER};
pub use tileset::{
    TileId, TileSprite, Tileset, TilesetLoadError, TilesetTile, EMPTY_TILE, UNKNOWN_TILE_GLYPH,
};
