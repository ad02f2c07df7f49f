use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Numeric tile id as stored in layer grids and tileset documents.
pub type TileId = u32;

/// Tile id `0` is the reserved "no tile here" sentinel. Layers use it for
/// empty cells, compositing skips it, and solidity treats it as open ground.
pub const EMPTY_TILE: TileId = 0;

pub const UNKNOWN_TILE_GLYPH: char = '?';

#[derive(Debug, Clone, PartialEq)]
pub struct TilesetTile {
    pub tile_id: TileId,
    pub name: String,
    pub solid: bool,
    pub glyph: char,
    pub tags: Vec<String>,
    pub atlas_image: Option<String>,
    pub uv: Option<(u32, u32)>,
    pub sprite_key: Option<String>,
}

/// Sprite reference for one tile id, borrowed from the owning tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSprite<'a> {
    pub atlas_image: Option<&'a str>,
    pub uv: Option<(u32, u32)>,
    pub sprite_key: Option<&'a str>,
}

impl TileSprite<'_> {
    const NONE: TileSprite<'static> = TileSprite {
        atlas_image: None,
        uv: None,
        sprite_key: None,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub tileset_id: String,
    pub tile_size: u32,
    pub tiles: HashMap<TileId, TilesetTile>,
}

impl Tileset {
    /// Unknown ids are not solid; missing tileset entries never block movement.
    pub fn is_solid(&self, tile_id: TileId) -> bool {
        self.tiles.get(&tile_id).map(|tile| tile.solid).unwrap_or(false)
    }

    /// Unknown ids render as [`UNKNOWN_TILE_GLYPH`] instead of failing.
    pub fn glyph(&self, tile_id: TileId) -> char {
        self.tiles
            .get(&tile_id)
            .map(|tile| tile.glyph)
            .unwrap_or(UNKNOWN_TILE_GLYPH)
    }

    pub fn sprite(&self, tile_id: TileId) -> TileSprite<'_> {
        let Some(tile) = self.tiles.get(&tile_id) else {
            return TileSprite::NONE;
        };
        TileSprite {
            atlas_image: tile.atlas_image.as_deref(),
            uv: tile.uv,
            sprite_key: tile.sprite_key.as_deref(),
        }
    }

    pub fn tile(&self, tile_id: TileId) -> Option<&TilesetTile> {
        self.tiles.get(&tile_id)
    }
}

#[derive(Debug, Error)]
pub enum TilesetLoadError {
    #[error("tileset file not found: {path}")]
    FileNotFound { path: PathBuf },
    #[error("failed to read tileset file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse tileset json in {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("tileset '{tileset}' has non-numeric tile id key '{key}'")]
    InvalidTileIdKey { tileset: String, key: String },
    #[error("tileset '{tileset}' contains a listed tile record with no id")]
    MissingTileId { tileset: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct TilesetDocument {
    pub(crate) tile_size: u32,
    tiles: TilesEncoding,
}

/// Tileset documents encode their tile collection either as an id-keyed
/// object or as a list of records that each carry an explicit `id`. Both
/// are normalized here; nothing past the loader sees the difference.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TilesEncoding {
    ById(HashMap<String, TileRecord>),
    Listed(Vec<TileRecord>),
}

#[derive(Debug, Deserialize)]
struct TileRecord {
    id: Option<TileId>,
    name: Option<String>,
    key: Option<String>,
    #[serde(default)]
    solid: bool,
    glyph: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    atlas_image: Option<String>,
    uv: Option<(u32, u32)>,
    sprite_key: Option<String>,
}

impl TileRecord {
    fn into_tile(self, tile_id: TileId) -> TilesetTile {
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .or(self.key)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("tile_{tile_id}"));
        let glyph = self
            .glyph
            .as_deref()
            .and_then(|glyph| glyph.chars().next())
            .unwrap_or(UNKNOWN_TILE_GLYPH);
        TilesetTile {
            tile_id,
            name,
            solid: self.solid,
            glyph,
            tags: self.tags,
            atlas_image: self.atlas_image,
            uv: self.uv,
            sprite_key: self.sprite_key,
        }
    }
}

impl TilesetDocument {
    pub(crate) fn into_tileset(self, tileset_id: &str) -> Result<Tileset, TilesetLoadError> {
        let mut tiles = HashMap::new();
        match self.tiles {
            TilesEncoding::ById(records) => {
                for (key, record) in records {
                    let tile_id =
                        key.parse::<TileId>()
                            .map_err(|_| TilesetLoadError::InvalidTileIdKey {
                                tileset: tileset_id.to_string(),
                                key,
                            })?;
                    tiles.insert(tile_id, record.into_tile(tile_id));
                }
            }
            TilesEncoding::Listed(records) => {
                for record in records {
                    let tile_id = record.id.ok_or_else(|| TilesetLoadError::MissingTileId {
                        tileset: tileset_id.to_string(),
                    })?;
                    tiles.insert(tile_id, record.into_tile(tile_id));
                }
            }
        }
        Ok(Tileset {
            tileset_id: tileset_id.to_string(),
            tile_size: self.tile_size,
            tiles,
        })
    }
}
