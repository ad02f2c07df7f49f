use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use super::data::{MapData, TileLayer};
use super::entity::{Entity, EntityKind};
use super::tileset::{TileId, Tileset, TilesetDocument, TilesetLoadError};

/// Format-version guard. Future map format revisions must introduce a
/// new tag rather than mutate this one.
pub const MAP_FORMAT_TAG: &str = "TWF_MAP_V1";

const REQUIRED_FIELDS: [&str; 8] = [
    "format", "name", "tile_size", "width", "height", "tileset", "layers", "entities",
];
const TILE_LAYER_TYPE: &str = "tile";

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("map file not found: {path}")]
    MapFileNotFound { path: PathBuf },
    #[error("failed to read map file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse map json in {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("map document {path} is not a json object")]
    NotAnObject { path: PathBuf },
    #[error("map '{map}' is missing required field '{field}'")]
    MissingField { map: String, field: &'static str },
    #[error("map '{map}' has unsupported format tag '{format}' (expected '{MAP_FORMAT_TAG}')")]
    UnsupportedFormat { map: String, format: String },
    #[error("failed to load tileset '{tileset}' referenced by map '{map}'")]
    Tileset {
        map: String,
        tileset: String,
        #[source]
        source: TilesetLoadError,
    },
    #[error(
        "map '{map}' declares tile_size {map_tile_size} but tileset '{tileset}' declares {tileset_tile_size}"
    )]
    TileSizeMismatch {
        map: String,
        tileset: String,
        map_tile_size: u32,
        tileset_tile_size: u32,
    },
    #[error("layer '{layer}' in map '{map}' has unsupported type '{layer_type}' (only '{TILE_LAYER_TYPE}' layers are supported)")]
    UnsupportedLayerType {
        map: String,
        layer: String,
        layer_type: String,
    },
    #[error("map '{map}' contains a layer with no name")]
    MissingLayerName { map: String },
    #[error("layer '{layer}' in map '{map}' has {actual} tiles; expected {expected}")]
    LayerSizeMismatch {
        map: String,
        layer: String,
        actual: usize,
        expected: usize,
    },
    #[error("map '{map}' contains an entity with no id")]
    MissingEntityId { map: String },
    #[error("duplicate entity id '{id}' in map '{map}'")]
    DuplicateEntityId { map: String, id: String },
}

#[derive(Debug, Deserialize)]
struct MapDocument {
    name: String,
    tile_size: u32,
    width: u32,
    height: u32,
    tileset: String,
    layers: Vec<LayerDocument>,
    entities: Vec<EntityDocument>,
}

#[derive(Debug, Deserialize)]
struct LayerDocument {
    name: Option<String>,
    #[serde(rename = "type")]
    layer_type: Option<String>,
    #[serde(default)]
    data: Vec<TileId>,
    #[serde(default = "default_visible")]
    visible: bool,
}

#[derive(Debug, Deserialize)]
struct EntityDocument {
    id: Option<String>,
    #[serde(rename = "type")]
    entity_type: String,
    x: i32,
    y: i32,
    #[serde(default = "default_extent")]
    w: i32,
    #[serde(default = "default_extent")]
    h: i32,
    #[serde(default)]
    props: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

fn default_extent() -> i32 {
    1
}

/// Loads and validates map and tileset documents from a content root
/// using the filesystem convention `data/maps/<name>.json` and
/// `data/tilesets/<id>.json`. Pure transformation, no caching; callers
/// that want a map cache layer it on top.
#[derive(Debug, Clone)]
pub struct MapLoader {
    root: PathBuf,
}

impl MapLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn map_path(&self, map_name: &str) -> PathBuf {
        self.root
            .join("data")
            .join("maps")
            .join(format!("{map_name}.json"))
    }

    pub fn tileset_path(&self, tileset_id: &str) -> PathBuf {
        self.root
            .join("data")
            .join("tilesets")
            .join(format!("{tileset_id}.json"))
    }

    pub fn load_tileset(&self, tileset_id: &str) -> Result<Tileset, TilesetLoadError> {
        let path = self.tileset_path(tileset_id);
        if !path.exists() {
            return Err(TilesetLoadError::FileNotFound { path });
        }
        let raw = fs::read_to_string(&path).map_err(|source| TilesetLoadError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let document: TilesetDocument =
            serde_json::from_str(&raw).map_err(|source| TilesetLoadError::ParseJson {
                path: path.clone(),
                source,
            })?;
        let tileset = document.into_tileset(tileset_id)?;
        debug!(
            tileset = %tileset_id,
            tile_size = tileset.tile_size,
            tile_count = tileset.tiles.len(),
            "tileset_loaded"
        );
        Ok(tileset)
    }

    pub fn load_map(&self, map_name: &str) -> Result<MapData, MapLoadError> {
        let path = self.map_path(map_name);
        if !path.exists() {
            return Err(MapLoadError::MapFileNotFound { path });
        }
        let raw = fs::read_to_string(&path).map_err(|source| MapLoadError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|source| MapLoadError::ParseJson {
                path: path.clone(),
                source,
            })?;

        let fields = value
            .as_object()
            .ok_or_else(|| MapLoadError::NotAnObject { path: path.clone() })?;
        for field in REQUIRED_FIELDS {
            if !fields.contains_key(field) {
                return Err(MapLoadError::MissingField {
                    map: map_name.to_string(),
                    field,
                });
            }
        }
        let format = fields
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if format != MAP_FORMAT_TAG {
            return Err(MapLoadError::UnsupportedFormat {
                map: map_name.to_string(),
                format: format.to_string(),
            });
        }

        let document: MapDocument =
            serde_json::from_value(value).map_err(|source| MapLoadError::ParseJson {
                path: path.clone(),
                source,
            })?;

        let tileset =
            self.load_tileset(&document.tileset)
                .map_err(|source| MapLoadError::Tileset {
                    map: map_name.to_string(),
                    tileset: document.tileset.clone(),
                    source,
                })?;
        if document.tile_size != tileset.tile_size {
            return Err(MapLoadError::TileSizeMismatch {
                map: map_name.to_string(),
                tileset: document.tileset.clone(),
                map_tile_size: document.tile_size,
                tileset_tile_size: tileset.tile_size,
            });
        }

        let layers = build_layers(map_name, &document)?;
        let entities = build_entities(map_name, document.entities)?;

        info!(
            map = %document.name,
            width = document.width,
            height = document.height,
            layer_count = layers.len(),
            entity_count = entities.len(),
            "map_loaded"
        );
        Ok(MapData {
            name: document.name,
            width: document.width,
            height: document.height,
            tile_size: document.tile_size,
            tileset,
            layers,
            entities,
        })
    }
}

fn build_layers(
    map_name: &str,
    document: &MapDocument,
) -> Result<HashMap<String, TileLayer>, MapLoadError> {
    let expected = document.width as usize * document.height as usize;
    let mut layers = HashMap::with_capacity(document.layers.len());
    for layer in &document.layers {
        if layer.layer_type.as_deref() != Some(TILE_LAYER_TYPE) {
            return Err(MapLoadError::UnsupportedLayerType {
                map: map_name.to_string(),
                layer: layer.name.clone().unwrap_or_default(),
                layer_type: layer.layer_type.clone().unwrap_or_default(),
            });
        }
        let name = match layer.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(MapLoadError::MissingLayerName {
                    map: map_name.to_string(),
                })
            }
        };
        if layer.data.len() != expected {
            return Err(MapLoadError::LayerSizeMismatch {
                map: map_name.to_string(),
                layer: name,
                actual: layer.data.len(),
                expected,
            });
        }
        layers.insert(
            name.clone(),
            TileLayer {
                name,
                data: layer.data.clone(),
                visible: layer.visible,
            },
        );
    }
    Ok(layers)
}

fn build_entities(
    map_name: &str,
    documents: Vec<EntityDocument>,
) -> Result<Vec<Entity>, MapLoadError> {
    let mut entities = Vec::with_capacity(documents.len());
    let mut seen_ids = HashSet::new();
    for document in documents {
        let id = match document.id {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(MapLoadError::MissingEntityId {
                    map: map_name.to_string(),
                })
            }
        };
        if !seen_ids.insert(id.clone()) {
            return Err(MapLoadError::DuplicateEntityId {
                map: map_name.to_string(),
                id,
            });
        }
        let kind = EntityKind::from_props(&document.entity_type, &document.props);
        entities.push(Entity {
            id,
            x: document.x,
            y: document.y,
            w: document.w,
            h: document.h,
            kind,
        });
    }
    Ok(entities)
}
