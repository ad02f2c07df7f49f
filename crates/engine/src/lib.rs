use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod map;

pub use map::{
    check_trigger, get_facing_tile, interact, Entity, EntityKind, Facing, InteractionResult,
    MapData, MapLoadError, MapLoader, MapRenderer, OnEnter, PlayerState, TileId, TileLayer,
    TileRenderCommand, TileSprite, Tileset, TilesetLoadError, TilesetTile, UnknownLayerError,
    COLLISION_LAYER, EMPTY_TILE, LAYER_ORDER, MAP_FORMAT_TAG, UNKNOWN_TILE_GLYPH,
};

pub const ROOT_ENV_VAR: &str = "TWF_ROOT";

/// Resolved filesystem locations for one content root.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub maps_dir: PathBuf,
    pub tilesets_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid content root: {path}\n\
A valid root must contain data/maps and data/tilesets."
    )]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "Could not detect a content root by walking upward from {start_dir}\n\
Expected a directory containing data/maps and data/tilesets.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/those-who-fight\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Resolve the content root: `TWF_ROOT` when set, otherwise walk upward
/// from the executable directory, then from the working directory,
/// looking for a `data/maps` + `data/tilesets` pair.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let data_dir = root.join("data");
    Ok(AppPaths {
        maps_dir: data_dir.join("maps"),
        tilesets_dir: data_dir.join("tilesets"),
        root,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_content_root(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_content_root(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }
            if let Ok(cwd) = env::current_dir() {
                for candidate in cwd.ancestors() {
                    if is_content_root(candidate) {
                        return Ok(normalize_path(candidate));
                    }
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_content_root(path: &Path) -> bool {
    let data_dir = path.join("data");
    data_dir.join("maps").is_dir() && data_dir.join("tilesets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
