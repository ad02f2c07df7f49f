use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use engine::{resolve_app_paths, MapData, MapLoader, MapRenderer, TileRenderCommand, Tileset};

#[derive(Debug, Clone, Default)]
pub struct CommonOptions {
    pub root: Option<PathBuf>,
}

pub enum CommandKind {
    Validate {
        map_name: String,
    },
    Render {
        map_name: String,
        include_overhead: bool,
        view: Option<(i32, i32, i32, i32)>,
    },
    TilesetInfo {
        tileset_id: String,
    },
    Commands {
        map_name: String,
        include_overhead: bool,
    },
}

pub fn run<W: Write>(kind: CommandKind, opts: CommonOptions, stdout: &mut W) -> Result<(), String> {
    let loader = make_loader(&opts)?;
    match kind {
        CommandKind::Validate { map_name } => {
            let map = load_map(&loader, &map_name)?;
            writeln!(
                stdout,
                "ok: {} ({}x{} tiles, {} layers, {} entities, tileset {})",
                map.name,
                map.width,
                map.height,
                map.layers.len(),
                map.entities.len(),
                map.tileset.tileset_id
            )
            .map_err(|error| format!("failed to write output: {error}"))
        }
        CommandKind::Render {
            map_name,
            include_overhead,
            view,
        } => {
            let map = load_map(&loader, &map_name)?;
            let (view_x, view_y, view_w, view_h) =
                view.unwrap_or((0, 0, map.width as i32, map.height as i32));
            let renderer = MapRenderer::new(&map);
            for row in renderer.render_ascii(view_x, view_y, view_w, view_h, include_overhead) {
                writeln!(stdout, "{row}")
                    .map_err(|error| format!("failed to write output: {error}"))?;
            }
            Ok(())
        }
        CommandKind::TilesetInfo { tileset_id } => {
            let tileset = loader
                .load_tileset(&tileset_id)
                .map_err(|error| format_error_chain(&error))?;
            print_tileset(&tileset, stdout)
        }
        CommandKind::Commands {
            map_name,
            include_overhead,
        } => {
            let map = load_map(&loader, &map_name)?;
            let renderer = MapRenderer::new(&map);
            let commands = renderer.render_tiles(
                0,
                0,
                map.width as i32,
                map.height as i32,
                include_overhead,
            );
            for command in &commands {
                print_render_command(command, stdout)?;
            }
            writeln!(stdout, "{} draw commands", commands.len())
                .map_err(|error| format!("failed to write output: {error}"))
        }
    }
}

fn make_loader(opts: &CommonOptions) -> Result<MapLoader, String> {
    let root = match &opts.root {
        Some(root) => root.clone(),
        None => {
            resolve_app_paths()
                .map_err(|error| error.to_string())?
                .root
        }
    };
    Ok(MapLoader::new(root))
}

fn load_map(loader: &MapLoader, map_name: &str) -> Result<MapData, String> {
    loader
        .load_map(map_name)
        .map_err(|error| format_error_chain(&error))
}

fn print_tileset<W: Write>(tileset: &Tileset, stdout: &mut W) -> Result<(), String> {
    writeln!(
        stdout,
        "tileset {} (tile_size {}, {} tiles)",
        tileset.tileset_id,
        tileset.tile_size,
        tileset.tiles.len()
    )
    .map_err(|error| format!("failed to write output: {error}"))?;

    let mut tile_ids = tileset.tiles.keys().copied().collect::<Vec<_>>();
    tile_ids.sort_unstable();
    for tile_id in tile_ids {
        let tile = &tileset.tiles[&tile_id];
        let solid = if tile.solid { "solid" } else { "open" };
        writeln!(
            stdout,
            "  {:>4} {:16} '{}' {}{}",
            tile_id,
            tile.name,
            tile.glyph,
            solid,
            if tile.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", tile.tags.join(", "))
            }
        )
        .map_err(|error| format!("failed to write output: {error}"))?;
    }
    Ok(())
}

fn print_render_command<W: Write>(
    command: &TileRenderCommand,
    stdout: &mut W,
) -> Result<(), String> {
    let mut line = format!(
        "{} ({}, {}) tile {}",
        command.layer, command.x, command.y, command.tile_id
    );
    if let Some(sprite_key) = &command.sprite_key {
        line.push_str(&format!(" sprite {sprite_key}"));
    }
    if let (Some(atlas), Some((sx, sy, sw, sh))) = (&command.atlas_image, command.source_rect) {
        line.push_str(&format!(" atlas {atlas} rect ({sx}, {sy}, {sw}, {sh})"));
    }
    writeln!(stdout, "{line}").map_err(|error| format!("failed to write output: {error}"))
}

fn format_error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write_content(root: &TempDir) {
        let maps_dir = root.path().join("data").join("maps");
        let tilesets_dir = root.path().join("data").join("tilesets");
        fs::create_dir_all(&maps_dir).expect("maps dir");
        fs::create_dir_all(&tilesets_dir).expect("tilesets dir");

        let tileset = json!({
            "tile_size": 16,
            "tiles": {
                "1": {"name": "grass", "glyph": ".", "tags": ["outdoor"]},
                "6": {
                    "name": "wall", "glyph": "#", "solid": true,
                    "atlas_image": "atlas.png", "uv": [3, 0], "sprite_key": "wall"
                }
            }
        });
        fs::write(tilesets_dir.join("overworld.json"), tileset.to_string()).expect("tileset");

        let map = json!({
            "format": "TWF_MAP_V1",
            "name": "Yard",
            "tile_size": 16,
            "width": 2,
            "height": 2,
            "tileset": "overworld",
            "layers": [
                {"name": "ground", "type": "tile", "data": [1, 1, 1, 1]},
                {"name": "structures", "type": "tile", "data": [6, 0, 0, 0]}
            ],
            "entities": []
        });
        fs::write(maps_dir.join("Yard.json"), map.to_string()).expect("map");
    }

    fn options_for(root: &TempDir) -> CommonOptions {
        CommonOptions {
            root: Some(root.path().to_path_buf()),
        }
    }

    #[test]
    fn validate_reports_map_shape() {
        let root = TempDir::new().expect("temp");
        write_content(&root);

        let mut output = Vec::new();
        run(
            CommandKind::Validate {
                map_name: "Yard".to_string(),
            },
            options_for(&root),
            &mut output,
        )
        .expect("validate");

        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(
            text,
            "ok: Yard (2x2 tiles, 2 layers, 0 entities, tileset overworld)\n"
        );
    }

    #[test]
    fn validate_missing_map_reports_error_chain() {
        let root = TempDir::new().expect("temp");
        write_content(&root);

        let mut output = Vec::new();
        let error = run(
            CommandKind::Validate {
                map_name: "Nowhere".to_string(),
            },
            options_for(&root),
            &mut output,
        )
        .expect_err("missing map");
        assert!(error.contains("Nowhere"), "error should name the map: {error}");
    }

    #[test]
    fn render_dumps_full_map_ascii() {
        let root = TempDir::new().expect("temp");
        write_content(&root);

        let mut output = Vec::new();
        run(
            CommandKind::Render {
                map_name: "Yard".to_string(),
                include_overhead: true,
                view: None,
            },
            options_for(&root),
            &mut output,
        )
        .expect("render");

        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(text, "#.\n..\n");
    }

    #[test]
    fn tileset_info_lists_tiles_by_id() {
        let root = TempDir::new().expect("temp");
        write_content(&root);

        let mut output = Vec::new();
        run(
            CommandKind::TilesetInfo {
                tileset_id: "overworld".to_string(),
            },
            options_for(&root),
            &mut output,
        )
        .expect("tileset info");

        let text = String::from_utf8(output).expect("utf8");
        assert!(text.starts_with("tileset overworld (tile_size 16, 2 tiles)\n"));
        let grass_line = text.lines().nth(1).expect("grass line");
        assert!(grass_line.contains("grass"));
        assert!(grass_line.contains("[outdoor]"));
        let wall_line = text.lines().nth(2).expect("wall line");
        assert!(wall_line.contains("wall"));
        assert!(wall_line.contains("solid"));
    }

    #[test]
    fn commands_dump_includes_atlas_rects_and_count() {
        let root = TempDir::new().expect("temp");
        write_content(&root);

        let mut output = Vec::new();
        run(
            CommandKind::Commands {
                map_name: "Yard".to_string(),
                include_overhead: true,
            },
            options_for(&root),
            &mut output,
        )
        .expect("commands");

        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("ground (0, 0) tile 1"));
        assert!(text.contains("structures (0, 0) tile 6 sprite wall atlas atlas.png rect (48, 0, 16, 16)"));
        assert!(text.ends_with("5 draw commands\n"));
    }
}
