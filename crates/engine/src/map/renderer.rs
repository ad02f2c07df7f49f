use super::data::{MapData, TileLayer};
use super::tileset::{TileId, EMPTY_TILE};

/// Fixed compositing order. Later layers' non-empty tiles override
/// earlier ones at the same cell; backends must not reorder across
/// layers or the override semantics break.
pub const LAYER_ORDER: [&str; 4] = ["ground", "details", "structures", "overhead"];

const OVERHEAD_LAYER: &str = "overhead";

/// One renderer-agnostic blit: a tile id plus destination pixel
/// coordinates and, when the tileset provides them, the atlas sub-rect
/// to copy from. `source_rect` is `(x, y, w, h)` in atlas pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRenderCommand {
    pub tile_id: TileId,
    pub layer: &'static str,
    pub x: i32,
    pub y: i32,
    pub sprite_key: Option<String>,
    pub atlas_image: Option<String>,
    pub source_rect: Option<(u32, u32, u32, u32)>,
}

/// Read-only view deriving visual output from a loaded map.
pub struct MapRenderer<'a> {
    map: &'a MapData,
}

impl<'a> MapRenderer<'a> {
    pub fn new(map: &'a MapData) -> Self {
        Self { map }
    }

    fn ordered_layers(&self, include_overhead: bool) -> impl Iterator<Item = &'a TileLayer> {
        let map = self.map;
        LAYER_ORDER
            .iter()
            .filter(move |name| include_overhead || **name != OVERHEAD_LAYER)
            .filter_map(move |name| map.layers.get(*name))
            .filter(|layer| layer.visible)
    }

    /// Topmost non-empty tile id at `(x, y)` across visible layers in
    /// [`LAYER_ORDER`], or [`EMPTY_TILE`] when every layer is empty there
    /// or the cell is out of bounds.
    pub fn composite_tile(&self, x: i32, y: i32, include_overhead: bool) -> TileId {
        if !self.map.in_bounds(x, y) {
            return EMPTY_TILE;
        }
        let index = self.map.index(x, y);
        let mut tile_id = EMPTY_TILE;
        for layer in self.ordered_layers(include_overhead) {
            let candidate = layer.data[index];
            if candidate != EMPTY_TILE {
                tile_id = candidate;
            }
        }
        tile_id
    }

    /// Headless debug view: one string per viewport row, composited
    /// glyphs for in-bounds cells and spaces beyond the map edge.
    pub fn render_ascii(
        &self,
        view_x: i32,
        view_y: i32,
        view_w: i32,
        view_h: i32,
        include_overhead: bool,
    ) -> Vec<String> {
        let mut rows = Vec::with_capacity(view_h.max(0) as usize);
        for y in view_y..view_y.saturating_add(view_h) {
            let mut row = String::with_capacity(view_w.max(0) as usize);
            for x in view_x..view_x.saturating_add(view_w) {
                if !self.map.in_bounds(x, y) {
                    row.push(' ');
                    continue;
                }
                let tile_id = self.composite_tile(x, y, include_overhead);
                row.push(self.map.tileset.glyph(tile_id));
            }
            rows.push(row);
        }
        rows
    }

    /// Draw commands for every non-empty in-bounds cell of every visible
    /// layer in the viewport, ordered by layer (ground first) then scan
    /// order. That ordering is the stacking contract for backends.
    pub fn render_tiles(
        &self,
        view_x: i32,
        view_y: i32,
        view_w: i32,
        view_h: i32,
        include_overhead: bool,
    ) -> Vec<TileRenderCommand> {
        let mut commands = Vec::new();
        let tile_size = self.map.tile_size;
        for layer_name in LAYER_ORDER {
            if !include_overhead && layer_name == OVERHEAD_LAYER {
                continue;
            }
            let Some(layer) = self.map.layers.get(layer_name) else {
                continue;
            };
            if !layer.visible {
                continue;
            }
            for y in view_y..view_y.saturating_add(view_h) {
                for x in view_x..view_x.saturating_add(view_w) {
                    if !self.map.in_bounds(x, y) {
                        continue;
                    }
                    let tile_id = layer.data[self.map.index(x, y)];
                    if tile_id == EMPTY_TILE {
                        continue;
                    }
                    let sprite = self.map.tileset.sprite(tile_id);
                    let source_rect = match (sprite.atlas_image, sprite.uv) {
                        (Some(_), Some((u, v))) => {
                            Some((u * tile_size, v * tile_size, tile_size, tile_size))
                        }
                        _ => None,
                    };
                    commands.push(TileRenderCommand {
                        tile_id,
                        layer: layer_name,
                        x: x * tile_size as i32,
                        y: y * tile_size as i32,
                        sprite_key: sprite.sprite_key.map(ToString::to_string),
                        atlas_image: sprite.atlas_image.map(ToString::to_string),
                        source_rect,
                    });
                }
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::super::tileset::{Tileset, TilesetTile};
    use super::*;

    fn tile(tile_id: TileId, name: &str, glyph: char, sprite: bool) -> TilesetTile {
        TilesetTile {
            tile_id,
            name: name.to_string(),
            solid: false,
            glyph,
            tags: Vec::new(),
            atlas_image: sprite.then(|| "assets/atlas/overworld.png".to_string()),
            uv: sprite.then_some((tile_id, 0)),
            sprite_key: sprite.then(|| name.to_string()),
        }
    }

    fn test_tileset() -> Tileset {
        let mut tiles = HashMap::new();
        tiles.insert(1, tile(1, "grass", '.', true));
        tiles.insert(6, tile(6, "wall", '#', true));
        tiles.insert(7, tile(7, "roof", '^', false));
        Tileset {
            tileset_id: "test".to_string(),
            tile_size: 16,
            tiles,
        }
    }

    fn map_with_layers(width: u32, height: u32, layers: Vec<(&str, bool, Vec<TileId>)>) -> MapData {
        let layers = layers
            .into_iter()
            .map(|(name, visible, data)| {
                (
                    name.to_string(),
                    TileLayer {
                        name: name.to_string(),
                        data,
                        visible,
                    },
                )
            })
            .collect();
        MapData {
            name: "test_map".to_string(),
            width,
            height,
            tile_size: 16,
            tileset: test_tileset(),
            layers,
            entities: Vec::new(),
        }
    }

    #[test]
    fn composite_picks_topmost_non_empty_visible_layer() {
        let map = map_with_layers(
            1,
            1,
            vec![
                ("ground", true, vec![1]),
                ("structures", true, vec![6]),
                ("overhead", true, vec![7]),
            ],
        );
        let renderer = MapRenderer::new(&map);

        assert_eq!(renderer.composite_tile(0, 0, true), 7);
        assert_eq!(renderer.composite_tile(0, 0, false), 6);
    }

    #[test]
    fn empty_overhead_tile_does_not_hide_structures() {
        let map = map_with_layers(
            1,
            1,
            vec![("structures", true, vec![6]), ("overhead", true, vec![0])],
        );
        let renderer = MapRenderer::new(&map);

        assert_eq!(renderer.composite_tile(0, 0, true), 6);
    }

    #[test]
    fn invisible_layers_are_skipped_entirely() {
        let map = map_with_layers(
            1,
            1,
            vec![("ground", true, vec![1]), ("structures", false, vec![6])],
        );
        let renderer = MapRenderer::new(&map);

        assert_eq!(renderer.composite_tile(0, 0, true), 1);
        assert!(renderer
            .render_tiles(0, 0, 1, 1, true)
            .iter()
            .all(|command| command.layer != "structures"));
    }

    #[test]
    fn composite_out_of_bounds_is_empty() {
        let map = map_with_layers(1, 1, vec![("ground", true, vec![1])]);
        let renderer = MapRenderer::new(&map);

        assert_eq!(renderer.composite_tile(-1, 0, true), EMPTY_TILE);
        assert_eq!(renderer.composite_tile(0, 5, true), EMPTY_TILE);
    }

    #[test]
    fn ascii_view_pads_out_of_bounds_with_spaces() {
        let map = map_with_layers(2, 1, vec![("ground", true, vec![1, 6])]);
        let renderer = MapRenderer::new(&map);

        let rows = renderer.render_ascii(-1, 0, 4, 2, true);
        assert_eq!(rows, vec![" .# ".to_string(), "    ".to_string()]);
    }

    #[test]
    fn ascii_view_uses_unknown_glyph_for_ids_missing_from_tileset() {
        let map = map_with_layers(1, 1, vec![("ground", true, vec![42])]);
        let renderer = MapRenderer::new(&map);

        assert_eq!(renderer.render_ascii(0, 0, 1, 1, true), vec!["?".to_string()]);
    }

    #[test]
    fn draw_commands_ordered_by_layer_then_scan_order() {
        let map = map_with_layers(
            2,
            1,
            vec![("ground", true, vec![1, 1]), ("structures", true, vec![0, 6])],
        );
        let renderer = MapRenderer::new(&map);

        let commands = renderer.render_tiles(0, 0, 2, 1, true);
        let summary: Vec<(&str, i32, TileId)> = commands
            .iter()
            .map(|command| (command.layer, command.x, command.tile_id))
            .collect();
        assert_eq!(
            summary,
            vec![("ground", 0, 1), ("ground", 16, 1), ("structures", 16, 6)]
        );
    }

    #[test]
    fn draw_commands_carry_atlas_source_rect_in_pixels() {
        let map = map_with_layers(1, 1, vec![("structures", true, vec![6])]);
        let renderer = MapRenderer::new(&map);

        let commands = renderer.render_tiles(0, 0, 1, 1, true);
        assert_eq!(commands.len(), 1);
        let command = &commands[0];
        assert_eq!(command.sprite_key.as_deref(), Some("wall"));
        assert_eq!(
            command.atlas_image.as_deref(),
            Some("assets/atlas/overworld.png")
        );
        assert_eq!(command.source_rect, Some((96, 0, 16, 16)));
    }

    #[test]
    fn draw_commands_without_atlas_have_no_source_rect() {
        let map = map_with_layers(1, 1, vec![("overhead", true, vec![7])]);
        let renderer = MapRenderer::new(&map);

        let commands = renderer.render_tiles(0, 0, 1, 1, true);
        assert_eq!(commands.len(), 1);
        assert!(commands[0].source_rect.is_none());
        assert!(commands[0].atlas_image.is_none());
    }

    #[test]
    fn include_overhead_false_suppresses_overhead_commands() {
        let map = map_with_layers(
            1,
            1,
            vec![("ground", true, vec![1]), ("overhead", true, vec![7])],
        );
        let renderer = MapRenderer::new(&map);

        let commands = renderer.render_tiles(0, 0, 1, 1, false);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].layer, "ground");
    }
}
