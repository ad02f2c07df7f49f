use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use engine::{
    check_trigger, interact, Entity, EntityKind, Facing, MapData, MapLoader, MapRenderer,
    PlayerState,
};
use tracing::{debug, info};

use crate::config::SessionConfig;

const PLAYER_GLYPH: char = '@';

type SessionResult<T> = Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Move(Facing),
    Interact,
    Quit,
    Unknown,
}

pub(crate) fn parse_command(line: &str) -> Command {
    match line.trim().to_lowercase().as_str() {
        "w" => Command::Move(Facing::North),
        "s" => Command::Move(Facing::South),
        "a" => Command::Move(Facing::West),
        "d" => Command::Move(Facing::East),
        "e" => Command::Interact,
        "q" => Command::Quit,
        _ => Command::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Blocked,
    Moved { trigger_message: Option<String> },
}

/// One play session: the active map, the player, and a cache of maps
/// already visited. Loaded maps are immutable, so revisiting a map
/// through a door reuses the cached copy.
pub(crate) struct GameSession {
    loader: MapLoader,
    cache: HashMap<String, Rc<MapData>>,
    current: Rc<MapData>,
    player: PlayerState,
    view_w: i32,
    view_h: i32,
}

impl GameSession {
    pub(crate) fn new(loader: MapLoader, config: &SessionConfig) -> SessionResult<Self> {
        let map = loader
            .load_map(&config.start_map)
            .map(Rc::new)
            .map_err(|error| format_error_chain(&error))?;
        let player = place_at_spawn(&map, Some(&config.start_spawn), Facing::North)?;
        info!(map = %map.name, "entered_map");

        let mut cache = HashMap::new();
        cache.insert(config.start_map.clone(), Rc::clone(&map));
        Ok(Self {
            loader,
            cache,
            current: map,
            player,
            view_w: config.view_width,
            view_h: config.view_height,
        })
    }

    pub(crate) fn map(&self) -> &MapData {
        &self.current
    }

    pub(crate) fn player(&self) -> PlayerState {
        self.player
    }

    fn load_cached(&mut self, map_name: &str) -> SessionResult<Rc<MapData>> {
        if let Some(map) = self.cache.get(map_name) {
            debug!(map = %map_name, "map_cache_hit");
            return Ok(Rc::clone(map));
        }
        let map = self
            .loader
            .load_map(map_name)
            .map(Rc::new)
            .map_err(|error| format_error_chain(&error))?;
        self.cache.insert(map_name.to_string(), Rc::clone(&map));
        Ok(map)
    }

    /// Switch the active map and place the player at the named spawn,
    /// falling back to the map's first spawn when the id is absent or
    /// not found. Facing comes from the spawn's `facing` prop.
    fn enter_map(
        &mut self,
        map_name: &str,
        spawn_id: Option<&str>,
        fallback_facing: Facing,
    ) -> SessionResult<()> {
        let map = self.load_cached(map_name)?;
        self.player = place_at_spawn(&map, spawn_id, fallback_facing)?;
        info!(map = %map.name, "entered_map");
        self.current = map;
        Ok(())
    }

    /// Turn toward `facing` and attempt one tile step. Triggers are
    /// checked only after a committed move, so standing on one does not
    /// repeat its message.
    pub(crate) fn step(&mut self, facing: Facing) -> StepOutcome {
        self.player.facing = facing;
        let (dx, dy) = facing.offset();
        let next_x = self.player.x + dx;
        let next_y = self.player.y + dy;
        if self.current.is_solid(next_x, next_y) {
            return StepOutcome::Blocked;
        }
        self.player.x = next_x;
        self.player.y = next_y;
        let trigger_message =
            check_trigger(&self.current, &self.player).and_then(|result| result.message);
        StepOutcome::Moved { trigger_message }
    }

    /// Resolve an explicit interact action; door transitions load the
    /// target map and relocate the player immediately.
    pub(crate) fn interact(&mut self) -> SessionResult<Option<String>> {
        let result = interact(&self.current, &self.player);
        if let Some(target_map) = result.transition_map {
            self.enter_map(&target_map, result.transition_spawn.as_deref(), Facing::South)?;
        }
        Ok(result.message)
    }

    /// ASCII viewport centered on the player, with entity markers
    /// (`N`pc, `D`oor, `S`ign) and the player glyph layered on top.
    pub(crate) fn render_view(&self) -> Vec<String> {
        let view_x = (self.current.width as i32 - self.view_w)
            .min(self.player.x - self.view_w / 2)
            .max(0);
        let view_y = (self.current.height as i32 - self.view_h)
            .min(self.player.y - self.view_h / 2)
            .max(0);

        let renderer = MapRenderer::new(&self.current);
        let rows = renderer.render_ascii(view_x, view_y, self.view_w, self.view_h, true);
        let mut overlay: Vec<Vec<char>> = rows.iter().map(|row| row.chars().collect()).collect();

        for entity in &self.current.entities {
            let marker = match entity.kind {
                EntityKind::Npc { .. } => 'N',
                EntityKind::Door { .. } => 'D',
                EntityKind::Sign { .. } => 'S',
                _ => continue,
            };
            plot(&mut overlay, entity.x - view_x, entity.y - view_y, marker);
        }
        plot(
            &mut overlay,
            self.player.x - view_x,
            self.player.y - view_y,
            PLAYER_GLYPH,
        );

        overlay.into_iter().map(|row| row.into_iter().collect()).collect()
    }

    pub(crate) fn status_line(&self) -> String {
        format!(
            "Map: {} | Position: ({}, {}) Facing: {}",
            self.current.name,
            self.player.x,
            self.player.y,
            self.player.facing.as_token()
        )
    }
}

fn plot(overlay: &mut [Vec<char>], x: i32, y: i32, glyph: char) {
    if y < 0 || x < 0 {
        return;
    }
    let Some(row) = overlay.get_mut(y as usize) else {
        return;
    };
    if let Some(cell) = row.get_mut(x as usize) {
        *cell = glyph;
    }
}

/// Pick the named spawn, or the map's first spawn when the id is
/// absent or stale, and derive the player state from it.
fn place_at_spawn(
    map: &MapData,
    spawn_id: Option<&str>,
    fallback_facing: Facing,
) -> SessionResult<PlayerState> {
    let spawn = find_spawn(map, spawn_id)
        .ok_or_else(|| format!("map '{}' has no spawn entities", map.name))?;
    let facing = match &spawn.kind {
        EntityKind::Spawn {
            facing: Some(facing),
        } => *facing,
        _ => fallback_facing,
    };
    Ok(PlayerState {
        x: spawn.x,
        y: spawn.y,
        facing,
    })
}

fn find_spawn<'a>(map: &'a MapData, spawn_id: Option<&str>) -> Option<&'a Entity> {
    if let Some(id) = spawn_id {
        if let Some(spawn) = map.get_entities_by_type("spawn").find(|entity| entity.id == id) {
            return Some(spawn);
        }
    }
    map.get_entities_by_type("spawn").next()
}

fn format_error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub(crate) fn run_session<R: BufRead, W: Write>(
    session: &mut GameSession,
    input: R,
    output: &mut W,
) -> io::Result<()> {
    writeln!(output, "Controls: WASD move, E interact, Q quit.")?;
    let mut lines = input.lines();
    loop {
        for row in session.render_view() {
            writeln!(output, "{row}")?;
        }
        writeln!(output, "{}", session.status_line())?;
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        match parse_command(&line?) {
            Command::Quit => break,
            Command::Move(facing) => match session.step(facing) {
                StepOutcome::Blocked => writeln!(output, "Bump! That's solid.")?,
                StepOutcome::Moved {
                    trigger_message: Some(message),
                } => writeln!(output, "{message}")?,
                StepOutcome::Moved {
                    trigger_message: None,
                } => {}
            },
            Command::Interact => match session.interact() {
                Ok(Some(message)) => writeln!(output, "{message}")?,
                Ok(None) => {}
                Err(error) => writeln!(output, "{error}")?,
            },
            Command::Unknown => writeln!(output, "Unknown command.")?,
        }
    }
    Ok(())
}
