use super::data::MapData;
use super::entity::EntityKind;

const DEFAULT_LOCKED_MESSAGE: &str = "It's locked.";
const DEFAULT_DIALOGUE_ID: &str = "...";

/// Entity types the explicit interact action resolves against.
const INTERACTABLE_TYPES: [&str; 3] = ["door", "npc", "sign"];
const TRIGGER_TYPES: [&str; 1] = ["trigger"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    North,
    South,
    East,
    West,
}

impl Facing {
    /// Unit step vector in tile coordinates (y grows southward).
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::East => (1, 0),
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "west" => Some(Self::West),
            "east" => Some(Self::East),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::West => "west",
            Self::East => "east",
        }
    }
}

/// Ephemeral player state owned by the driving loop; the engine only
/// ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub x: i32,
    pub y: i32,
    pub facing: Facing,
}

/// Outcome of an interact or trigger check. A door transition carries
/// the target map and spawn id; everything else is at most a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionResult {
    pub message: Option<String>,
    pub transition_map: Option<String>,
    pub transition_spawn: Option<String>,
}

/// The tile one step ahead of the player in their facing direction.
pub fn get_facing_tile(player: &PlayerState) -> (i32, i32) {
    let (dx, dy) = player.facing.offset();
    (player.x + dx, player.y + dy)
}

/// Resolve an explicit interact action against the facing tile. Doors
/// either refuse with their locked message or hand back a transition;
/// npcs yield a dialogue key stub; signs yield their text.
pub fn interact(map: &MapData, player: &PlayerState) -> InteractionResult {
    let (target_x, target_y) = get_facing_tile(player);
    let Some(entity) = map.get_entity_at(target_x, target_y, Some(&INTERACTABLE_TYPES)) else {
        return InteractionResult::default();
    };

    match &entity.kind {
        EntityKind::Door {
            locked,
            locked_message,
            target_map,
            target_spawn,
        } => {
            if *locked {
                InteractionResult {
                    message: Some(
                        locked_message
                            .clone()
                            .unwrap_or_else(|| DEFAULT_LOCKED_MESSAGE.to_string()),
                    ),
                    ..InteractionResult::default()
                }
            } else {
                InteractionResult {
                    message: None,
                    transition_map: target_map.clone(),
                    transition_spawn: target_spawn.clone(),
                }
            }
        }
        EntityKind::Npc { dialogue_id } => {
            let dialogue_id = dialogue_id.as_deref().unwrap_or(DEFAULT_DIALOGUE_ID);
            InteractionResult {
                message: Some(format!("NPC says ({dialogue_id}).")),
                ..InteractionResult::default()
            }
        }
        EntityKind::Sign { text } => InteractionResult {
            message: Some(text.clone().unwrap_or_default()),
            ..InteractionResult::default()
        },
        // Unreachable given the type filter above.
        _ => InteractionResult::default(),
    }
}

/// Triggers fire from the player's current tile, not the facing tile.
/// Intended to be called once per committed step, not every frame.
pub fn check_trigger(map: &MapData, player: &PlayerState) -> Option<InteractionResult> {
    let entity = map.get_entity_at(player.x, player.y, Some(&TRIGGER_TYPES))?;
    let EntityKind::Trigger {
        on_enter: Some(on_enter),
    } = &entity.kind
    else {
        return None;
    };
    if on_enter.action != "message" {
        return None;
    }
    Some(InteractionResult {
        message: Some(on_enter.text.clone()),
        ..InteractionResult::default()
    })
}
