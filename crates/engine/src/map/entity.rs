use serde_json::{Map, Value};

use super::interactions::Facing;

/// A placed map object covering a `w x h` rectangle of tiles anchored at
/// its top-left tile. Constructed once at map load; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub kind: EntityKind,
}

impl Entity {
    pub fn covers_tile(&self, tile_x: i32, tile_y: i32) -> bool {
        self.x <= tile_x
            && tile_x < self.x + self.w
            && self.y <= tile_y
            && tile_y < self.y + self.h
    }

    /// The document-level `type` tag. Unknown kinds report the tag they
    /// were loaded with, so type filters keep working on data the engine
    /// does not otherwise understand.
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }
}

/// Typed view over the document's open `props` bag. Entity types the
/// engine does not recognize load as [`EntityKind::Unknown`] instead of
/// failing, so forward-compatible map data stays loadable.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Door {
        locked: bool,
        locked_message: Option<String>,
        target_map: Option<String>,
        target_spawn: Option<String>,
    },
    Npc {
        dialogue_id: Option<String>,
    },
    Sign {
        text: Option<String>,
    },
    Trigger {
        on_enter: Option<OnEnter>,
    },
    Spawn {
        facing: Option<Facing>,
    },
    Unknown {
        type_name: String,
        raw_props: Map<String, Value>,
    },
}

/// Effect fired when the player steps onto a trigger's coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct OnEnter {
    pub action: String,
    pub text: String,
}

impl EntityKind {
    pub(crate) fn from_props(type_name: &str, props: &Map<String, Value>) -> Self {
        match type_name {
            "door" => Self::Door {
                locked: props.get("locked").map(value_is_truthy).unwrap_or(false),
                locked_message: string_prop(props, "locked_message"),
                target_map: string_prop(props, "target_map"),
                target_spawn: string_prop(props, "target_spawn"),
            },
            "npc" => Self::Npc {
                dialogue_id: string_prop(props, "dialogue_id"),
            },
            "sign" => Self::Sign {
                text: string_prop(props, "text"),
            },
            "trigger" => Self::Trigger {
                on_enter: on_enter_prop(props),
            },
            "spawn" => Self::Spawn {
                facing: string_prop(props, "facing")
                    .as_deref()
                    .and_then(Facing::from_token),
            },
            other => Self::Unknown {
                type_name: other.to_string(),
                raw_props: props.clone(),
            },
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Door { .. } => "door",
            Self::Npc { .. } => "npc",
            Self::Sign { .. } => "sign",
            Self::Trigger { .. } => "trigger",
            Self::Spawn { .. } => "spawn",
            Self::Unknown { type_name, .. } => type_name,
        }
    }
}

fn string_prop(props: &Map<String, Value>, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn on_enter_prop(props: &Map<String, Value>) -> Option<OnEnter> {
    let on_enter = props.get("on_enter")?.as_object()?;
    Some(OnEnter {
        action: on_enter
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        text: on_enter
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Truthiness of a props value, matching the map format's loose booleans:
/// `false`, `null`, `0`, `""`, `[]`, and `{}` all read as false.
fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
