use std::fs;
use std::path::Path;

use serde::Deserialize;

pub(crate) const CONFIG_FILE_NAME: &str = "twf.config.json";

const DEFAULT_START_MAP: &str = "Hearthvale_Town";
const DEFAULT_START_SPAWN: &str = "spawn_south_gate";
const DEFAULT_VIEW_WIDTH: i32 = 40;
const DEFAULT_VIEW_HEIGHT: i32 = 22;

/// Optional session settings read from `twf.config.json` at the content
/// root. A missing file means defaults; a malformed file is an error
/// naming the offending field path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct SessionConfig {
    pub(crate) start_map: String,
    pub(crate) start_spawn: String,
    pub(crate) view_width: i32,
    pub(crate) view_height: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_map: DEFAULT_START_MAP.to_string(),
            start_spawn: DEFAULT_START_SPAWN.to_string(),
            view_width: DEFAULT_VIEW_WIDTH,
            view_height: DEFAULT_VIEW_HEIGHT,
        }
    }
}

pub(crate) fn load_session_config(path: &Path) -> Result<SessionConfig, String> {
    if !path.exists() {
        return Ok(SessionConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("failed to read session config {}: {error}", path.display()))?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize::<_, SessionConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => Err(format!(
            "invalid session config {} at {}: {}",
            path.display(),
            error.path(),
            error.inner()
        )),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let temp = TempDir::new().expect("temp");
        let config = load_session_config(&temp.path().join(CONFIG_FILE_NAME)).expect("config");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{"start_map": "Hearthvale_Inn", "view_width": 20}"#,
        )
        .expect("write config");

        let config = load_session_config(&path).expect("config");
        assert_eq!(config.start_map, "Hearthvale_Inn");
        assert_eq!(config.view_width, 20);
        assert_eq!(config.start_spawn, SessionConfig::default().start_spawn);
    }

    #[test]
    fn malformed_config_reports_field_path() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"view_width": "wide"}"#).expect("write config");

        let error = load_session_config(&path).expect_err("bad config");
        assert!(error.contains("view_width"), "error should name the field: {error}");
    }
}
