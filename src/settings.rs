use crate::errors::{AppError, AppResult};
use crate::models::ConsoleSettings;
use std::path::Path;

pub fn load_settings(path: &Path) -> AppResult<ConsoleSettings> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "settings file missing; using defaults");
            return Ok(ConsoleSettings::default());
        }
        Err(error) => return Err(error.into()),
    };
    let settings = serde_json::from_str::<ConsoleSettings>(&raw)?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &ConsoleSettings) -> AppResult<()> {
    validate_settings(settings)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

/// Applies a partial JSON object over `current`.
pub fn merge_settings(current: &ConsoleSettings, update: serde_json::Value) -> AppResult<ConsoleSettings> {
    let mut merged = serde_json::to_value(current)?;
    merge_json(&mut merged, update);
    let settings: ConsoleSettings = serde_json::from_value(merged)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &ConsoleSettings) -> AppResult<()> {
    if settings.items_per_page == 0 {
        return Err(AppError::InvalidInput(
            "itemsPerPage must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn merge_json(target: &mut serde_json::Value, update: serde_json::Value) {
    match (target, update) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_json(target_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, update) => {
            *target = update;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_settings, merge_settings, save_settings};
    use crate::models::{ConfirmationPolicy, ConsoleSettings};
    use serde_json::json;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&dir.path().join("console.json")).expect("load");
        assert_eq!(settings, ConsoleSettings::default());
        assert_eq!(settings.loading_floor_ms, 1500);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("console.json");
        std::fs::write(&path, r#"{"itemsPerPage":25}"#).expect("write");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.items_per_page, 25);
        assert_eq!(settings.confirmation_policy, ConfirmationPolicy::Replace);
    }

    #[test]
    fn malformed_or_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("console.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(load_settings(&path).is_err());
        std::fs::write(&path, r#"{"itemsPerPage":0}"#).expect("write");
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn merge_applies_partial_update() {
        let merged = merge_settings(
            &ConsoleSettings::default(),
            json!({ "confirmationPolicy": "ignore" }),
        )
        .expect("merge");
        assert_eq!(merged.confirmation_policy, ConfirmationPolicy::Ignore);
        assert_eq!(merged.items_per_page, 10);
        assert!(merge_settings(&merged, json!({ "itemsPerPage": 0 })).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("console.json");
        let settings = ConsoleSettings {
            items_per_page: 5,
            ..ConsoleSettings::default()
        };
        save_settings(&path, &settings).expect("save");
        assert_eq!(load_settings(&path).expect("load"), settings);
    }
}
