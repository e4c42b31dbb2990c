use crate::domain::ThemeState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const THEME_MODE_KEY: &str = "theme-mode";
pub const THEME_PALETTE_KEY: &str = "theme-palette";

/// String key-value preferences backed by one JSON file. Every `set` is
/// written through immediately.
#[derive(Clone, Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum LoadPreferencesError {
    #[error("failed to read preferences: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse preferences: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SavePreferencesError {
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write preferences: {0}")]
    Write(#[from] io::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PreferencesFile {
    version: u32,
    values: BTreeMap<String, String>,
}

fn preferences_path(state_dir: &Path) -> PathBuf {
    state_dir.join("preferences.json")
}

impl PreferenceStore {
    /// A store with nowhere to write. Used when no state directory exists.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn load(state_dir: &Path) -> Result<Self, LoadPreferencesError> {
        let path = preferences_path(state_dir);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(Self {
                    path: Some(path),
                    values: BTreeMap::new(),
                });
            }
            Err(error) => return Err(error.into()),
        };

        let file: PreferencesFile = serde_json::from_str(&raw)?;
        Ok(Self {
            path: Some(path),
            values: file.values,
        })
    }

    /// Falls back to an empty store bound to the same file when the existing
    /// one can't be read, so the next write replaces it.
    pub fn load_or_reset(state_dir: &Path) -> (Self, Option<LoadPreferencesError>) {
        match Self::load(state_dir) {
            Ok(store) => (store, None),
            Err(error) => (
                Self {
                    path: Some(preferences_path(state_dir)),
                    values: BTreeMap::new(),
                },
                Some(error),
            ),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|value| value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SavePreferencesError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn save(&self) -> Result<(), SavePreferencesError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp = path.with_extension("json.tmp");
        let file = PreferencesFile {
            version: 1,
            values: self.values.clone(),
        };
        let text = serde_json::to_string_pretty(&file)?;
        fs::write(&tmp, text)?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    pub fn theme(&self) -> ThemeState {
        ThemeState::from_stored(self.get(THEME_MODE_KEY), self.get(THEME_PALETTE_KEY))
    }

    pub fn set_theme(&mut self, theme: ThemeState) -> Result<(), SavePreferencesError> {
        self.values
            .insert(THEME_MODE_KEY.to_string(), theme.mode.as_str().to_string());
        self.set(THEME_PALETTE_KEY, theme.palette.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ThemeMode, ThemePalette};
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_default_theme() {
        let dir = tempdir().expect("tempdir");
        let store = PreferenceStore::load(dir.path()).expect("load");
        assert_eq!(store.theme(), ThemeState::default());
    }

    #[test]
    fn theme_round_trips_through_disk() {
        let dir = tempdir().expect("tempdir");
        let mut store = PreferenceStore::load(dir.path()).expect("load");
        let theme = ThemeState {
            mode: ThemeMode::Light,
            palette: ThemePalette::Nord,
        };
        store.set_theme(theme).expect("save");

        let reloaded = PreferenceStore::load(dir.path()).expect("reload");
        assert_eq!(reloaded.theme(), theme);
        assert_eq!(reloaded.get(THEME_MODE_KEY), Some("light"));
        assert_eq!(reloaded.get(THEME_PALETTE_KEY), Some("nord"));
    }

    #[test]
    fn set_writes_through_and_creates_state_dir() {
        let dir = tempdir().expect("tempdir");
        let state = dir.path().join("nested").join("state");
        let mut store = PreferenceStore::load(&state).expect("load");
        store.set("custom", "value").expect("set");

        let raw = fs::read_to_string(state.join("preferences.json")).expect("read");
        assert!(raw.contains("\"custom\""));
        assert!(!state.join("preferences.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_resets_to_defaults() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("preferences.json"), "{oops").expect("write");

        assert!(PreferenceStore::load(dir.path()).is_err());
        let (mut store, error) = PreferenceStore::load_or_reset(dir.path());
        assert!(error.is_some());
        assert_eq!(store.theme(), ThemeState::default());

        store.set_theme(ThemeState::default()).expect("save");
        assert!(PreferenceStore::load(dir.path()).is_ok());
    }

    #[test]
    fn in_memory_store_never_touches_disk() {
        let mut store = PreferenceStore::in_memory();
        store.set(THEME_MODE_KEY, "light").expect("set");
        assert_eq!(store.theme().mode, ThemeMode::Light);
    }
}
