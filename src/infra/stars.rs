use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadStarsError {
    #[error("failed to read starred sessions: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse starred sessions: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SaveStarsError {
    #[error("failed to encode starred sessions: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write starred sessions: {0}")]
    Write(#[from] io::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StarsFile {
    version: u32,
    ids: Vec<String>,
}

pub fn stars_path(state_dir: &Path) -> PathBuf {
    state_dir.join("starred.json")
}

pub fn load_stars(state_dir: &Path) -> Result<BTreeSet<String>, LoadStarsError> {
    let path = stars_path(state_dir);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(error) => return Err(error.into()),
    };

    let file: StarsFile = serde_json::from_str(&raw)?;
    Ok(file
        .ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}

pub fn save_stars(state_dir: &Path, starred: &BTreeSet<String>) -> Result<(), SaveStarsError> {
    fs::create_dir_all(state_dir)?;

    let path = stars_path(state_dir);
    let tmp = path.with_extension("json.tmp");
    let file = StarsFile {
        version: 1,
        ids: starred.iter().cloned().collect(),
    };
    let text = serde_json::to_string_pretty(&file)?;
    fs::write(&tmp, text)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Flips membership of `id` and returns whether it is now starred.
pub fn toggle_star(starred: &mut BTreeSet<String>, id: &str) -> bool {
    if starred.remove(id) {
        false
    } else {
        starred.insert(id.to_string());
        true
    }
}
