use crate::sim::game::GameState;
use anyhow::Result;
use log::debug;
use ron::ser::PrettyConfig;
use std::fs;
use std::path::Path;

use super::{STORAGE_NAME, Snapshot};

pub fn save_game(path: &Path, state: &GameState) -> Result<()> {
    let serialized = encode_snapshot(state)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serialized)?;
    debug!("snapshot written to {}", path.display());
    Ok(())
}

pub fn encode_snapshot(state: &GameState) -> Result<String> {
    let snapshot = Snapshot {
        version: STORAGE_NAME.to_string(),
        state: state.clone(),
    };
    let pretty = PrettyConfig::new();
    Ok(ron::ser::to_string_pretty(&snapshot, pretty)?)
}
