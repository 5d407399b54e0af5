use crate::sim::game::GameState;
use anyhow::Result;
use log::info;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::{STORAGE_NAME, Snapshot};

pub fn load_game(path: &Path) -> Result<Option<GameState>> {
    match fs::read_to_string(path) {
        Ok(content) => decode_snapshot(&content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Parses a snapshot blob. A snapshot written under another storage name is
/// ignored so the caller starts from defaults.
pub fn decode_snapshot(content: &str) -> Result<Option<GameState>> {
    let snapshot: Snapshot = ron::from_str(content)?;
    if snapshot.version != STORAGE_NAME {
        info!(
            "ignoring snapshot version {} (expected {STORAGE_NAME})",
            snapshot.version
        );
        return Ok(None);
    }
    Ok(Some(snapshot.state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_game(&dir.path().join("absent.ron")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_snapshot("not ron at all").is_err());
    }
}
