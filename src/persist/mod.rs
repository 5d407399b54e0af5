//! Snapshot persistence. The whole store is written as one versioned RON blob and
//! read back wholesale; bumping [`STORAGE_NAME`] is the migration strategy.

mod load;
mod memory;
mod save;

use crate::sim::game::GameState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub use load::{decode_snapshot, load_game};
pub use memory::MemoryStore;
pub use save::{encode_snapshot, save_game};

/// File stem and embedded version name of the snapshot.
pub const STORAGE_NAME: &str = "seirei-garden-v1";

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: String,
    state: GameState,
}

/// Durable home of the store snapshot.
pub trait SnapshotStore {
    fn load(&self) -> Result<Option<GameState>>;
    fn save(&self, state: &GameState) -> Result<()>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Rc<T> {
    fn load(&self) -> Result<Option<GameState>> {
        (**self).load()
    }

    fn save(&self, state: &GameState) -> Result<()> {
        (**self).save(state)
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/<STORAGE_NAME>.ron`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{STORAGE_NAME}.ron")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<GameState>> {
        load_game(&self.path)
    }

    fn save(&self, state: &GameState) -> Result<()> {
        save_game(&self.path, state)
    }
}
