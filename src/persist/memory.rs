use super::{SnapshotStore, decode_snapshot, encode_snapshot};
use crate::sim::game::GameState;
use anyhow::Result;
use std::cell::RefCell;

/// In-process blob store holding the encoded snapshot, the same bytes a
/// [`super::FileStore`] would write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RefCell::new(Some(blob.into())),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<GameState>> {
        match self.blob.borrow().as_deref() {
            Some(content) => decode_snapshot(content),
            None => Ok(None),
        }
    }

    fn save(&self, state: &GameState) -> Result<()> {
        let encoded = encode_snapshot(state)?;
        *self.blob.borrow_mut() = Some(encoded);
        Ok(())
    }
}
