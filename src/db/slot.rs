use std::sync::Mutex;

use crate::error::{AppError, AppResult};

/// A single named slot holding the serialized interaction collection
///
/// Reads return the whole snapshot; writes overwrite it wholesale.
#[async_trait::async_trait]
pub trait InteractionSlot: Send + Sync {
    /// Current snapshot, `None` when the slot was never written
    async fn read(&self) -> AppResult<Option<String>>;

    /// Replaces the snapshot
    async fn write(&self, snapshot: String) -> AppResult<()>;

    /// Slot name for logging
    fn name(&self) -> &str;
}

/// Slot kept in process memory
#[derive(Debug, Default)]
pub struct MemorySlot {
    contents: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with raw contents, valid or not
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }
}

#[async_trait::async_trait]
impl InteractionSlot for MemorySlot {
    async fn read(&self) -> AppResult<Option<String>> {
        let contents = self
            .contents
            .lock()
            .map_err(|e| AppError::Internal(format!("Memory slot poisoned: {}", e)))?;
        Ok(contents.clone())
    }

    async fn write(&self, snapshot: String) -> AppResult<()> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|e| AppError::Internal(format!("Memory slot poisoned: {}", e)))?;
        *contents = Some(snapshot);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
