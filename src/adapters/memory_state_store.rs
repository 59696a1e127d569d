//! In-memory implementation of the StateStore port.
//! Backs `--ephemeral` sessions and unit tests; nothing outlives the process.

use crate::ports::StateStore;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryStateStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| anyhow!("memory state store lock poisoned"))
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        Ok(self.slots()?.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        self.slots()?.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<()> {
        self.slots()?.remove(slot);
        Ok(())
    }
}
