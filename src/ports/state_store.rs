//! Slot storage port (trait).
//! A keyed string store in the spirit of browser local storage: one named slot
//! holds one serialized payload.

use anyhow::Result;

/// Port for persisting serialized application state.
/// Implementations may use SQLite, an in-memory map, or test fakes.
pub trait StateStore: Send + Sync {
    /// Read the payload stored under `slot`, if any.
    fn get(&self, slot: &str) -> Result<Option<String>>;

    /// Replace the payload stored under `slot`.
    fn set(&self, slot: &str, value: &str) -> Result<()>;

    /// Forget `slot`. Removing an empty slot is not an error.
    fn remove(&self, slot: &str) -> Result<()>;
}
