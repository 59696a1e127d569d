//! Default thread shown when no persisted state exists.

use super::{rehydrate, PersistedState};
use crate::domain::AppState;
use once_cell::sync::Lazy;

static SEED: Lazy<PersistedState> = Lazy::new(|| {
    serde_json::from_str(include_str!("seed.json")).expect("embedded seed data is valid")
});

/// The seed payload as it would sit in storage.
pub fn seed_payload() -> PersistedState {
    SEED.clone()
}

/// Seed thread with timestamps backfilled against `now`.
pub fn seed_state(now: i64) -> AppState {
    rehydrate(seed_payload(), now)
}
