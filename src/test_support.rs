//! Shared fixtures for unit tests.

use crate::adapters::MemoryStateStore;
use crate::domain::{AvatarRefs, User};
use crate::persistence::{seed, Persistence};
use crate::ports::Clock;
use crate::store::Store;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub const NOW: i64 = 1_700_000_000_000;

/// Clock that only moves when told to.
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn user(name: &str) -> User {
    User {
        username: name.to_string(),
        avatar: AvatarRefs {
            raster: format!("./images/avatars/image-{}.png", name),
            vector: format!("./images/avatars/image-{}.webp", name),
        },
    }
}

/// Store over the seed thread with no persistence attached.
pub fn seeded_store() -> Store {
    let clock = ManualClock::new(NOW);
    let state = seed::seed_state(clock.now_ms());
    Store::new(state, clock, None)
}

/// Store over the seed thread persisting into a fresh in-memory slot store.
pub fn persisted_store() -> (Store, Arc<MemoryStateStore>, Arc<ManualClock>) {
    let clock = ManualClock::new(NOW);
    let slots = Arc::new(MemoryStateStore::new());
    let persistence = Persistence::new(slots.clone(), "comment-state");
    let store = Store::load(clock.clone(), Some(persistence));
    (store, slots, clock)
}
