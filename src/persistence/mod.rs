//! Persistence adapter: moves the durable subset of [`AppState`] in and out of a
//! storage slot.
//!
//! Only comments, the current user and the vote ledger are written. `next_id` and
//! the display-text caches are volatile and are re-derived on load, so a slot
//! edited by hand (or written by an older build) heals itself.

pub mod seed;

use crate::domain::{AppState, Comment, CommentId, DisplayTextCache, User, VoteDirection};
use crate::domain::tree;
use crate::ports::StateStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_SLOT: &str = "comment-state";

/// Version written alongside the payload. Bump when the stored shape changes.
pub const STORAGE_VERSION: u32 = 0;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage slot `{slot}` unavailable: {cause:#}")]
    Storage { slot: String, cause: anyhow::Error },

    #[error("stored state in slot `{slot}` is malformed: {source}")]
    Decode {
        slot: String,
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("stored state version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("stored state in slot `{slot}` uses the largest comment id; no new ids are left")]
    IdSpaceExhausted { slot: String },
}

/// A comment as stored. `createdAt` carries the last display text; `createdAtTs`
/// is absent in hand-written data such as the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredComment {
    pub id: CommentId,
    pub content: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_ts: Option<i64>,
    pub score: i64,
    pub user: User,
    #[serde(default)]
    pub replies: Vec<StoredComment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replying_to: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pending_edit: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pending_reply: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The durable subset of application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub comments: Vec<StoredComment>,
    pub current_user: User,
    #[serde(default)]
    pub user_votes: BTreeMap<CommentId, VoteDirection>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

/// Strip volatile fields from a snapshot.
pub fn partialize(state: &AppState) -> PersistedState {
    PersistedState {
        comments: state.comments.iter().map(store_comment).collect(),
        current_user: state.current_user.clone(),
        user_votes: state.user_votes.clone(),
    }
}

fn store_comment(comment: &Comment) -> StoredComment {
    StoredComment {
        id: comment.id,
        content: comment.content.clone(),
        created_at: comment.display_text.text.clone(),
        created_at_ts: Some(comment.created_at),
        score: comment.score,
        user: comment.author.clone(),
        replies: comment.replies.iter().map(store_comment).collect(),
        replying_to: comment.replying_to.clone(),
        pending_edit: comment.pending_edit,
        pending_reply: comment.pending_reply,
    }
}

/// Rebuild full state from the durable subset: backfill missing timestamps from
/// their relative text and derive `next_id` from the tree.
pub fn rehydrate(persisted: PersistedState, now: i64) -> AppState {
    let comments: Vec<Comment> = persisted
        .comments
        .into_iter()
        .map(|c| load_comment(c, now))
        .collect();

    let duplicates = tree::duplicate_ids(&comments);
    if !duplicates.is_empty() {
        warn!(?duplicates, "stored comment tree has duplicate ids");
    }

    AppState::new(comments, persisted.current_user, persisted.user_votes)
}

fn load_comment(stored: StoredComment, now: i64) -> Comment {
    let (created_at, display_text) = match stored.created_at_ts {
        Some(ts) => (ts, DisplayTextCache::stale(stored.created_at)),
        None => DisplayTextCache::from_relative(&stored.created_at, now),
    };

    Comment {
        id: stored.id,
        content: stored.content,
        author: stored.user,
        created_at,
        display_text,
        score: stored.score,
        replies: stored
            .replies
            .into_iter()
            .map(|r| load_comment(r, now))
            .collect(),
        replying_to: stored.replying_to,
        pending_edit: stored.pending_edit,
        pending_reply: stored.pending_reply,
    }
}

/// Reads and writes one named slot of a [`StateStore`].
pub struct Persistence {
    store: Arc<dyn StateStore>,
    slot: String,
}

impl Persistence {
    pub fn new(store: Arc<dyn StateStore>, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Load and rehydrate the slot. `Ok(None)` when the slot is empty.
    pub fn load(&self, now: i64) -> Result<Option<AppState>, PersistError> {
        let Some(raw) = self.store.get(&self.slot).map_err(|cause| self.storage(cause))? else {
            return Ok(None);
        };

        let envelope: Envelope =
            serde_json::from_str(&raw).map_err(|source| PersistError::Decode {
                slot: self.slot.clone(),
                source,
            })?;
        if envelope.version > STORAGE_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: envelope.version,
                supported: STORAGE_VERSION,
            });
        }

        let state = rehydrate(envelope.state, now);
        if tree::max_id(&state.comments) == CommentId::MAX {
            return Err(PersistError::IdSpaceExhausted {
                slot: self.slot.clone(),
            });
        }
        Ok(Some(state))
    }

    pub fn save(&self, state: &AppState) -> Result<(), PersistError> {
        let envelope = Envelope {
            state: partialize(state),
            version: STORAGE_VERSION,
        };
        let raw = serde_json::to_string(&envelope).map_err(PersistError::Encode)?;
        self.store
            .set(&self.slot, &raw)
            .map_err(|cause| self.storage(cause))?;
        debug!(slot = %self.slot, bytes = raw.len(), "saved state");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), PersistError> {
        self.store
            .remove(&self.slot)
            .map_err(|cause| self.storage(cause))?;
        info!(slot = %self.slot, "cleared persisted state");
        Ok(())
    }

    fn storage(&self, cause: anyhow::Error) -> PersistError {
        PersistError::Storage {
            slot: self.slot.clone(),
            cause,
        }
    }
}

/// Startup state: the persisted slot if it loads, otherwise the seed thread.
/// A broken slot is logged and left in place rather than aborting startup.
pub fn initial_state(persistence: Option<&Persistence>, now: i64) -> AppState {
    let Some(persistence) = persistence else {
        return seed::seed_state(now);
    };

    match persistence.load(now) {
        Ok(Some(state)) => {
            info!(
                slot = persistence.slot(),
                comments = state.comment_count(),
                "restored persisted state"
            );
            state
        }
        Ok(None) => {
            info!(slot = persistence.slot(), "no persisted state, using seed data");
            seed::seed_state(now)
        }
        Err(e) => {
            warn!(error = %e, "could not restore persisted state, using seed data");
            seed::seed_state(now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStateStore, SqliteStateStore};
    use crate::test_support::{user, NOW};
    use pretty_assertions::assert_eq;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn memory() -> (Persistence, Arc<MemoryStateStore>) {
        let slots = Arc::new(MemoryStateStore::new());
        (Persistence::new(slots.clone(), DEFAULT_SLOT), slots)
    }

    #[test]
    fn rehydrate_backfills_missing_timestamps() {
        let state = rehydrate(seed::seed_payload(), NOW);
        let first = tree::find(&state.comments, 1).unwrap();
        assert_eq!(first.created_at, NOW - 30 * DAY_MS);
        assert_eq!(first.display_text.text, "1 month ago");
        assert_eq!(first.display_text.valid_until, NOW + 30 * DAY_MS);

        let nested = tree::find(&state.comments, 4).unwrap();
        assert_eq!(nested.created_at, NOW - 2 * DAY_MS);
    }

    #[test]
    fn rehydrate_keeps_stored_instants_and_marks_cache_stale() {
        let mut payload = seed::seed_payload();
        payload.comments[0].created_at_ts = Some(12_345);
        let state = rehydrate(payload, NOW);
        let first = &state.comments[0];
        assert_eq!(first.created_at, 12_345);
        assert!(first.display_text.needs_refresh(first.created_at, NOW));
    }

    #[test]
    fn next_id_is_recomputed_not_trusted() {
        let mut payload = seed::seed_payload();
        payload.comments[1].replies[0].replies.push(StoredComment {
            id: 40,
            content: "hand edited".to_string(),
            created_at: "now".to_string(),
            created_at_ts: None,
            score: 0,
            user: user("someone"),
            replies: vec![],
            replying_to: Some("ramsesmiron".to_string()),
            pending_edit: false,
            pending_reply: false,
        });
        assert_eq!(rehydrate(payload, NOW).next_id, 41);
    }

    #[test]
    fn partialize_drops_volatile_fields() {
        let mut state = seed::seed_state(NOW);
        state.new_comment_draft = "unsent".to_string();
        state.requested_delete = Some(1);
        state.user_votes.insert(1, VoteDirection::Down);

        let json = serde_json::to_value(partialize(&state)).unwrap();
        let object = json.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["comments", "currentUser", "userVotes"]);
        assert_eq!(json["userVotes"]["1"], -1);
        assert_eq!(json["comments"][0]["createdAtTs"], NOW - 30 * DAY_MS);
        assert!(json["comments"][0].get("pendingReply").is_none());
    }

    #[test]
    fn save_then_load_restores_durable_subset() {
        let (persistence, _) = memory();
        let mut state = seed::seed_state(NOW);
        state.user_votes.insert(2, VoteDirection::Up);
        tree::find_mut(&mut state.comments, 2).unwrap().score = 6;
        state.new_comment_draft = "not durable".to_string();

        persistence.save(&state).unwrap();
        let loaded = persistence.load(NOW + 1_000).unwrap().unwrap();

        assert_eq!(loaded.vote_of(2), Some(VoteDirection::Up));
        assert_eq!(tree::find(&loaded.comments, 2).unwrap().score, 6);
        assert_eq!(loaded.new_comment_draft, "");
        assert_eq!(loaded.next_id, 5);
        assert_eq!(
            tree::find(&loaded.comments, 3).unwrap().created_at,
            tree::find(&state.comments, 3).unwrap().created_at
        );
    }

    #[test]
    fn empty_slot_loads_none() {
        let (persistence, _) = memory();
        assert!(persistence.load(NOW).unwrap().is_none());
    }

    #[test]
    fn malformed_slot_is_a_decode_error() {
        let (persistence, slots) = memory();
        slots.set(DEFAULT_SLOT, "{not json").unwrap();
        assert!(matches!(
            persistence.load(NOW),
            Err(PersistError::Decode { .. })
        ));
        // Startup falls back to the seed instead of failing.
        let state = initial_state(Some(&persistence), NOW);
        assert_eq!(state.comment_count(), 4);
    }

    #[test]
    fn newer_version_is_rejected() {
        let (persistence, slots) = memory();
        let payload = serde_json::json!({
            "state": seed::seed_payload(),
            "version": STORAGE_VERSION + 1,
        });
        slots.set(DEFAULT_SLOT, &payload.to_string()).unwrap();
        assert!(matches!(
            persistence.load(NOW),
            Err(PersistError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn exhausted_id_space_falls_back_to_seed() {
        let (persistence, slots) = memory();
        let mut payload = seed::seed_payload();
        payload.comments[1].replies[0].id = CommentId::MAX;
        let envelope = serde_json::json!({ "state": payload, "version": STORAGE_VERSION });
        slots.set(DEFAULT_SLOT, &envelope.to_string()).unwrap();

        assert!(matches!(
            persistence.load(NOW),
            Err(PersistError::IdSpaceExhausted { .. })
        ));
        let state = initial_state(Some(&persistence), NOW);
        assert_eq!(state.next_id, 5);
        // The slot is left for the user to inspect.
        assert!(slots.get(DEFAULT_SLOT).unwrap().is_some());
    }

    #[test]
    fn clear_empties_the_slot() {
        let (persistence, slots) = memory();
        persistence.save(&seed::seed_state(NOW)).unwrap();
        persistence.clear().unwrap();
        assert_eq!(slots.get(DEFAULT_SLOT).unwrap(), None);
    }

    #[test]
    fn works_over_sqlite() {
        let slots = Arc::new(SqliteStateStore::in_memory().unwrap());
        let persistence = Persistence::new(slots, "other-slot");
        persistence.save(&seed::seed_state(NOW)).unwrap();
        let loaded = persistence.load(NOW).unwrap().unwrap();
        assert_eq!(loaded.comment_count(), 4);
    }
}
