//! Pure data types for the comment thread.
//! No I/O. Serde derives only on the types stored verbatim in the slot payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::tree;

pub type CommentId = u64;

/// Avatar image references for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRefs {
    #[serde(rename = "png")]
    pub raster: String,
    #[serde(rename = "webp")]
    pub vector: String,
}

/// A comment author. Two users are the same user when their usernames match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(rename = "image")]
    pub avatar: AvatarRefs,
}

impl User {
    pub fn is(&self, other: &User) -> bool {
        self.username == other.username
    }
}

/// Direction of a single vote. Stored as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Score delta contributed by a vote in this direction.
    pub fn delta(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl From<VoteDirection> for i8 {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl TryFrom<i8> for VoteDirection {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => Err(format!("vote direction must be 1 or -1, got {}", other)),
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteDirection::Up => write!(f, "+1"),
            VoteDirection::Down => write!(f, "-1"),
        }
    }
}

/// Memoized relative-time text ("2 weeks ago") and the instant it goes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTextCache {
    pub text: String,
    pub valid_until: i64, // Unix timestamp in milliseconds
}

impl DisplayTextCache {
    /// Cache for a comment created at `now`.
    pub fn just_now(now: i64) -> Self {
        Self {
            text: "now".to_string(),
            valid_until: now + 1000,
        }
    }
}

/// A node in the comment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: User,
    pub created_at: i64, // Unix timestamp in milliseconds
    pub display_text: DisplayTextCache,
    pub score: i64,
    pub replies: Vec<Comment>,
    pub replying_to: Option<String>,
    pub pending_edit: bool,
    pub pending_reply: bool,
}

impl Comment {
    /// A freshly authored comment: zero score, no replies.
    pub fn new(id: CommentId, content: impl Into<String>, author: User, now: i64) -> Self {
        Self {
            id,
            content: content.into(),
            author,
            created_at: now,
            display_text: DisplayTextCache::just_now(now),
            score: 0,
            replies: Vec::new(),
            replying_to: None,
            pending_edit: false,
            pending_reply: false,
        }
    }

    pub fn is_authored_by(&self, user: &User) -> bool {
        self.author.is(user)
    }

    /// True if one of the direct replies is an unsubmitted placeholder.
    pub fn has_pending_reply(&self) -> bool {
        self.replies.iter().any(|r| r.pending_reply)
    }
}

/// Whole application state. Published as an immutable snapshot by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub comments: Vec<Comment>,
    pub current_user: User,
    pub next_id: CommentId,
    pub requested_delete: Option<CommentId>,
    pub new_comment_draft: String,
    pub user_votes: BTreeMap<CommentId, VoteDirection>,
}

impl AppState {
    /// Build state around a tree, deriving `next_id` from the ids present.
    pub fn new(
        comments: Vec<Comment>,
        current_user: User,
        user_votes: BTreeMap<CommentId, VoteDirection>,
    ) -> Self {
        // Saturates at the largest id; the store refuses to hand that one out.
        let next_id = tree::max_id(&comments).saturating_add(1);
        Self {
            comments,
            current_user,
            next_id,
            requested_delete: None,
            new_comment_draft: String::new(),
            user_votes,
        }
    }

    pub fn vote_of(&self, id: CommentId) -> Option<VoteDirection> {
        self.user_votes.get(&id).copied()
    }

    pub fn comment_count(&self) -> usize {
        tree::count(&self.comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;

    #[test]
    fn vote_direction_serializes_as_integer() {
        let json = serde_json::to_string(&VoteDirection::Down).unwrap();
        assert_eq!(json, "-1");
        let back: VoteDirection = serde_json::from_str("1").unwrap();
        assert_eq!(back, VoteDirection::Up);
    }

    #[test]
    fn vote_direction_rejects_other_integers() {
        assert!(serde_json::from_str::<VoteDirection>("0").is_err());
        assert!(serde_json::from_str::<VoteDirection>("2").is_err());
    }

    #[test]
    fn user_identity_is_by_username() {
        let a = user("amyrobson");
        let mut b = user("amyrobson");
        b.avatar.raster = "elsewhere.png".to_string();
        assert!(a.is(&b));
        assert!(!a.is(&user("maxblagun")));
    }

    #[test]
    fn new_comment_starts_clean() {
        let c = Comment::new(7, "hi", user("juliusomo"), 5_000);
        assert_eq!(c.score, 0);
        assert!(c.replies.is_empty());
        assert_eq!(c.display_text.text, "now");
        assert_eq!(c.display_text.valid_until, 6_000);
        assert!(!c.pending_reply && !c.pending_edit);
    }

    #[test]
    fn app_state_derives_next_id_from_nested_ids() {
        let mut parent = Comment::new(2, "parent", user("a"), 0);
        parent.replies.push(Comment::new(9, "deep", user("b"), 0));
        let state = AppState::new(vec![parent], user("a"), BTreeMap::new());
        assert_eq!(state.next_id, 10);
        assert_eq!(state.comment_count(), 2);
    }

    #[test]
    fn next_id_saturates_at_largest_id() {
        let top = Comment::new(CommentId::MAX, "last", user("a"), 0);
        let state = AppState::new(vec![top], user("a"), BTreeMap::new());
        assert_eq!(state.next_id, CommentId::MAX);
    }
}
