//! Comment-tree engine: the state container and every mutation on it.
//!
//! The published state is an `Arc<AppState>` snapshot. A mutation takes a private
//! copy through [`Arc::make_mut`] (which clones only while a reader still holds the
//! published snapshot), edits it, then republishes. Readers therefore never see a
//! half-applied change, and a snapshot handed out earlier stays valid forever.
//!
//! Invalid requests (unknown ids, self-votes, empty submissions) are silent no-ops
//! that leave the snapshot untouched; the return values let callers tell.

use crate::domain::{tree, AppState, Comment, CommentId, VoteDirection};
use crate::persistence::{self, seed, Persistence};
use crate::ports::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Listener invoked with each newly published snapshot.
pub type Listener = Box<dyn FnMut(&Arc<AppState>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Every store action as data, for callers that queue or replay operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    SetNewCommentContent(String),
    AddComment,
    AddReply { parent: CommentId },
    SetReplyContent { id: CommentId, content: String },
    SubmitReply(CommentId),
    BeginEdit(CommentId),
    EditContent { id: CommentId, content: String },
    FinishEdit(CommentId),
    Delete(CommentId),
    RequestDelete(Option<CommentId>),
    Vote { id: CommentId, direction: VoteDirection },
    RefreshDisplayText,
    Reset,
}

/// What `submit_reply` did with the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Submitted,
    /// Empty content: the placeholder was removed. Its id is not reused.
    Cancelled,
    /// Not a pending placeholder; nothing changed.
    AlreadyFinal,
    Missing,
}

/// Whether a publish touches the durable subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Publish {
    Durable,
    Volatile,
}

pub struct Store {
    state: Arc<AppState>,
    clock: Arc<dyn Clock>,
    persistence: Option<Persistence>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    pub fn new(state: AppState, clock: Arc<dyn Clock>, persistence: Option<Persistence>) -> Self {
        Self {
            state: Arc::new(state),
            clock,
            persistence,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Restore from persistence, falling back to the seed thread.
    pub fn load(clock: Arc<dyn Clock>, persistence: Option<Persistence>) -> Self {
        let state = persistence::initial_state(persistence.as_ref(), clock.now_ms());
        Self::new(state, clock, persistence)
    }

    /// The current snapshot.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Arc<AppState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Apply an [`Op`]. Returns whether the state changed.
    pub fn dispatch(&mut self, op: Op) -> bool {
        match op {
            Op::SetNewCommentContent(content) => self.set_new_comment_content(content),
            Op::AddComment => self.add_comment().is_some(),
            Op::AddReply { parent } => self.add_reply(parent).is_some(),
            Op::SetReplyContent { id, content } => self.set_reply_content(id, content),
            Op::SubmitReply(id) => matches!(
                self.submit_reply(id),
                ReplyOutcome::Submitted | ReplyOutcome::Cancelled
            ),
            Op::BeginEdit(id) => self.begin_edit(id),
            Op::EditContent { id, content } => self.edit_content(id, content),
            Op::FinishEdit(id) => self.finish_edit(id),
            Op::Delete(id) => self.delete_comment(id),
            Op::RequestDelete(id) => self.request_delete(id),
            Op::Vote { id, direction } => self.vote(id, direction),
            Op::RefreshDisplayText => self.refresh_display_text(),
            Op::Reset => {
                self.reset();
                true
            }
        }
    }

    // ─── Drafts and new comments ───

    pub fn set_new_comment_content(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if self.state.new_comment_draft == content {
            return false;
        }
        Arc::make_mut(&mut self.state).new_comment_draft = content;
        self.publish(Publish::Volatile);
        true
    }

    /// Post the trimmed draft as a new top-level comment and clear the draft.
    pub fn add_comment(&mut self) -> Option<CommentId> {
        let content = self.state.new_comment_draft.trim().to_string();
        if content.is_empty() {
            debug!("ignoring empty comment draft");
            return None;
        }
        if self.ids_exhausted() {
            return None;
        }

        let now = self.clock.now_ms();
        let state = Arc::make_mut(&mut self.state);
        let id = state.next_id;
        let comment = Comment::new(id, content, state.current_user.clone(), now);
        state.comments.push(comment);
        state.next_id += 1;
        state.new_comment_draft.clear();

        info!(id, "added comment");
        self.publish(Publish::Durable);
        Some(id)
    }

    // ─── Replies ───

    /// Append an empty placeholder reply under `parent_id`.
    pub fn add_reply(&mut self, parent_id: CommentId) -> Option<CommentId> {
        if tree::find(&self.state.comments, parent_id).is_none() {
            debug!(parent_id, "reply to unknown comment");
            return None;
        }
        if self.ids_exhausted() {
            return None;
        }

        let now = self.clock.now_ms();
        let state = Arc::make_mut(&mut self.state);
        let id = state.next_id;
        let author = state.current_user.clone();
        let parent = tree::find_mut(&mut state.comments, parent_id)?;

        let mut reply = Comment::new(id, "", author, now);
        reply.replying_to = Some(parent.author.username.clone());
        reply.pending_reply = true;
        parent.replies.push(reply);
        state.next_id += 1;

        debug!(id, parent_id, "opened reply");
        self.publish(Publish::Durable);
        Some(id)
    }

    /// `CommentId::MAX` is never allotted, so `next_id` can always advance.
    fn ids_exhausted(&self) -> bool {
        if self.state.next_id < CommentId::MAX {
            return false;
        }
        warn!("comment ids exhausted; nothing added");
        true
    }

    /// Update the text of an unsubmitted reply.
    pub fn set_reply_content(&mut self, id: CommentId, content: impl Into<String>) -> bool {
        let content = content.into();
        match tree::find(&self.state.comments, id) {
            Some(c) if c.pending_reply && c.content != content => {}
            _ => return false,
        }
        self.mutate_comment(id, |c| c.content = content)
    }

    /// Finalize a placeholder reply, or drop it if nothing was written.
    pub fn submit_reply(&mut self, id: CommentId) -> ReplyOutcome {
        let Some(comment) = tree::find(&self.state.comments, id) else {
            return ReplyOutcome::Missing;
        };

        if comment.content.trim().is_empty() {
            debug!(id, "empty reply, cancelling");
            self.delete_comment(id);
            return ReplyOutcome::Cancelled;
        }

        if !comment.pending_reply {
            debug!(id, "reply already submitted");
            return ReplyOutcome::AlreadyFinal;
        }
        self.mutate_comment(id, |c| c.pending_reply = false);
        info!(id, "submitted reply");
        ReplyOutcome::Submitted
    }

    // ─── Editing ───

    pub fn begin_edit(&mut self, id: CommentId) -> bool {
        match tree::find(&self.state.comments, id) {
            Some(c) if !c.pending_edit => self.mutate_comment(id, |c| c.pending_edit = true),
            _ => false,
        }
    }

    /// Replace the content of a comment that is being edited.
    pub fn edit_content(&mut self, id: CommentId, content: impl Into<String>) -> bool {
        let content = content.into();
        match tree::find(&self.state.comments, id) {
            Some(c) if c.pending_edit && c.content != content => {}
            _ => return false,
        }
        self.mutate_comment(id, |c| c.content = content)
    }

    /// Leave edit mode. Refused (the comment stays in edit mode) while the
    /// content is blank.
    pub fn finish_edit(&mut self, id: CommentId) -> bool {
        match tree::find(&self.state.comments, id) {
            Some(c) if c.pending_edit && !c.content.trim().is_empty() => {
                self.mutate_comment(id, |c| c.pending_edit = false)
            }
            Some(c) if c.pending_edit => {
                debug!(id, "refusing to finish edit with empty content");
                false
            }
            _ => false,
        }
    }

    // ─── Deletion ───

    /// Open (or with `None`, close) the delete confirmation for a comment.
    pub fn request_delete(&mut self, id: Option<CommentId>) -> bool {
        if self.state.requested_delete == id {
            return false;
        }
        Arc::make_mut(&mut self.state).requested_delete = id;
        self.publish(Publish::Volatile);
        true
    }

    /// Remove a comment and its whole reply subtree.
    pub fn delete_comment(&mut self, id: CommentId) -> bool {
        if tree::find(&self.state.comments, id).is_none() {
            debug!(id, "delete of unknown comment");
            return false;
        }

        let state = Arc::make_mut(&mut self.state);
        let Some(removed) = tree::remove_by_id(&mut state.comments, id) else {
            return false;
        };

        let removed_ids: HashSet<CommentId> = tree::subtree_ids(&removed).collect();
        if state
            .requested_delete
            .is_some_and(|requested| removed_ids.contains(&requested))
        {
            state.requested_delete = None;
        }
        // Ids can come back after a reload (next_id is max + 1), so a vote on a
        // removed comment must not survive to attach itself to a newcomer.
        state.user_votes.retain(|vote_id, _| !removed_ids.contains(vote_id));

        info!(id, removed = removed_ids.len(), "deleted comment");
        self.publish(Publish::Durable);
        true
    }

    // ─── Voting ───

    /// Cast, switch or (by repeating the same direction) cancel a vote.
    pub fn vote(&mut self, id: CommentId, direction: VoteDirection) -> bool {
        let Some(comment) = tree::find(&self.state.comments, id) else {
            debug!(id, "vote on unknown comment");
            return false;
        };
        if comment.is_authored_by(&self.state.current_user) {
            debug!(id, "ignoring vote on own comment");
            return false;
        }

        let previous = self.state.vote_of(id);
        let state = Arc::make_mut(&mut self.state);
        let Some(comment) = tree::find_mut(&mut state.comments, id) else {
            return false;
        };

        match previous {
            Some(previous) if previous == direction => {
                comment.score -= direction.delta();
                state.user_votes.remove(&id);
            }
            _ => {
                comment.score += direction.delta() - previous.map_or(0, VoteDirection::delta);
                state.user_votes.insert(id, direction);
            }
        }

        debug!(id, %direction, score = comment.score, "voted");
        self.publish(Publish::Durable);
        true
    }

    // ─── Generic mutation ───

    /// Locate a comment and apply an arbitrary change to it, then publish.
    pub fn find_and_mutate(&mut self, id: CommentId, mutator: impl FnOnce(&mut Comment)) -> bool {
        if tree::find(&self.state.comments, id).is_none() {
            return false;
        }
        self.mutate_comment(id, mutator)
    }

    fn mutate_comment(&mut self, id: CommentId, mutator: impl FnOnce(&mut Comment)) -> bool {
        let state = Arc::make_mut(&mut self.state);
        let Some(comment) = tree::find_mut(&mut state.comments, id) else {
            return false;
        };
        mutator(comment);
        self.publish(Publish::Durable);
        true
    }

    // ─── Display text ───

    /// Recompute stale relative-time captions. Publishes only if one changed and
    /// never writes to storage.
    pub fn refresh_display_text(&mut self) -> bool {
        let now = self.clock.now_ms();
        let stale = tree::walk(&self.state.comments)
            .any(|(_, c)| c.display_text.needs_refresh(c.created_at, now));
        if !stale {
            return false;
        }

        let state = Arc::make_mut(&mut self.state);
        tree::visit_mut(&mut state.comments, &mut |c| {
            c.display_text.refresh(c.created_at, now);
        });
        self.publish(Publish::Volatile);
        true
    }

    // ─── Reset ───

    /// Forget the persisted slot and start over from the seed thread.
    pub fn reset(&mut self) {
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.clear() {
                warn!(error = %e, "failed to clear persisted state");
            }
        }
        self.state = Arc::new(seed::seed_state(self.clock.now_ms()));
        info!("reset to seed data");
        self.publish(Publish::Volatile);
    }

    fn publish(&mut self, kind: Publish) {
        if kind == Publish::Durable {
            if let Some(persistence) = &self.persistence {
                if let Err(e) = persistence.save(&self.state) {
                    warn!(error = %e, "failed to persist state");
                }
            }
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }
}
