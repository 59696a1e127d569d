//! Traversal primitives over the nested comment tree.
//! Every function descends into `replies` at every level, not just the top.

use super::types::{Comment, CommentId};
use std::collections::HashSet;
use std::slice;

/// Depth-first pre-order search. Top-level comments first, then their replies.
pub fn find(comments: &[Comment], id: CommentId) -> Option<&Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find(&comment.replies, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_mut(comments: &mut [Comment], id: CommentId) -> Option<&mut Comment> {
    for comment in comments.iter_mut() {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

/// The comment whose `replies` directly contain `id`. `None` for top-level
/// comments and unknown ids.
pub fn parent_of(comments: &[Comment], id: CommentId) -> Option<&Comment> {
    for comment in comments {
        if comment.replies.iter().any(|r| r.id == id) {
            return Some(comment);
        }
        if let Some(found) = parent_of(&comment.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Excise the node with `id` (and its whole reply subtree) from wherever it sits.
/// Returns the removed node; leaves the tree untouched when nothing matches.
pub fn remove_by_id(comments: &mut Vec<Comment>, id: CommentId) -> Option<Comment> {
    if let Some(index) = comments.iter().position(|c| c.id == id) {
        return Some(comments.remove(index));
    }
    comments
        .iter_mut()
        .find_map(|c| remove_by_id(&mut c.replies, id))
}

/// Largest id anywhere in the tree, or 0 for an empty tree.
pub fn max_id(comments: &[Comment]) -> CommentId {
    walk(comments).map(|(_, c)| c.id).max().unwrap_or(0)
}

pub fn count(comments: &[Comment]) -> usize {
    walk(comments).count()
}

/// Ids of `comment` and every reply beneath it.
pub fn subtree_ids(comment: &Comment) -> impl Iterator<Item = CommentId> + '_ {
    std::iter::once(comment.id).chain(walk(&comment.replies).map(|(_, c)| c.id))
}

/// Ids that occur more than once, in first-repeat order.
pub fn duplicate_ids(comments: &[Comment]) -> Vec<CommentId> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for (_, comment) in walk(comments) {
        if !seen.insert(comment.id) && !duplicates.contains(&comment.id) {
            duplicates.push(comment.id);
        }
    }
    duplicates
}

/// Apply `f` to every node, parents before their replies.
pub fn visit_mut(comments: &mut [Comment], f: &mut impl FnMut(&mut Comment)) {
    for comment in comments.iter_mut() {
        f(comment);
        visit_mut(&mut comment.replies, f);
    }
}

/// Pre-order iterator yielding `(depth, comment)`; top-level comments have depth 0.
pub fn walk(comments: &[Comment]) -> Walk<'_> {
    Walk {
        stack: vec![(0, comments.iter())],
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, slice::Iter<'a, Comment>)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Comment);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, siblings) = self.stack.last_mut()?;
            let depth = *depth;
            match siblings.next() {
                Some(comment) => {
                    if !comment.replies.is_empty() {
                        self.stack.push((depth + 1, comment.replies.iter()));
                    }
                    return Some((depth, comment));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
