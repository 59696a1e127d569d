//! Comment-thread domain: data types, tree primitives, relative time.
//! Pure logic, no I/O.

pub mod time_annotation;
pub mod tree;
mod types;

pub use types::{AppState, AvatarRefs, Comment, CommentId, DisplayTextCache, User, VoteDirection};
