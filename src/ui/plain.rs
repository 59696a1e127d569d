//! Plain-text rendering of the thread for `natter list`.

use crate::domain::{tree, AppState};
use crate::store::Store;
use crate::ui::thread::{score_label, wrap};
use std::fmt::Write;

/// Bring relative ages up to date with the clock, then render.
pub fn list(store: &mut Store, width: usize) -> String {
    store.refresh_display_text();
    render(&store.state(), width)
}

pub fn render(state: &AppState, width: usize) -> String {
    let mut out = String::new();

    for (depth, comment) in tree::walk(&state.comments) {
        let indent = "  ".repeat(depth);
        let you = if comment.is_authored_by(&state.current_user) {
            " (you)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{}{} {}{} · {}",
            indent,
            score_label(comment.score),
            comment.author.username,
            you,
            comment.display_text.text
        );

        let body = match &comment.replying_to {
            Some(name) => format!("@{} {}", name, comment.content),
            None => comment.content.clone(),
        };
        let body_indent = format!("{}    ", indent);
        for row in wrap(&body, width.saturating_sub(body_indent.len())) {
            let _ = writeln!(out, "{}{}", body_indent, row);
        }
        out.push('\n');
    }

    out
}
