//! Comment thread view: one list item per comment, replies indented under
//! their parent with guide rails.

use crate::domain::{tree, AppState, Comment, VoteDirection};
use crate::ui::styles;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const INDENT: &str = "│ ";

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, list_state: &mut ListState) {
    let block = Block::default()
        .title(format!(" Comments ({}) ", state.comment_count()))
        .borders(Borders::ALL)
        .border_style(styles::style_border())
        .padding(Padding::horizontal(1));

    if state.comments.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No comments yet. Press c to start the conversation.",
            styles::style_muted(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Borders and padding eat four columns.
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = tree::walk(&state.comments)
        .map(|(depth, comment)| ListItem::new(comment_lines(comment, depth, state, width)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::style_selected());

    frame.render_stateful_widget(list, area, list_state);
}

/// Lines for a single comment: header, wrapped body, spacer.
pub fn comment_lines(comment: &Comment, depth: usize, state: &AppState, width: usize) -> Vec<Line<'static>> {
    let guide = INDENT.repeat(depth);
    let body_width = width.saturating_sub(guide.width()).max(1);
    let mut lines = vec![header_line(comment, &guide, state)];

    if comment.pending_reply && comment.content.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(guide.clone(), styles::style_border()),
            Span::styled("writing a reply…", styles::style_muted()),
        ]));
    } else {
        let mention = comment.replying_to.as_ref().map(|name| format!("@{}", name));
        let text = match &mention {
            Some(m) => format!("{} {}", m, comment.content),
            None => comment.content.clone(),
        };
        for (i, row) in wrap(&text, body_width).into_iter().enumerate() {
            let mut spans = vec![Span::styled(guide.clone(), styles::style_border())];
            match &mention {
                Some(m) if i == 0 && row.starts_with(m.as_str()) => {
                    let rest = row[m.len()..].to_string();
                    spans.push(Span::styled(m.clone(), styles::style_mention()));
                    spans.push(Span::styled(rest, styles::style_default()));
                }
                _ => spans.push(Span::styled(row, styles::style_default())),
            }
            lines.push(Line::from(spans));
        }
    }

    lines.push(Line::from(Span::styled(guide, styles::style_border())));
    lines
}

fn header_line(comment: &Comment, guide: &str, state: &AppState) -> Line<'static> {
    let vote = state.vote_of(comment.id);
    let mut spans = vec![
        Span::styled(guide.to_string(), styles::style_border()),
        Span::styled(
            score_label(comment.score),
            styles::style_score(vote == Some(VoteDirection::Up), vote == Some(VoteDirection::Down)),
        ),
        Span::raw("  "),
        Span::styled(comment.author.username.clone(), styles::style_author()),
    ];

    if comment.is_authored_by(&state.current_user) {
        spans.push(Span::styled(" (you)", styles::style_badge()));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(comment.display_text.text.clone(), styles::style_muted()));

    if comment.pending_edit {
        spans.push(Span::styled("  editing", styles::style_badge()));
    }
    Line::from(spans)
}

pub fn score_label(score: i64) -> String {
    format!("[+{}-]", score)
}

/// Word-wrap `text` to `width` display columns. Explicit newlines are kept and
/// words wider than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.width();
            let sep = usize::from(!line.is_empty());

            if line_width + sep + word_width <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_width += sep + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }

            if word_width <= width {
                line.push_str(word);
                line_width = word_width;
                continue;
            }

            for ch in word.chars() {
                let w = ch.width().unwrap_or(0);
                if line_width + w > width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(ch);
                line_width += w;
            }
        }

        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::seed;
    use crate::test_support::NOW;
    use pretty_assertions::assert_eq;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap("the quick brown fox", 9), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn keeps_explicit_newlines() {
        assert_eq!(wrap("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn splits_overlong_words() {
        assert_eq!(wrap("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn measures_wide_characters() {
        // Each ideograph is two columns wide.
        assert_eq!(wrap("日本語です", 4), vec!["日本", "語で", "す"]);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn reply_lines_carry_mention_and_badge() {
        let state = seed::seed_state(NOW);
        let reply = tree::find(&state.comments, 4).unwrap();
        let lines = comment_lines(reply, 1, &state, 200);

        assert_eq!(line_text(&lines[0]), "│ [+2-]  juliusomo (you)  2 days ago");
        assert!(line_text(&lines[1]).starts_with("│ @ramsesmiron I couldn't agree more"));
        assert_eq!(lines[1].spans[1].content, "@ramsesmiron");
    }

    #[test]
    fn top_level_header_has_no_guide_or_badge() {
        let state = seed::seed_state(NOW);
        let lines = comment_lines(&state.comments[0], 0, &state, 200);
        assert_eq!(line_text(&lines[0]), "[+12-]  amyrobson  1 month ago");
    }

    #[test]
    fn placeholder_reply_shows_hint() {
        let state = seed::seed_state(NOW);
        let mut reply = Comment::new(9, "", state.current_user.clone(), NOW);
        reply.pending_reply = true;
        reply.replying_to = Some("amyrobson".to_string());
        let lines = comment_lines(&reply, 1, &state, 80);
        assert_eq!(line_text(&lines[1]), "│ writing a reply…");
    }
}
