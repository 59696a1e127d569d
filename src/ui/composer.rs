//! Input box under the thread for new comments, replies and edits.

use crate::ui::{styles, thread};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// What the composer shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerView {
    pub title: String,
    pub text: String,
    /// True while keystrokes go into the box.
    pub focused: bool,
}

/// Rows needed for `view` at `width`, borders included.
pub fn height(view: &ComposerView, width: u16, max: u16) -> u16 {
    let inner = width.saturating_sub(2) as usize;
    let rows = thread::wrap(&format!("{}█", view.text), inner).len() as u16;
    (rows + 2).clamp(3, max.max(3))
}

pub fn render(frame: &mut Frame, area: Rect, view: &ComposerView) {
    let inner = area.width.saturating_sub(2) as usize;

    let lines: Vec<Line> = if view.focused {
        // Cursor lives at the end of the text.
        thread::wrap(&format!("{}█", view.text), inner)
            .into_iter()
            .map(|row| Line::from(Span::styled(row, styles::style_default())))
            .collect()
    } else if view.text.is_empty() {
        vec![Line::from(Span::styled("Add a comment…", styles::style_muted()))]
    } else {
        thread::wrap(&view.text, inner)
            .into_iter()
            .map(|row| Line::from(Span::styled(row, styles::style_muted())))
            .collect()
    };

    let (border, hint) = if view.focused {
        (styles::style_badge(), " Enter send · Esc cancel ")
    } else {
        (styles::style_border(), " c compose ")
    };

    let block = Block::default()
        .title(format!(" {} ", view.title))
        .title_bottom(Line::from(Span::styled(hint, styles::style_muted())).right_aligned())
        .borders(Borders::ALL)
        .border_style(border);

    // Keep the cursor row visible when the text outgrows the box.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible) as u16;

    frame.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}
