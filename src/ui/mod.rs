//! Pure render functions. Nothing here mutates application state.

pub mod composer;
pub mod confirm;
pub mod help;
pub mod plain;
pub mod styles;
pub mod thread;

use crate::domain::{tree, AppState};
use crate::keymap::Keymap;
use composer::ComposerView;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{ListState, Paragraph},
    Frame,
};

/// Everything a frame needs.
pub struct Screen<'a> {
    pub state: &'a AppState,
    pub composer: &'a ComposerView,
    pub keymap: &'a Keymap,
    pub show_help: bool,
}

pub fn render(frame: &mut Frame, screen: &Screen, list_state: &mut ListState) {
    let area = frame.area();
    let composer_height = composer::height(screen.composer, area.width, area.height / 3);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(composer_height),
            Constraint::Length(1),
        ])
        .split(area);

    thread::render(frame, chunks[0], screen.state, list_state);
    composer::render(frame, chunks[1], screen.composer);
    render_status_bar(frame, chunks[2], screen.state);

    if let Some(id) = screen.state.requested_delete {
        let replies = tree::find(&screen.state.comments, id)
            .map(|c| tree::count(&c.replies))
            .unwrap_or(0);
        confirm::render(frame, area, replies);
    }

    if screen.show_help {
        help::render(frame, area, screen.keymap);
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let left = vec![
        Span::styled(" signed in as ", styles::style_muted()),
        Span::styled(state.current_user.username.clone(), styles::style_author()),
    ];
    let right = vec![
        Span::styled("?", styles::style_key()),
        Span::styled(" Help ", styles::style_muted()),
        Span::styled("q", styles::style_key()),
        Span::styled(" Quit ", styles::style_muted()),
    ];

    let left_width: usize = left.iter().map(|s| s.width()).sum();
    let right_width: usize = right.iter().map(|s| s.width()).sum();
    let padding = (area.width as usize).saturating_sub(left_width + right_width);

    let mut spans = left;
    spans.push(Span::raw(" ".repeat(padding)));
    spans.extend(right);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
