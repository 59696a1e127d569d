//! Delete confirmation modal.

use crate::ui::{centered_rect, styles};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, area: Rect, reply_count: usize) {
    let popup_area = centered_rect(50, 35, area);

    frame.render_widget(Clear, popup_area);

    let mut text = vec![Line::from(
        "Are you sure you want to delete this comment? This will remove the comment and can't be undone.",
    )];
    if reply_count > 0 {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            format!(
                "{} {} will be removed with it.",
                reply_count,
                if reply_count == 1 { "reply" } else { "replies" }
            ),
            styles::style_muted(),
        )));
    }
    text.push(Line::from(""));
    text.push(Line::from(vec![
        Span::styled("y", styles::style_danger()),
        Span::raw(" yes, delete   "),
        Span::styled("n", styles::style_key()),
        Span::raw(" no, cancel"),
    ]));

    let modal = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .title(Span::styled(" Delete comment ", styles::style_danger()))
                .borders(Borders::ALL)
                .border_style(styles::style_danger())
                .padding(Padding::uniform(1))
                .style(styles::style_popup()),
        );

    frame.render_widget(modal, popup_area);
}
