//! Pure render function for the help overlay.

use crate::keymap::Keymap;
use crate::ui::{centered_rect, styles};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
    Frame,
};

/// Render help overlay using keymap data.
pub fn render(frame: &mut Frame, area: Rect, keymap: &Keymap) {
    let popup_area = centered_rect(55, 80, area);

    frame.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "  Keyboard Shortcuts",
            Style::default()
                .fg(styles::FG_DEFAULT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (category, entries) in keymap.help_entries() {
        help_text.push(Line::from(Span::styled(
            format!("  {}", category.display_name()),
            styles::style_muted(),
        )));

        for entry in entries {
            let key_col = match entry.context_hint {
                Some(hint) => format!("  {} ({})", entry.key_display, hint),
                None => format!("  {}", entry.key_display),
            };

            // Pad to fixed width for alignment
            let key_col = format!("{:<18}", key_col);

            help_text.push(Line::from(vec![
                Span::styled(key_col, styles::style_key()),
                Span::raw(entry.description),
            ]));
        }

        help_text.push(Line::from(""));
    }

    help_text.push(Line::from(Span::styled(
        "  Press any key to close",
        styles::style_muted(),
    )));

    let help = Paragraph::new(help_text).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(styles::style_muted())
            .padding(Padding::uniform(1))
            .style(styles::style_popup()),
    );

    frame.render_widget(help, popup_area);
}
