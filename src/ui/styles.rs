//! Color scheme for the comment thread.
//! Uses basic terminal colors for maximum compatibility.

use ratatui::style::{Color, Modifier, Style};

pub const BG_POPUP: Color = Color::Black;
pub const BG_SELECTED: Color = Color::DarkGray;

pub const FG_DEFAULT: Color = Color::White;
pub const FG_MUTED: Color = Color::Gray;
pub const FG_BORDER: Color = Color::DarkGray;
pub const FG_AUTHOR: Color = Color::Cyan;
pub const FG_MENTION: Color = Color::Blue;
pub const FG_BADGE: Color = Color::Magenta;
pub const FG_UPVOTED: Color = Color::Green;
pub const FG_DOWNVOTED: Color = Color::Red;
pub const FG_KEY: Color = Color::Yellow;
pub const FG_DANGER: Color = Color::Red;

pub fn style_default() -> Style {
    Style::default().fg(FG_DEFAULT)
}

pub fn style_muted() -> Style {
    Style::default().fg(FG_MUTED)
}

pub fn style_border() -> Style {
    Style::default().fg(FG_BORDER)
}

pub fn style_author() -> Style {
    Style::default().fg(FG_AUTHOR).add_modifier(Modifier::BOLD)
}

pub fn style_mention() -> Style {
    Style::default().fg(FG_MENTION).add_modifier(Modifier::BOLD)
}

pub fn style_badge() -> Style {
    Style::default().fg(FG_BADGE)
}

pub fn style_score(upvoted: bool, downvoted: bool) -> Style {
    let fg = if upvoted {
        FG_UPVOTED
    } else if downvoted {
        FG_DOWNVOTED
    } else {
        FG_DEFAULT
    };
    Style::default().fg(fg).add_modifier(Modifier::BOLD)
}

pub fn style_key() -> Style {
    Style::default().fg(FG_KEY)
}

pub fn style_danger() -> Style {
    Style::default().fg(FG_DANGER).add_modifier(Modifier::BOLD)
}

pub fn style_selected() -> Style {
    Style::default().bg(BG_SELECTED)
}

pub fn style_popup() -> Style {
    Style::default().bg(BG_POPUP)
}
