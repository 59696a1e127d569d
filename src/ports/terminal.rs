//! Terminal port (trait).
//! Keeps the app loop free of crossterm types so it can be driven by tests.

use anyhow::Result;
use ratatui::Frame;
use std::time::Duration;

/// Events that can occur in the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Up,
    Down,
    Backspace,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyModifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
    };
}

/// Port for terminal operations.
pub trait Terminal {
    /// Draw a frame to the terminal.
    fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Frame);

    /// Wait up to `timeout` for an event. `None` means the timeout elapsed,
    /// which the app loop uses as its refresh tick.
    fn poll_event(&self, timeout: Duration) -> Result<Option<TerminalEvent>>;
}
