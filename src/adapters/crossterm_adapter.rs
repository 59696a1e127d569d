//! Crossterm implementation of the Terminal port.

use crate::ports::{KeyCode, KeyEvent, KeyModifiers, Terminal, TerminalEvent};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode as CtKeyCode, KeyEventKind, KeyModifiers as CtKeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal as RatatuiTerminal};
use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;

pub struct CrosstermTerminal {
    terminal: RatatuiTerminal<CrosstermBackend<Stdout>>,
}

impl CrosstermTerminal {
    pub fn new() -> Result<Self> {
        install_panic_hook();
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = RatatuiTerminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

impl Terminal for CrosstermTerminal {
    fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }

    fn poll_event(&self, timeout: Duration) -> Result<Option<TerminalEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            // Windows reports releases too; only act on presses.
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                Ok(convert_key_code(key.code).map(|code| {
                    TerminalEvent::Key(KeyEvent {
                        code,
                        modifiers: convert_modifiers(key.modifiers),
                    })
                }))
            }
            Event::Resize(w, h) => Ok(Some(TerminalEvent::Resize(w, h))),
            _ => Ok(None),
        }
    }
}

fn convert_key_code(code: CtKeyCode) -> Option<KeyCode> {
    match code {
        CtKeyCode::Char(c) => Some(KeyCode::Char(c)),
        CtKeyCode::Enter => Some(KeyCode::Enter),
        CtKeyCode::Esc => Some(KeyCode::Esc),
        CtKeyCode::Up => Some(KeyCode::Up),
        CtKeyCode::Down => Some(KeyCode::Down),
        CtKeyCode::Backspace => Some(KeyCode::Backspace),
        CtKeyCode::Home => Some(KeyCode::Home),
        CtKeyCode::End => Some(KeyCode::End),
        CtKeyCode::PageUp => Some(KeyCode::PageUp),
        CtKeyCode::PageDown => Some(KeyCode::PageDown),
        _ => None,
    }
}

fn convert_modifiers(mods: CtKeyModifiers) -> KeyModifiers {
    KeyModifiers {
        ctrl: mods.contains(CtKeyModifiers::CONTROL),
        alt: mods.contains(CtKeyModifiers::ALT),
    }
}
