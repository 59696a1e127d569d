pub mod clock;
pub mod state_store;
pub mod terminal;

pub use clock::Clock;
pub use state_store::StateStore;
pub use terminal::{KeyCode, KeyEvent, KeyModifiers, Terminal, TerminalEvent};
