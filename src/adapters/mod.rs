pub mod crossterm_adapter;
pub mod memory_state_store;
pub mod sqlite_state_store;
pub mod system_clock;

pub use crossterm_adapter::CrosstermTerminal;
pub use memory_state_store::MemoryStateStore;
pub use sqlite_state_store::SqliteStateStore;
pub use system_clock::SystemClock;
