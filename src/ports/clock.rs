//! Clock port (trait).
//! Every wall-clock read in the engine goes through here so tests can pin time.

/// Port for reading the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}
