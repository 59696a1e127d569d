//! Relative-time annotation: "2 weeks ago" <-> absolute instants.
//!
//! Units are approximate (a month is 30 days, a year 365) and not calendar aware.
//! Display text is memoized in a [`DisplayTextCache`] and only recomputed once the
//! wall clock passes its `valid_until`, so a periodic redraw never churns text that
//! cannot have changed yet.

use super::types::DisplayTextCache;
use once_cell::sync::Lazy;
use regex::Regex;

pub struct DurationUnit {
    pub name: &'static str,
    pub secs: i64,
}

/// Largest first.
pub const DURATION_UNITS: [DurationUnit; 7] = [
    DurationUnit { name: "year", secs: 365 * 24 * 60 * 60 },
    DurationUnit { name: "month", secs: 30 * 24 * 60 * 60 },
    DurationUnit { name: "week", secs: 7 * 24 * 60 * 60 },
    DurationUnit { name: "day", secs: 24 * 60 * 60 },
    DurationUnit { name: "hour", secs: 60 * 60 },
    DurationUnit { name: "minute", secs: 60 },
    DurationUnit { name: "second", secs: 1 },
];

/// Absolute creation instant recovered from relative text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTime {
    pub instant: i64,
    pub valid_until: i64,
}

/// Parse the first `<integer> <word>` in `text` where the word starts with a unit
/// name. Falls back to "just now" (valid for one second) when nothing matches.
pub fn parse_relative(text: &str, now: i64) -> ParsedTime {
    let fallback = ParsedTime {
        instant: now,
        valid_until: now + 1000,
    };

    let Some((value, word)) = first_count_and_word(text) else {
        return fallback;
    };

    for unit in &DURATION_UNITS {
        if !word.starts_with(unit.name) {
            continue;
        }
        let span_ms = unit.secs * 1000;
        return match value.checked_mul(span_ms) {
            Some(offset) => ParsedTime {
                instant: now.saturating_sub(offset),
                valid_until: now + span_ms,
            },
            None => fallback,
        };
    }
    fallback
}

static RELATIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"((?-u:\d)+)\s((?-u:\w)+)").expect("relative time pattern is valid"));

/// Leftmost `<digits><whitespace><word>`. An overflowing count can't be a
/// sensible age, so it counts as no match.
fn first_count_and_word(text: &str) -> Option<(i64, &str)> {
    let caps = RELATIVE.captures(text)?;
    let value = caps.get(1)?.as_str().parse::<i64>().ok()?;
    Some((value, caps.get(2)?.as_str()))
}

/// Relative text for an instant, and the instant that text stops being accurate.
/// `None` when less than a second has elapsed.
pub fn relative_text(created_at: i64, now: i64) -> Option<(String, i64)> {
    let diff = (now - created_at).max(0) / 1000;
    DURATION_UNITS.iter().find_map(|unit| {
        let value = diff / unit.secs;
        (value >= 1).then(|| {
            let text = format!(
                "{} {}{} ago",
                value,
                unit.name,
                if value > 1 { "s" } else { "" }
            );
            (text, now + unit.secs * 1000)
        })
    })
}

impl DisplayTextCache {
    /// Build a cache from relative text, recovering the absolute instant.
    pub fn from_relative(text: &str, now: i64) -> (i64, Self) {
        let parsed = parse_relative(text, now);
        let cache = Self {
            text: text.to_string(),
            valid_until: parsed.valid_until,
        };
        (parsed.instant, cache)
    }

    /// Cache that the next refresh will recompute.
    pub fn stale(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            valid_until: i64::MIN,
        }
    }

    pub fn needs_refresh(&self, created_at: i64, now: i64) -> bool {
        now > self.valid_until && relative_text(created_at, now).is_some()
    }

    /// Recompute the text if it has gone stale. Returns true if the cache changed.
    /// Under a second of age the old text is kept.
    pub fn refresh(&mut self, created_at: i64, now: i64) -> bool {
        if now <= self.valid_until {
            return false;
        }
        match relative_text(created_at, now) {
            Some((text, valid_until)) => {
                self.text = text;
                self.valid_until = valid_until;
                true
            }
            None => false,
        }
    }
}
