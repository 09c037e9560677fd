//! Bounded, append-only record of session lifecycle events.
//!
//! Keeps the last N entries for the UI surface; every entry is also emitted
//! through the normal logger.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// One immutable lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Ring of the most recent session events.
#[derive(Debug)]
pub struct SessionLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl SessionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an event, evicting the oldest entries past capacity.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("session: {}", message);
        self.entries.push_back(LogEntry {
            timestamp: Utc::now(),
            message,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
