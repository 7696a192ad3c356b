//! Per-session context: turning a chat message into items, one run at a time.

use crate::error::ScrapeError;
use crate::market::ItemRequest;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Items one session asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSession {
    id: String,
    items: Vec<ItemRequest>,
}

impl ScrapeSession {
    /// Splits a message into one item per non-blank line.
    pub fn from_message(id: impl Into<String>, text: &str) -> Result<Self, ScrapeError> {
        let items: Vec<ItemRequest> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ItemRequest::new)
            .collect();

        if items.is_empty() {
            return Err(ScrapeError::empty_input());
        }

        Ok(Self { id: id.into(), items })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[ItemRequest] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Tracks which sessions have a batch in flight.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id` for one run; fails if it is already running.
    pub fn begin(&self, id: &str) -> Result<SessionGuard, ScrapeError> {
        let mut active = self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !active.insert(id.to_string()) {
            return Err(ScrapeError::SessionBusy(id.to_string()));
        }

        debug!("Session '{}' started", id);
        Ok(SessionGuard { id: id.to_string(), active: Arc::clone(&self.active) })
    }

    /// True while a run holds `id`.
    pub fn is_active(&self, id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(id)
    }
}

/// Releases the session when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    id: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.id);
        debug!("Session '{}' released", self.id);
    }
}
