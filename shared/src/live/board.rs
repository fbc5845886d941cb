//! Client-side tab board
//!
//! Single dispatcher for the realtime feed: every event is applied as
//! "replace the tab by id" so duplicated or reordered delivery converges.
//! A snapshot older than the one already held (by `updated_at`) is ignored.
//! The server moves a tab's `updated_at` forward on every write, so two
//! snapshots with the same stamp carry the same committed state.

use std::collections::BTreeMap;

use super::LiveEvent;
use crate::models::{Tab, TabStatus};

#[derive(Debug, Clone, Default)]
pub struct TabBoard {
    tabs: BTreeMap<i64, Tab>,
}

impl TabBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole board after a fetch (initial load or `resync`)
    pub fn reset(&mut self, tabs: Vec<Tab>) {
        self.tabs = tabs.into_iter().map(|t| (t.id, t)).collect();
    }

    /// Apply one event; returns whether the board changed
    pub fn apply(&mut self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::TabCreated(tab) | LiveEvent::TabUpdated(tab) | LiveEvent::TabDeleted(tab) => {
                self.upsert(tab)
            }
            LiveEvent::ItemAdded(change) | LiveEvent::ItemUpdated(change) => {
                self.upsert(&change.tab)
            }
            LiveEvent::ItemDeleted(removed) => self.upsert(&removed.tab),
            _ => false,
        }
    }

    fn upsert(&mut self, incoming: &Tab) -> bool {
        match self.tabs.get(&incoming.id) {
            Some(current) if current.updated_at > incoming.updated_at => false,
            Some(current) if current == incoming => false,
            _ => {
                self.tabs.insert(incoming.id, incoming.clone());
                true
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    /// Open tabs, newest first
    pub fn open_tabs(&self) -> Vec<&Tab> {
        let mut open: Vec<&Tab> = self
            .tabs
            .values()
            .filter(|t| t.status == TabStatus::Open)
            .collect();
        open.sort_by(|a, b| b.opened_at.cmp(&a.opened_at).then(b.id.cmp(&a.id)));
        open
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
