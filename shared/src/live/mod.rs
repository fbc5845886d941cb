//! Realtime feed protocol
//!
//! Server → client: [`LiveEvent`], JSON text frames shaped
//! `{"event": "tab:updated", "data": {...}}`.
//! Client → server: [`ClientCommand`], `{"action": "join", "tab_id": 7}`.
//!
//! Tab-level and catalog events go to every connection. Item events are
//! scoped to the room of their tab and only reach connections that joined it.
//! Every payload carries the full current entity, never a diff.

mod board;

pub use board::TabBoard;

use crate::models::{Category, Client, ClientWithBalance, Product, Tab, TabItem};
use serde::{Deserialize, Serialize};

/// Item added or changed, with the tab it now belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemChange {
    pub tab_id: i64,
    pub item: TabItem,
    pub tab: Tab,
}

/// Item removed, with the tab after removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub tab_id: i64,
    pub item_id: i64,
    pub tab: Tab,
}

/// Deleted catalog or client entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRemoved {
    pub id: i64,
}

/// Server → client event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum LiveEvent {
    #[serde(rename = "tab:created")]
    TabCreated(Box<Tab>),
    #[serde(rename = "tab:updated")]
    TabUpdated(Box<Tab>),
    /// Soft-deleted tab, kept for history
    #[serde(rename = "tab:deleted")]
    TabDeleted(Box<Tab>),

    #[serde(rename = "tab:item:added")]
    ItemAdded(Box<ItemChange>),
    #[serde(rename = "tab:item:updated")]
    ItemUpdated(Box<ItemChange>),
    #[serde(rename = "tab:item:deleted")]
    ItemDeleted(Box<ItemRemoved>),

    #[serde(rename = "product:created")]
    ProductCreated(Product),
    #[serde(rename = "product:updated")]
    ProductUpdated(Product),
    #[serde(rename = "product:deleted")]
    ProductDeleted(EntityRemoved),

    #[serde(rename = "category:created")]
    CategoryCreated(Category),
    #[serde(rename = "category:updated")]
    CategoryUpdated(Category),
    #[serde(rename = "category:deleted")]
    CategoryDeleted(EntityRemoved),

    #[serde(rename = "client:created")]
    ClientCreated(Client),
    /// Client details or balance changed
    #[serde(rename = "client:updated")]
    ClientUpdated(ClientWithBalance),
    #[serde(rename = "client:deleted")]
    ClientDeleted(EntityRemoved),

    /// Room membership acknowledged
    #[serde(rename = "room:joined")]
    RoomJoined { tab_id: i64 },
    #[serde(rename = "room:left")]
    RoomLeft { tab_id: i64 },

    /// Events were dropped for this connection; re-fetch current state
    #[serde(rename = "resync")]
    Resync { missed: u64 },
}

impl LiveEvent {
    /// Room this event is scoped to; `None` means the global channel
    pub fn room(&self) -> Option<i64> {
        match self {
            Self::ItemAdded(change) | Self::ItemUpdated(change) => Some(change.tab_id),
            Self::ItemDeleted(removed) => Some(removed.tab_id),
            _ => None,
        }
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::TabCreated(_) => "tab:created",
            Self::TabUpdated(_) => "tab:updated",
            Self::TabDeleted(_) => "tab:deleted",
            Self::ItemAdded(_) => "tab:item:added",
            Self::ItemUpdated(_) => "tab:item:updated",
            Self::ItemDeleted(_) => "tab:item:deleted",
            Self::ProductCreated(_) => "product:created",
            Self::ProductUpdated(_) => "product:updated",
            Self::ProductDeleted(_) => "product:deleted",
            Self::CategoryCreated(_) => "category:created",
            Self::CategoryUpdated(_) => "category:updated",
            Self::CategoryDeleted(_) => "category:deleted",
            Self::ClientCreated(_) => "client:created",
            Self::ClientUpdated(_) => "client:updated",
            Self::ClientDeleted(_) => "client:deleted",
            Self::RoomJoined { .. } => "room:joined",
            Self::RoomLeft { .. } => "room:left",
            Self::Resync { .. } => "resync",
        }
    }
}

/// Client → server command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Start receiving item events of a tab
    Join { tab_id: i64 },
    /// Stop receiving item events of a tab
    Leave { tab_id: i64 },
}
