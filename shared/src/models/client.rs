//! Client Model
//!
//! A client is a known customer who can run a credit ("fiado") balance.
//! The balance is never stored; it is derived from the client's ledger.

use super::tab::Tab;
use super::transaction::ClientTransaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Client entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Client with its derived balance (list view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientWithBalance {
    #[serde(flatten)]
    pub client: Client,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// Client detail: balance plus the most recent tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub recent_tabs: Vec<Tab>,
}

/// One ledger row with the balance right after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    #[serde(flatten)]
    pub transaction: ClientTransaction,
    #[serde(with = "rust_decimal::serde::float")]
    pub running_balance: Decimal,
}

/// Ordered ledger of a client
///
/// The last entry's `running_balance` always equals `balance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientStatement {
    pub client_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub entries: Vec<StatementEntry>,
}

/// Create client payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCreate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Update client payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Client list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
}
