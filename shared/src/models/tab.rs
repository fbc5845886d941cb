//! Tab ("comanda") Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tab lifecycle status
///
/// `closed`, `paid` and `fiado` are settled states; `deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Open,
    Closed,
    Paid,
    Fiado,
    Deleted,
}

impl TabStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Paid => "paid",
            Self::Fiado => "fiado",
            Self::Deleted => "deleted",
        }
    }

    /// Closed, paid or fiado
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Closed | Self::Paid | Self::Fiado)
    }
}

impl fmt::Display for TabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "paid" => Ok(Self::Paid),
            "fiado" => Ok(Self::Fiado),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown tab status: {other}")),
        }
    }
}

/// Payment method recorded for a settled tab
pub const PAYMENT_METHOD_CASH: &str = "cash";
/// Settling on the client's credit ledger
pub const PAYMENT_METHOD_FIADO: &str = "fiado";

/// Tab entity with its items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: i64,
    /// Free-text label shown on the board
    pub customer: String,
    pub client_id: Option<i64>,
    /// Joined from the client row
    pub client_name: Option<String>,
    pub status: TabStatus,
    /// Σ price × quantity over items, maintained by the ledger
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub payment_method: Option<String>,
    /// Tendered amount when paid
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub amount_paid: Option<Decimal>,
    /// amount_paid − total
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub change: Option<Decimal>,
    pub opened_at: i64,
    pub closed_at: Option<i64>,
    pub deleted_at: Option<i64>,
    pub updated_at: i64,
    #[serde(default)]
    pub items: Vec<TabItem>,
}

/// Line item with snapshotted product name and price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabItem {
    pub id: i64,
    pub tab_id: i64,
    /// Cleared when the product is deleted
    pub product_id: Option<i64>,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub added_at: i64,
}

/// Create tab payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabCreate {
    pub customer: Option<String>,
    pub client_id: Option<i64>,
}

/// Update tab payload
///
/// `status` requests a state transition; `amount_paid` is the tendered amount
/// when paying; `payment_method = "fiado"` with `status = "closed"` is the same
/// as `status = "fiado"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabUpdate {
    pub customer: Option<String>,
    pub client_id: Option<i64>,
    pub status: Option<TabStatus>,
    pub payment_method: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub amount_paid: Option<Decimal>,
}

/// Add item payload
///
/// `name` and `price` default to the product's current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabItemCreate {
    pub product_id: Option<i64>,
    pub name: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
}

/// Update item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabItemUpdate {
    pub name: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
}

/// Tab list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabQuery {
    pub status: Option<TabStatus>,
    /// Case-insensitive substring of the customer label
    pub customer: Option<String>,
    pub client_id: Option<i64>,
}

/// History filters; `from` / `to` are epoch milliseconds on `updated_at`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabHistoryQuery {
    pub status: Option<TabStatus>,
    pub customer: Option<String>,
    pub client_id: Option<i64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}
