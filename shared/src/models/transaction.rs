//! Client ledger transaction Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of ledger entry
///
/// Sign convention: FIADO and MANUAL_DEBT are positive (debt),
/// PAYMENT is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Tab settled on credit
    Fiado,
    /// Money received from the client
    Payment,
    /// Debt added by hand
    ManualDebt,
}

impl TransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fiado => "FIADO",
            Self::Payment => "PAYMENT",
            Self::ManualDebt => "MANUAL_DEBT",
        }
    }

    /// Whether amounts of this type increase the balance
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Fiado | Self::ManualDebt)
    }

    /// Description used when the caller gives none
    pub const fn default_description(&self) -> &'static str {
        match self {
            Self::Fiado => "Fiado",
            Self::Payment => "Pagamento",
            Self::ManualDebt => "Dívida Manual",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIADO" => Ok(Self::Fiado),
            "PAYMENT" => Ok(Self::Payment),
            "MANUAL_DEBT" => Ok(Self::ManualDebt),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Immutable ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTransaction {
    pub id: i64,
    pub client_id: i64,
    pub tab_id: Option<i64>,
    /// Signed amount: positive = debt, negative = payment
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub created_at: i64,
}

/// Manual ledger entry payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionCreate {
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub description: Option<String>,
}
