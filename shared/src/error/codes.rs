//! Unified error codes for the tab server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tab errors
//! - 4xxx: Client ledger errors
//! - 5xxx: Catalog errors (products, categories)
//! - 6xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can match
/// on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Federated login failed
    OAuthFailed = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Admins cannot delete, deactivate or demote themselves
    CannotModifySelf = 2006,

    // ==================== 3xxx: Tab ====================
    /// Tab not found
    TabNotFound = 3001,
    /// Tab item not found
    TabItemNotFound = 3002,
    /// Tab is not open, items cannot change
    TabNotOpen = 3003,
    /// Status transition not allowed from the current status
    InvalidTransition = 3004,
    /// Tab has nothing to charge
    TabEmpty = 3005,
    /// Tendered amount does not cover the total
    PaymentInsufficient = 3006,

    // ==================== 4xxx: Client ledger ====================
    /// Client not found
    ClientNotFound = 4001,
    /// Client has ledger entries and cannot be deleted
    ClientHasTransactions = 4002,
    /// Transaction amount is zero or has the wrong sign
    TransactionInvalidAmount = 4003,
    /// Transaction type cannot be recorded manually
    TransactionTypeNotAllowed = 4004,

    // ==================== 5xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 5001,
    /// Category not found
    CategoryNotFound = 5002,
    /// Category name already exists
    CategoryNameExists = 5003,
    /// Category still has products
    CategoryHasProducts = 5004,

    // ==================== 6xxx: User ====================
    /// User not found
    UserNotFound = 6001,
    /// Email already registered
    UserEmailExists = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::RequiredField => "Required field missing",

            Self::NotAuthenticated => "Authentication required",
            Self::TokenExpired => "Token expired",
            Self::TokenInvalid => "Invalid token",
            Self::AccountDisabled => "Account is disabled",
            Self::OAuthFailed => "Federated login failed",

            Self::PermissionDenied => "Permission denied",
            Self::AdminRequired => "Admin role required",
            Self::CannotModifySelf => "Cannot modify your own account this way",

            Self::TabNotFound => "Tab not found",
            Self::TabItemNotFound => "Tab item not found",
            Self::TabNotOpen => "Tab is not open",
            Self::InvalidTransition => "Status transition not allowed",
            Self::TabEmpty => "Tab has no amount to charge",
            Self::PaymentInsufficient => "Tendered amount is less than the total",

            Self::ClientNotFound => "Client not found",
            Self::ClientHasTransactions => "Client has ledger entries",
            Self::TransactionInvalidAmount => "Invalid transaction amount",
            Self::TransactionTypeNotAllowed => "Transaction type not allowed",

            Self::ProductNotFound => "Product not found",
            Self::CategoryNotFound => "Category not found",
            Self::CategoryNameExists => "Category name already exists",
            Self::CategoryHasProducts => "Category has associated products",

            Self::UserNotFound => "User not found",
            Self::UserEmailExists => "Email already registered",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
        }
    }

    /// Error kind string used in the `error` field of the response envelope
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success => "ok",

            Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled
            | Self::OAuthFailed => "auth_error",

            Self::PermissionDenied | Self::AdminRequired => "forbidden",

            Self::NotFound
            | Self::TabNotFound
            | Self::TabItemNotFound
            | Self::ClientNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::UserNotFound => "not_found",

            Self::AlreadyExists
            | Self::CategoryNameExists
            | Self::CategoryHasProducts
            | Self::ClientHasTransactions
            | Self::UserEmailExists => "conflict",

            Self::TabNotOpen | Self::InvalidTransition => "invalid_state",

            Self::DatabaseError => "storage_error",
            Self::Unknown | Self::InternalError | Self::ConfigError => "internal_error",

            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::CannotModifySelf
            | Self::TabEmpty
            | Self::PaymentInsufficient
            | Self::TransactionInvalidAmount
            | Self::TransactionTypeNotAllowed => "validation_error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::OAuthFailed),

            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2006 => Ok(ErrorCode::CannotModifySelf),

            3001 => Ok(ErrorCode::TabNotFound),
            3002 => Ok(ErrorCode::TabItemNotFound),
            3003 => Ok(ErrorCode::TabNotOpen),
            3004 => Ok(ErrorCode::InvalidTransition),
            3005 => Ok(ErrorCode::TabEmpty),
            3006 => Ok(ErrorCode::PaymentInsufficient),

            4001 => Ok(ErrorCode::ClientNotFound),
            4002 => Ok(ErrorCode::ClientHasTransactions),
            4003 => Ok(ErrorCode::TransactionInvalidAmount),
            4004 => Ok(ErrorCode::TransactionTypeNotAllowed),

            5001 => Ok(ErrorCode::ProductNotFound),
            5002 => Ok(ErrorCode::CategoryNotFound),
            5003 => Ok(ErrorCode::CategoryNameExists),
            5004 => Ok(ErrorCode::CategoryHasProducts),

            6001 => Ok(ErrorCode::UserNotFound),
            6002 => Ok(ErrorCode::UserEmailExists),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
