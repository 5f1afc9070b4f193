//! Error types for the loyalty ledger.

use crate::entity::EntityKind;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LoyaltyError>;

/// Errors that can occur while serving a request.
///
/// Every error is terminal for the request that raised it: nothing is retried
/// and nothing staged by the request is committed.
#[derive(Error, Debug)]
pub enum LoyaltyError {
    /// Identifier does not match the two-letters-seven-digits format
    #[error("Invalid identifier '{0}': expected two letters followed by seven digits")]
    InvalidIdentifier(String),

    /// A record is already stored under the identifier
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    /// No record is stored under the identifier
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// Stored bytes do not decode to the expected shape
    #[error("Corrupt record at key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Field update rejected because the record's status flag is off
    #[error("{kind} {id} is not active")]
    NotActive { kind: EntityKind, id: String },

    /// Purchase rejected because the customer is not active
    #[error("Customer {0} is not active")]
    CustomerInactive(String),

    /// Wallet purchase rejected: balance must exceed the price
    #[error("Insufficient balance for customer {customer}: balance {balance}, price {price}")]
    InsufficientBalance {
        customer: String,
        balance: u64,
        price: u64,
    },

    /// Accrual would overflow the cashback balance
    #[error("Cashback balance overflow for customer {0}")]
    BalanceOverflow(String),

    /// Operation name is not in the requested dispatch table
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Argument count or value rejected by the dispatcher
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Implicit customer lookup failed before the handler ran
    #[error("Failed to look up customer {id}: {source}")]
    CustomerLookupFailed {
        id: String,
        #[source]
        source: Box<LoyaltyError>,
    },

    /// Implicit item lookup failed before the handler ran
    #[error("Failed to look up item {id}: {source}")]
    ItemLookupFailed {
        id: String,
        #[source]
        source: Box<LoyaltyError>,
    },

    /// Point of sale lookup failed (update target or an item's owner)
    #[error("Failed to look up point of sale {id}: {source}")]
    PointOfSaleLookupFailed {
        id: String,
        #[source]
        source: Box<LoyaltyError>,
    },

    /// An indexed entity could not be retrieved during enumeration
    #[error("Failed to retrieve {kind} {id}: {source}")]
    RetrievalFailed {
        kind: EntityKind,
        id: String,
        #[source]
        source: Box<LoyaltyError>,
    },

    /// Caller identity or role could not be resolved
    #[error("Caller identity unavailable: {0}")]
    IdentityUnavailable(String),

    /// Caller role does not grant the operation
    #[error("Role '{role}' of caller {caller} is not permitted to {operation}")]
    Unauthorized {
        caller: String,
        role: String,
        operation: String,
    },

    /// Underlying record store reported a failure
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to open or read a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Store snapshot could not be read or written
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: loyalty-ledger <requests.csv> [state.json]")]
    MissingArgument,
}

impl LoyaltyError {
    pub(crate) fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        LoyaltyError::CorruptRecord {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
