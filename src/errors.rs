use std::result::Result as StdResult;

use thiserror::Error;

use crate::{
    ledger::{AccountKind, BucketKey, Category, EntryId},
    money::Money,
};

/// Every failure the budgeting core reports. All variants are recoverable by
/// correcting the input; a failed operation never leaves partial state behind.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Unknown category: {0}")]
    InvalidCategory(String),
    #[error("Insufficient funds in {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountKind,
        balance: Money,
        requested: Money,
    },
    #[error("{0} has ended; its expenses can no longer change")]
    WeekEnded(BucketKey),
    #[error("{0} has already been ended")]
    AlreadyEnded(BucketKey),
    #[error("Entry not found: {0}")]
    NotFound(EntryId),
    #[error("This expense now overspends {category} by {overspend} and must be confirmed again")]
    UnconfirmedOverspend { category: Category, overspend: Money },
    #[error("Budget plan is locked until the month is reset")]
    PlanLocked,
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = StdResult<T, BudgetError>;

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        BudgetError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        BudgetError::StorageError(err.to_string())
    }
}
