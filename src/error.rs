use std::fmt;

use thiserror::Error;

use crate::entities::AccountId;

/// Statement (or phase) of a store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Open,
    Acquire,
    Schema,
    Insert,
    List,
    Lookup,
    Begin,
    BalanceRead,
    Debit,
    Credit,
    Commit,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Open => "open database",
            Step::Acquire => "acquire pooled connection",
            Step::Schema => "create schema",
            Step::Insert => "insert account",
            Step::List => "list accounts",
            Step::Lookup => "look up account",
            Step::Begin => "begin transaction",
            Step::BalanceRead => "read sender balance",
            Step::Debit => "debit sender",
            Step::Credit => "credit recipient",
            Step::Commit => "commit transfer",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transfer amount must be positive, got [{amount}]")]
    InvalidArgument { amount: f64 },
    #[error("Account [{id}] was not found")]
    NotFound { id: AccountId },
    #[error("Insufficient funds for account [{id}] (balance: {balance:.2})")]
    InsufficientFunds { id: AccountId, balance: f64 },
    #[error("Failed to {step}: {source}")]
    Store {
        step: Step,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to {step}: connection pool: {source}")]
    Pool {
        step: Step,
        #[source]
        source: r2d2::Error,
    },
    #[error("Invalid configuration from {origin}: {message}")]
    Config { origin: String, message: String },
}

impl StoreError {
    pub fn store(step: Step, source: rusqlite::Error) -> Self {
        Self::Store { step, source }
    }

    pub fn pool(step: Step, source: r2d2::Error) -> Self {
        Self::Pool { step, source }
    }

    pub fn config(origin: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Config {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    /// Step of a wrapped store or pool failure, if this is one
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Store { step, .. } | Self::Pool { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message_carries_fields() {
        let err = StoreError::InsufficientFunds { id: 7, balance: 12.5 };

        assert_eq!(
            err.to_string(),
            "Insufficient funds for account [7] (balance: 12.50)"
        );
    }

    #[test]
    fn test_store_failure_names_step_and_keeps_cause() {
        let err = StoreError::store(Step::Debit, rusqlite::Error::QueryReturnedNoRows);

        assert_eq!(err.step(), Some(Step::Debit));
        assert!(err.to_string().starts_with("Failed to debit sender"));

        let cause = std::error::Error::source(&err).expect("cause should be kept");
        assert_eq!(cause.to_string(), rusqlite::Error::QueryReturnedNoRows.to_string());
    }

    #[test]
    fn test_step_is_none_for_domain_errors() {
        assert_eq!(StoreError::NotFound { id: 1 }.step(), None);
        assert_eq!(StoreError::InvalidArgument { amount: -1.0 }.step(), None);
    }
}
