// 💳 Account Entity - row snapshot of the accounts table
//
// The store owns persistence. Everything handed to callers here is a copy:
// a displayed balance is whatever the row held when it was read.

use serde::{Deserialize, Serialize};

/// Store-assigned row id
pub type AccountId = i64;

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

/// Persisted account (point-in-time snapshot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Assigned by the store on insert, never by the caller
    pub id: AccountId,

    /// Display label (not unique)
    pub name: String,

    /// Contact email (uniqueness is left to the schema, which does not enforce it)
    pub email: String,

    pub balance: f64,
}

impl Account {
    /// Fields a caller supplied on insert, without the id
    pub fn fields(&self) -> NewAccount {
        NewAccount {
            name: self.name.clone(),
            email: self.email.clone(),
            balance: self.balance,
        }
    }
}

/// Insert payload: an account before the store has assigned it an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub balance: f64,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, email: impl Into<String>, balance: f64) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            balance,
        }
    }

    /// Attach the id the store assigned
    pub fn with_id(self, id: AccountId) -> Account {
        Account {
            id,
            name: self.name,
            email: self.email,
            balance: self.balance,
        }
    }
}
