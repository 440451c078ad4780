// Entity Models
// Plain value snapshots of rows owned by the store

pub mod account;

pub use account::{Account, AccountId, NewAccount};
