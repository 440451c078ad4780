// Account Store - Core Library
// Exposes all modules for use in the demo driver and tests

pub mod config;
pub mod db;
pub mod demo;
pub mod entities;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use config::StoreConfig;
pub use db::{create_pool, setup_database, DbPool};
pub use entities::{Account, AccountId, NewAccount};
pub use error::{Result, Step, StoreError};
pub use store::AccountStore;
