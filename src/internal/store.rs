//! Persistent store collaborator as seen from the command line.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store option: {0}")]
    InvalidOption(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// An initialisation option understood by every store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOption {
    Database(String),
    Table(String),
}

/// Current partition of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreOptions {
    pub database: String,
    pub table: String,
}

impl StoreOptions {
    pub fn apply(&mut self, option: &StoreOption) -> Result<(), StoreError> {
        match option {
            StoreOption::Database(name) if name.is_empty() => {
                Err(StoreError::InvalidOption("empty database name".to_string()))
            }
            StoreOption::Table(name) if name.is_empty() => {
                Err(StoreError::InvalidOption("empty table name".to_string()))
            }
            StoreOption::Database(name) => {
                self.database = name.clone();
                Ok(())
            }
            StoreOption::Table(name) => {
                self.table = name.clone();
                Ok(())
            }
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Re-initialises the store with the given options, applied in order.
    async fn init(&mut self, options: &[StoreOption]) -> Result<(), StoreError>;

    fn options(&self) -> StoreOptions;
}

/// Process-local store used when no external store is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    options: StoreOptions,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn init(&mut self, options: &[StoreOption]) -> Result<(), StoreError> {
        let mut next = self.options.clone();
        for option in options {
            next.apply(option)?;
        }
        tracing::debug!(database = %next.database, table = %next.table, "memory store initialised");
        self.options = next;
        Ok(())
    }

    fn options(&self) -> StoreOptions {
        self.options.clone()
    }
}
