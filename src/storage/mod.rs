pub mod json_backend;

use std::collections::HashMap;

use crate::errors::LedgerError;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Logical key for the live transaction store snapshot.
pub const TRANSACTIONS_KEY: &str = "transactions";
/// Logical key for the closed-period archive collection.
pub const ARCHIVES_KEY: &str = "archives";
/// Logical key for per-user settings (templates, goal, rate table).
pub const SETTINGS_KEY: &str = "settings";
/// Logical key for the `last_closed_period` rollover marker.
pub const LAST_RESET_KEY: &str = "last_reset";
/// Logical key for the recurring-application idempotency ledger.
pub const RECURRING_APPLIED_KEY: &str = "recurring_applied";

/// Abstraction over the per-user key/value blob store backing the ledger.
/// Writes are synchronous; a failed `set` means the triggering operation
/// must not be considered committed.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

/// In-memory backend for tests and embedding hosts that persist elsewhere.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

pub use json_backend::JsonStore;
