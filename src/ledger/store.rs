use uuid::Uuid;

use crate::errors::LedgerError;

use super::transaction::Transaction;

/// Ordered list of transactions belonging to the currently open period.
/// Newest entries sit at the front. Commit semantics (persist-or-rollback)
/// are owned by the session layer; this type is purely in-memory.
#[derive(Debug, Default, Clone)]
pub struct TransactionStore {
    items: Vec<Transaction>,
}

impl TransactionStore {
    pub fn new(items: Vec<Transaction>) -> Self {
        Self { items }
    }

    /// Inserts at the front so the most recent entry lists first.
    pub fn append(&mut self, tx: Transaction) {
        self.items.insert(0, tx);
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Transaction, LedgerError> {
        let pos = self
            .items
            .iter()
            .position(|tx| tx.id == id)
            .ok_or_else(|| LedgerError::InvalidRef(format!("transaction {} not found", id)))?;
        Ok(self.items.remove(pos))
    }

    /// Moves an entry to a new position in the list, clamping the target
    /// index to the list bounds.
    pub fn move_to(&mut self, id: Uuid, new_index: usize) -> Result<(), LedgerError> {
        let pos = self
            .items
            .iter()
            .position(|tx| tx.id == id)
            .ok_or_else(|| LedgerError::InvalidRef(format!("transaction {} not found", id)))?;
        let tx = self.items.remove(pos);
        let target = new_index.min(self.items.len());
        self.items.insert(target, tx);
        Ok(())
    }

    pub fn list(&self) -> &[Transaction] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drains every entry, leaving the store empty. Used by rollover after
    /// the archive snapshot has been written.
    pub fn take_all(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.items)
    }
}
