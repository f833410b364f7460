use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::{convert_to_base, CurrencyCode, RateTable};
use crate::errors::LedgerError;

use super::period::PeriodKey;

/// Closed set of transaction kinds; every aggregation matches exhaustively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single ledger entry. Immutable once created, apart from membership in
/// its period's list (it can be removed or reordered there).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    /// Amount in the currency the user entered.
    pub amount: f64,
    #[serde(default)]
    pub currency: CurrencyCode,
    /// Amount normalized to the base currency; equals `amount` for
    /// base-currency entries.
    pub amount_base: f64,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recurring: bool,
}

impl Transaction {
    pub fn period(&self) -> PeriodKey {
        PeriodKey::from_date(self.date)
    }
}

/// Boundary input for a user-entered transaction. Validated and converted
/// before anything is stored.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub category: String,
    pub date: NaiveDate,
    pub description: String,
}

impl TransactionDraft {
    /// Checks boundary invariants and materializes the entry, normalizing
    /// the amount with the supplied rate table. Empty descriptions fall
    /// back to the category label.
    pub fn build(self, rates: &RateTable) -> Result<Transaction, LedgerError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(LedgerError::Validation(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(LedgerError::Validation("category is required".into()));
        }
        let description = {
            let trimmed = self.description.trim();
            if trimmed.is_empty() {
                category.clone()
            } else {
                trimmed.to_string()
            }
        };
        let amount_base = convert_to_base(self.amount, &self.currency, rates);
        Ok(Transaction {
            id: Uuid::new_v4(),
            kind: self.kind,
            amount: self.amount,
            currency: self.currency,
            amount_base,
            category,
            date: self.date,
            description,
            recurring: false,
        })
    }
}
