use serde::{Deserialize, Serialize};

use crate::currency::RateTable;
use crate::errors::LedgerError;
use crate::ledger::RecurringTemplate;

/// Per-user settings: savings goal, recurring templates, and the exchange
/// rate table. Defaults are merged once at load time through serde's field
/// defaults, so downstream code never re-derives fallbacks ad hoc.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub savings_goal: f64,
    #[serde(default)]
    pub recurring: Vec<RecurringTemplate>,
    #[serde(default)]
    pub currency: RateTable,
}

impl Settings {
    /// Decodes a persisted settings blob, falling back to defaults when the
    /// blob is absent.
    pub fn from_bytes(bytes: Option<&[u8]>) -> Result<Self, LedgerError> {
        match bytes {
            Some(raw) => Ok(serde_json::from_slice(raw)?),
            None => Ok(Self::default()),
        }
    }
}
