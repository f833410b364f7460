use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;

use super::period::PeriodKey;
use super::transaction::{Transaction, TransactionKind};

/// A user-defined rule generating one transaction per period on a fixed
/// day, until deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub day_of_month: u32,
    pub active: bool,
}

impl RecurringTemplate {
    pub fn new(
        kind: TransactionKind,
        amount: f64,
        category: impl Into<String>,
        description: impl Into<String>,
        day_of_month: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            category: category.into(),
            description: description.into(),
            day_of_month: day_of_month.clamp(1, 28),
            active: true,
        }
    }
}

/// Append-only record of which (period, template) pairs have already been
/// materialized. A marked pair is never reset, which is what makes
/// re-application idempotent across repeated session starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationLedger {
    applied: HashMap<String, bool>,
}

impl ApplicationLedger {
    fn apply_id(period: &PeriodKey, template_id: Uuid) -> String {
        format!("{}_{}", period, template_id)
    }

    pub fn is_applied(&self, period: &PeriodKey, template_id: Uuid) -> bool {
        self.applied
            .get(&Self::apply_id(period, template_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn mark_applied(&mut self, period: &PeriodKey, template_id: Uuid) {
        self.applied.insert(Self::apply_id(period, template_id), true);
    }
}

/// Materializes every active template that has not yet fired for
/// `now_period`, marking each fired pair in the ledger. Calling this again
/// with the updated ledger yields nothing, regardless of how many times the
/// host restarts a session within the same period.
pub fn apply(
    now_period: &PeriodKey,
    templates: &[RecurringTemplate],
    ledger: &mut ApplicationLedger,
    base: &CurrencyCode,
) -> Vec<Transaction> {
    let mut generated = Vec::new();
    for template in templates.iter().filter(|t| t.active) {
        if ledger.is_applied(now_period, template.id) {
            continue;
        }
        let description = if template.description.trim().is_empty() {
            template.category.clone()
        } else {
            template.description.clone()
        };
        generated.push(Transaction {
            id: Uuid::new_v4(),
            kind: template.kind,
            amount: template.amount,
            currency: base.clone(),
            amount_base: template.amount,
            category: template.category.clone(),
            date: now_period.date_on(template.day_of_month),
            description,
            recurring: true,
        });
        ledger.mark_applied(now_period, template.id);
    }
    if !generated.is_empty() {
        tracing::info!(
            period = %now_period,
            count = generated.len(),
            "materialized recurring templates"
        );
    }
    generated
}
