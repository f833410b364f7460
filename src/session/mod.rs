//! Explicit session context threading the live store, archives, and
//! settings through every core operation. No ambient globals: a host opens
//! a [`Session`] per user and drives everything through it.
//!
//! Mutations follow a stage-write-commit discipline: the new state is
//! persisted through the key/value store first, and the in-memory state is
//! swapped only after the write succeeds. A persistence failure therefore
//! leaves the session exactly where it was, with the error propagated to
//! the caller.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{self, AdviceEntry, AnnualAggregate, CategorySpend, Totals};
use crate::config::Settings;
use crate::errors::LedgerError;
use crate::ledger::{
    plan, recurring, route_entry, ApplicationLedger, ArchiveRepository, EntryRoute, PeriodArchive,
    PeriodKey, RecurringTemplate, RolloverAction, Transaction, TransactionDraft, TransactionStore,
};
use crate::storage::{
    KeyValueStore, ARCHIVES_KEY, LAST_RESET_KEY, RECURRING_APPLIED_KEY, SETTINGS_KEY,
    TRANSACTIONS_KEY,
};

/// Progress toward the configured savings goal for the open period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsProgress {
    pub goal: f64,
    pub saved: f64,
    pub percent: f64,
}

pub struct Session<S: KeyValueStore> {
    store: S,
    current_period: PeriodKey,
    live: TransactionStore,
    archives: ArchiveRepository,
    settings: Settings,
    applied: ApplicationLedger,
    last_closed: Option<PeriodKey>,
}

impl<S: KeyValueStore> Session<S> {
    /// Opens a session for the given calendar day: loads every persisted
    /// key (defaults where absent), performs any due rollover, then
    /// materializes recurring templates into the freshly opened period.
    /// Rollover always runs first so generated entries never land in the
    /// period being closed.
    pub fn start(store: S, today: NaiveDate) -> Result<Self, LedgerError> {
        let transactions: Vec<Transaction> = decode_or_default(store.get(TRANSACTIONS_KEY)?)?;
        let archive_records: Vec<PeriodArchive> = decode_or_default(store.get(ARCHIVES_KEY)?)?;
        let settings = Settings::from_bytes(store.get(SETTINGS_KEY)?.as_deref())?;
        let applied: ApplicationLedger = decode_or_default(store.get(RECURRING_APPLIED_KEY)?)?;
        let last_closed: Option<PeriodKey> = decode_or_default(store.get(LAST_RESET_KEY)?)?;

        let mut session = Self {
            store,
            current_period: PeriodKey::from_date(today),
            live: TransactionStore::new(transactions),
            archives: ArchiveRepository::new(archive_records),
            settings,
            applied,
            last_closed,
        };
        session.run_rollover()?;
        session.apply_recurring()?;
        Ok(session)
    }

    fn run_rollover(&mut self) -> Result<(), LedgerError> {
        match plan(self.last_closed.as_ref(), &self.current_period) {
            RolloverAction::NoOp => Ok(()),
            RolloverAction::FirstRun => {
                tracing::debug!(period = %self.current_period, "first run, adopting period");
                self.write_marker(self.current_period.clone())
            }
            RolloverAction::Close { stale } => {
                if !self.live.is_empty() {
                    tracing::info!(
                        closed = %stale,
                        opened = %self.current_period,
                        entries = self.live.len(),
                        "rolling stale period into archive"
                    );
                    let record = PeriodArchive::from_transactions(
                        stale,
                        self.live.list().to_vec(),
                        self.settings.savings_goal,
                        Utc::now(),
                    );
                    let mut archives = self.archives.clone();
                    archives.upsert(record);
                    // The archive must reach the store before the live list
                    // is cleared, so a failed write never drops the
                    // original transactions.
                    self.write_json(ARCHIVES_KEY, &archives.list().to_vec())?;
                    self.archives = archives;

                    self.write_json(TRANSACTIONS_KEY, &Vec::<Transaction>::new())?;
                    self.live = TransactionStore::default();
                }
                self.write_marker(self.current_period.clone())
            }
        }
    }

    fn apply_recurring(&mut self) -> Result<(), LedgerError> {
        let mut applied = self.applied.clone();
        let generated = recurring::apply(
            &self.current_period,
            &self.settings.recurring,
            &mut applied,
            &self.settings.currency.base,
        );
        if generated.is_empty() {
            return Ok(());
        }
        let mut live = self.live.clone();
        for tx in generated {
            live.append(tx);
        }
        // The idempotency ledger is written before the transactions so a
        // partial failure can only under-apply, never duplicate.
        self.write_json(RECURRING_APPLIED_KEY, &applied)?;
        self.applied = applied;
        self.write_json(TRANSACTIONS_KEY, &live.list().to_vec())?;
        self.live = live;
        Ok(())
    }

    /// Validates and records a user-entered transaction. Entries dated in
    /// the open period (or later) join the live store; entries dated in a
    /// strictly earlier period are merged into that period's archive and
    /// leave the live store untouched.
    pub fn add_transaction(&mut self, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
        let tx = draft.build(&self.settings.currency)?;
        match route_entry(&tx.period(), &self.current_period) {
            EntryRoute::Live => {
                let mut live = self.live.clone();
                live.append(tx.clone());
                self.write_json(TRANSACTIONS_KEY, &live.list().to_vec())?;
                self.live = live;
            }
            EntryRoute::Archive(period) => {
                tracing::info!(period = %period, "routing entry into past-period archive");
                let mut archives = self.archives.clone();
                archives.merge_transaction(tx.clone(), Utc::now());
                self.write_json(ARCHIVES_KEY, &archives.list().to_vec())?;
                self.archives = archives;
            }
        }
        Ok(tx)
    }

    pub fn remove_transaction(&mut self, id: Uuid) -> Result<Transaction, LedgerError> {
        let mut live = self.live.clone();
        let removed = live.remove(id)?;
        self.write_json(TRANSACTIONS_KEY, &live.list().to_vec())?;
        self.live = live;
        Ok(removed)
    }

    pub fn move_transaction(&mut self, id: Uuid, new_index: usize) -> Result<(), LedgerError> {
        let mut live = self.live.clone();
        live.move_to(id, new_index)?;
        self.write_json(TRANSACTIONS_KEY, &live.list().to_vec())?;
        self.live = live;
        Ok(())
    }

    /// Manual reset: archives the live store under the *current* period key
    /// (replacing any prior record) and clears it. Returns `false` when
    /// there was nothing to archive.
    pub fn archive_current_period(&mut self) -> Result<bool, LedgerError> {
        if self.live.is_empty() {
            return Ok(false);
        }
        let record = PeriodArchive::from_transactions(
            self.current_period.clone(),
            self.live.list().to_vec(),
            self.settings.savings_goal,
            Utc::now(),
        );
        let mut archives = self.archives.clone();
        archives.upsert(record);
        self.write_json(ARCHIVES_KEY, &archives.list().to_vec())?;
        self.archives = archives;

        self.write_json(TRANSACTIONS_KEY, &Vec::<Transaction>::new())?;
        self.live = TransactionStore::default();
        Ok(true)
    }

    pub fn delete_archive(&mut self, period: &PeriodKey) -> Result<bool, LedgerError> {
        let mut archives = self.archives.clone();
        if !archives.delete(period) {
            return Ok(false);
        }
        self.write_json(ARCHIVES_KEY, &archives.list().to_vec())?;
        self.archives = archives;
        Ok(true)
    }

    pub fn add_template(&mut self, template: RecurringTemplate) -> Result<(), LedgerError> {
        if !template.amount.is_finite() || template.amount <= 0.0 {
            return Err(LedgerError::Validation(format!(
                "template amount must be positive, got {}",
                template.amount
            )));
        }
        if template.category.trim().is_empty() {
            return Err(LedgerError::Validation("template category is required".into()));
        }
        let mut settings = self.settings.clone();
        settings.recurring.push(template);
        self.write_json(SETTINGS_KEY, &settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Flips a template's active flag, returning the new state.
    pub fn toggle_template(&mut self, id: Uuid) -> Result<bool, LedgerError> {
        let mut settings = self.settings.clone();
        let template = settings
            .recurring
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::InvalidRef(format!("template {} not found", id)))?;
        template.active = !template.active;
        let state = template.active;
        self.write_json(SETTINGS_KEY, &settings)?;
        self.settings = settings;
        Ok(state)
    }

    pub fn delete_template(&mut self, id: Uuid) -> Result<(), LedgerError> {
        let mut settings = self.settings.clone();
        let before = settings.recurring.len();
        settings.recurring.retain(|t| t.id != id);
        if settings.recurring.len() == before {
            return Err(LedgerError::InvalidRef(format!("template {} not found", id)));
        }
        self.write_json(SETTINGS_KEY, &settings)?;
        self.settings = settings;
        Ok(())
    }

    pub fn set_savings_goal(&mut self, goal: f64) -> Result<(), LedgerError> {
        if !goal.is_finite() || goal < 0.0 {
            return Err(LedgerError::Validation(format!(
                "savings goal must be non-negative, got {}",
                goal
            )));
        }
        let mut settings = self.settings.clone();
        settings.savings_goal = goal;
        self.write_json(SETTINGS_KEY, &settings)?;
        self.settings = settings;
        Ok(())
    }

    pub fn update_rates(
        &mut self,
        rates: HashMap<String, f64>,
        today: NaiveDate,
    ) -> Result<(), LedgerError> {
        let mut settings = self.settings.clone();
        settings.currency.replace_rates(rates, today);
        self.write_json(SETTINGS_KEY, &settings)?;
        self.settings = settings;
        Ok(())
    }

    // --- queries -----------------------------------------------------------

    pub fn current_period(&self) -> &PeriodKey {
        &self.current_period
    }

    pub fn last_closed_period(&self) -> Option<&PeriodKey> {
        self.last_closed.as_ref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.live.list()
    }

    pub fn archives(&self) -> &[PeriodArchive] {
        self.archives.list()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn totals(&self) -> Totals {
        analytics::compute_totals(self.live.list())
    }

    pub fn category_breakdown(&self) -> Vec<CategorySpend> {
        analytics::category_breakdown(self.live.list())
    }

    pub fn advice(&self) -> Vec<AdviceEntry> {
        let totals = self.totals();
        analytics::generate_advice(self.live.list(), &totals)
    }

    pub fn overspent_categories(&self) -> HashSet<String> {
        analytics::find_overspent_categories(self.live.list(), analytics::BALANCE_ALERT_THRESHOLD)
    }

    pub fn overspent_categories_with_threshold(&self, threshold: f64) -> HashSet<String> {
        analytics::find_overspent_categories(self.live.list(), threshold)
    }

    /// Annual aggregate over the archives for `year`, folding in the live
    /// period's totals when the open month belongs to that year.
    pub fn annual_stats(&self, year: &str) -> AnnualAggregate {
        let totals = self.totals();
        let current = if self.current_period.year() == year {
            Some((&self.current_period, &totals))
        } else {
            None
        };
        analytics::annual_aggregate(year, self.archives.list(), current)
    }

    pub fn savings_progress(&self) -> SavingsProgress {
        let goal = self.settings.savings_goal;
        let totals = self.totals();
        let saved = (totals.income - totals.expense).max(0.0);
        let percent = if goal > 0.0 {
            (saved / goal * 100.0).min(100.0)
        } else {
            0.0
        };
        SavingsProgress { goal, saved, percent }
    }

    /// Releases the underlying store, e.g. to reopen a session later.
    pub fn into_store(self) -> S {
        self.store
    }

    // --- persistence helpers ----------------------------------------------

    fn write_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes)
    }

    fn write_marker(&mut self, period: PeriodKey) -> Result<(), LedgerError> {
        self.write_json(LAST_RESET_KEY, &Some(period.clone()))?;
        self.last_closed = Some(period);
        Ok(())
    }
}

fn decode_or_default<T: DeserializeOwned + Default>(
    bytes: Option<Vec<u8>>,
) -> Result<T, LedgerError> {
    match bytes {
        Some(raw) => Ok(serde_json::from_slice(&raw)?),
        None => Ok(T::default()),
    }
}
