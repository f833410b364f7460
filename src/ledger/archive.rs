use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{compute_totals, generate_advice, AdviceEntry};

use super::period::PeriodKey;
use super::transaction::Transaction;

/// Immutable snapshot of a closed period: its transactions plus derived
/// totals and advice frozen at archival time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodArchive {
    pub period: PeriodKey,
    pub transactions: Vec<Transaction>,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    #[serde(default)]
    pub advice: Vec<AdviceEntry>,
    #[serde(default)]
    pub savings_goal: f64,
    #[serde(default)]
    pub saved_amount: f64,
    pub archived_at: DateTime<Utc>,
}

impl PeriodArchive {
    /// Builds a record from a period's transactions, computing the totals
    /// and advice snapshot.
    pub fn from_transactions(
        period: PeriodKey,
        transactions: Vec<Transaction>,
        savings_goal: f64,
        archived_at: DateTime<Utc>,
    ) -> Self {
        let totals = compute_totals(&transactions);
        let advice = generate_advice(&transactions, &totals);
        Self {
            period,
            transactions,
            income: totals.income,
            expense: totals.expense,
            balance: totals.balance,
            advice,
            savings_goal,
            saved_amount: (totals.income - totals.expense).max(0.0),
            archived_at,
        }
    }

    fn recompute(&mut self) {
        let totals = compute_totals(&self.transactions);
        self.income = totals.income;
        self.expense = totals.expense;
        self.balance = totals.balance;
        self.advice = generate_advice(&self.transactions, &totals);
        self.saved_amount = (totals.income - totals.expense).max(0.0);
    }
}

/// Collection of closed-period records, at most one per period key, kept
/// sorted descending by key (string order matches chronology for the
/// fixed-width format).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveRepository {
    records: Vec<PeriodArchive>,
}

impl ArchiveRepository {
    pub fn new(mut records: Vec<PeriodArchive>) -> Self {
        sort_descending(&mut records);
        Self { records }
    }

    /// Replaces any record with the same period, else inserts.
    pub fn upsert(&mut self, record: PeriodArchive) {
        match self.records.iter_mut().find(|r| r.period == record.period) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        sort_descending(&mut self.records);
    }

    pub fn delete(&mut self, period: &PeriodKey) -> bool {
        let before = self.records.len();
        self.records.retain(|r| &r.period != period);
        before != self.records.len()
    }

    pub fn get(&self, period: &PeriodKey) -> Option<&PeriodArchive> {
        self.records.iter().find(|r| &r.period == period)
    }

    /// Current records, newest period first. The slice is a view; callers
    /// must not assume it stays valid across mutations.
    pub fn list(&self) -> &[PeriodArchive] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Out-of-period insertion: finds or creates the record for the
    /// transaction's own period, prepends the entry, and recomputes the
    /// derived snapshot over the full updated list.
    pub fn merge_transaction(&mut self, tx: Transaction, now: DateTime<Utc>) {
        let period = tx.period();
        let record = match self.records.iter_mut().find(|r| r.period == period) {
            Some(record) => record,
            None => {
                self.records.push(PeriodArchive {
                    period: period.clone(),
                    transactions: Vec::new(),
                    income: 0.0,
                    expense: 0.0,
                    balance: 0.0,
                    advice: Vec::new(),
                    savings_goal: 0.0,
                    saved_amount: 0.0,
                    archived_at: now,
                });
                self.records.last_mut().expect("just pushed")
            }
        };
        record.transactions.insert(0, tx);
        record.recompute();
        sort_descending(&mut self.records);
        tracing::debug!(period = %period, "merged out-of-period transaction into archive");
    }
}

fn sort_descending(records: &mut [PeriodArchive]) {
    records.sort_by(|a, b| b.period.cmp(&a.period));
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use crate::currency::CurrencyCode;
    use crate::ledger::transaction::TransactionKind;

    use super::*;

    fn tx(kind: TransactionKind, amount: f64, date: NaiveDate) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            kind,
            amount,
            currency: CurrencyCode::default(),
            amount_base: amount,
            category: "Bills".into(),
            date,
            description: "Bills".into(),
            recurring: false,
        }
    }

    fn archive_for(raw: &str) -> PeriodArchive {
        let period = PeriodKey::parse(raw).unwrap();
        let date = period.date_on(10);
        PeriodArchive::from_transactions(
            period,
            vec![tx(TransactionKind::Expense, 50.0, date)],
            0.0,
            Utc::now(),
        )
    }

    #[test]
    fn upsert_keeps_descending_order_and_unique_keys() {
        let mut repo = ArchiveRepository::default();
        repo.upsert(archive_for("2024-03"));
        repo.upsert(archive_for("2024-05"));
        repo.upsert(archive_for("2024-04"));

        let keys: Vec<&str> = repo.list().iter().map(|a| a.period.as_str()).collect();
        assert_eq!(keys, vec!["2024-05", "2024-04", "2024-03"]);

        // Replacing an existing key must not duplicate it.
        repo.upsert(archive_for("2024-04"));
        assert_eq!(repo.list().len(), 3);
    }

    #[test]
    fn delete_removes_record() {
        let mut repo = ArchiveRepository::default();
        repo.upsert(archive_for("2024-03"));
        assert!(repo.delete(&PeriodKey::parse("2024-03").unwrap()));
        assert!(!repo.delete(&PeriodKey::parse("2024-03").unwrap()));
        assert!(repo.is_empty());
    }

    #[test]
    fn from_transactions_derives_totals_and_saved_amount() {
        let period = PeriodKey::parse("2024-02").unwrap();
        let txs = vec![
            tx(TransactionKind::Income, 900.0, period.date_on(1)),
            tx(TransactionKind::Expense, 300.0, period.date_on(8)),
        ];
        let archive = PeriodArchive::from_transactions(period, txs, 200.0, Utc::now());
        assert_eq!(archive.income, 900.0);
        assert_eq!(archive.expense, 300.0);
        assert_eq!(archive.balance, 600.0);
        assert_eq!(archive.saved_amount, 600.0);
        assert_eq!(archive.savings_goal, 200.0);
        assert!(!archive.advice.is_empty());
    }

    #[test]
    fn merge_creates_record_and_recomputes() {
        let mut repo = ArchiveRepository::default();
        repo.upsert(archive_for("2024-05"));

        let date = NaiveDate::from_ymd_opt(2024, 4, 12).unwrap();
        repo.merge_transaction(tx(TransactionKind::Expense, 75.0, date), Utc::now());

        let merged = repo.get(&PeriodKey::parse("2024-04").unwrap()).unwrap();
        assert_eq!(merged.expense, 75.0);
        assert_eq!(merged.balance, -75.0);
        assert_eq!(merged.transactions.len(), 1);

        let keys: Vec<&str> = repo.list().iter().map(|a| a.period.as_str()).collect();
        assert_eq!(keys, vec!["2024-05", "2024-04"]);
    }

    #[test]
    fn merge_prepends_into_existing_record() {
        let mut repo = ArchiveRepository::default();
        repo.upsert(archive_for("2024-04"));

        let date = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
        repo.merge_transaction(tx(TransactionKind::Income, 40.0, date), Utc::now());

        let record = repo.get(&PeriodKey::parse("2024-04").unwrap()).unwrap();
        assert_eq!(record.transactions.len(), 2);
        assert_eq!(record.transactions[0].kind, TransactionKind::Income);
        assert_eq!(record.balance, 40.0 - 50.0);
    }
}
