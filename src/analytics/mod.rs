//! Pure query functions over transaction lists and archive records. Nothing
//! here mutates state, so any presentation layer can recompute views without
//! coupling to the core's mutation order.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ledger::archive::PeriodArchive;
use crate::ledger::period::PeriodKey;
use crate::ledger::transaction::{Transaction, TransactionKind};

/// Balance level at or below which the low-balance alert fires.
pub const BALANCE_ALERT_THRESHOLD: f64 = 300.0;

/// Reference share of total expense each category should stay under, with
/// an advisory tip. Categories absent here get a generic tip and no target.
static CATEGORY_TARGETS: Lazy<HashMap<&'static str, (f64, &'static str)>> = Lazy::new(|| {
    HashMap::from([
        (
            "Groceries",
            (0.20, "Plan meals ahead, shop with a list, and compare store prices."),
        ),
        (
            "Daily essentials",
            (0.10, "Curb impulse purchases by setting a small daily budget."),
        ),
        (
            "Transport",
            (0.10, "Consider carpooling, public transport, or cycling to cut costs."),
        ),
        (
            "Housing",
            (0.35, "Review energy and insurance contracts for better offers."),
        ),
        (
            "Leisure",
            (0.10, "Set a weekly leisure budget and favor free activities."),
        ),
        (
            "Health",
            (0.05, "Compare insurance plans and check your reimbursements."),
        ),
        (
            "Shopping",
            (0.05, "Apply the 48-hour rule: wait two days before any non-essential buy."),
        ),
        (
            "Bills",
            (0.10, "Renegotiate subscriptions and cancel the ones you no longer use."),
        ),
        (
            "Other expenses",
            (0.05, "Identify and categorize these expenses to keep them in check."),
        ),
    ])
});

const GENERIC_TIP: &str = "Watch this category and set yourself a monthly cap.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

/// Sums `amount_base` per kind; `balance = income - expense` by construction.
pub fn compute_totals(txs: &[Transaction]) -> Totals {
    let mut totals = Totals::default();
    for tx in txs {
        match tx.kind {
            TransactionKind::Income => totals.income += tx.amount_base,
            TransactionKind::Expense => totals.expense += tx.amount_base,
        }
    }
    totals.balance = totals.income - totals.expense;
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: f64,
}

/// Expense totals grouped by category, largest first.
pub fn category_breakdown(txs: &[Transaction]) -> Vec<CategorySpend> {
    let mut grouped: HashMap<&str, f64> = HashMap::new();
    for tx in txs {
        if tx.kind == TransactionKind::Expense {
            *grouped.entry(tx.category.as_str()).or_default() += tx.amount_base;
        }
    }
    let mut breakdown: Vec<CategorySpend> = grouped
        .into_iter()
        .map(|(category, amount)| CategorySpend {
            category: category.to_string(),
            amount,
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// Per-category budget assessment derived from the breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceEntry {
    pub category: String,
    pub amount: f64,
    /// Share of total expense, in percent.
    pub percent_of_expense: f64,
    /// Reference share in percent, when the category has one.
    pub target_percent: Option<f64>,
    pub is_over_target: bool,
    /// `income * target` when the category runs over and income is known.
    pub suggested_cap: Option<f64>,
    pub tip: String,
}

/// Assesses every spending category against its reference share. Returns an
/// empty list when there are no expenses.
pub fn generate_advice(txs: &[Transaction], totals: &Totals) -> Vec<AdviceEntry> {
    category_breakdown(txs)
        .into_iter()
        .map(|spend| {
            let percent = if totals.expense > 0.0 {
                spend.amount / totals.expense * 100.0
            } else {
                0.0
            };
            match CATEGORY_TARGETS.get(spend.category.as_str()) {
                Some((target, tip)) => {
                    let target_percent = target * 100.0;
                    let is_over_target = percent > target_percent;
                    let suggested_cap = if is_over_target && totals.income > 0.0 {
                        Some(totals.income * target)
                    } else {
                        None
                    };
                    AdviceEntry {
                        category: spend.category,
                        amount: spend.amount,
                        percent_of_expense: percent,
                        target_percent: Some(target_percent),
                        is_over_target,
                        suggested_cap,
                        tip: (*tip).to_string(),
                    }
                }
                None => AdviceEntry {
                    category: spend.category,
                    amount: spend.amount,
                    percent_of_expense: percent,
                    target_percent: None,
                    is_over_target: false,
                    suggested_cap: None,
                    tip: GENERIC_TIP.to_string(),
                },
            }
        })
        .collect()
}

/// Walks the transactions oldest-first with a running balance and flags the
/// category of every expense that leaves the balance at or below the
/// threshold.
pub fn find_overspent_categories(txs: &[Transaction], threshold: f64) -> HashSet<String> {
    let mut chronological: Vec<&Transaction> = txs.iter().collect();
    chronological.sort_by_key(|tx| tx.date);

    let mut running = 0.0;
    let mut overspent = HashSet::new();
    for tx in chronological {
        match tx.kind {
            TransactionKind::Income => running += tx.amount_base,
            TransactionKind::Expense => {
                running -= tx.amount_base;
                if running <= threshold {
                    overspent.insert(tx.category.clone());
                }
            }
        }
    }
    overspent
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBalance {
    pub period: PeriodKey,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnualAggregate {
    pub total_income: f64,
    pub total_expense: f64,
    pub total_balance: f64,
    pub avg_income: f64,
    pub avg_expense: f64,
    pub month_count: usize,
    pub best_month: Option<MonthBalance>,
    pub worst_month: Option<MonthBalance>,
    pub savings_rate_percent: f64,
}

/// Aggregates every archive whose period falls in `year`, plus the live
/// period's totals when the caller passes them (the live month belongs to
/// the selected year). Best and worst months are chosen by balance; ties go
/// to the first month encountered.
pub fn annual_aggregate(
    year: &str,
    archives: &[PeriodArchive],
    current: Option<(&PeriodKey, &Totals)>,
) -> AnnualAggregate {
    let mut aggregate = AnnualAggregate::default();
    let mut months: Vec<MonthBalance> = Vec::new();

    for archive in archives.iter().filter(|a| a.period.year() == year) {
        aggregate.total_income += archive.income;
        aggregate.total_expense += archive.expense;
        months.push(MonthBalance {
            period: archive.period.clone(),
            balance: archive.balance,
        });
    }
    if let Some((period, totals)) = current {
        aggregate.total_income += totals.income;
        aggregate.total_expense += totals.expense;
        months.push(MonthBalance {
            period: period.clone(),
            balance: totals.balance,
        });
    }

    aggregate.month_count = months.len();
    aggregate.total_balance = aggregate.total_income - aggregate.total_expense;
    if aggregate.month_count > 0 {
        aggregate.avg_income = aggregate.total_income / aggregate.month_count as f64;
        aggregate.avg_expense = aggregate.total_expense / aggregate.month_count as f64;
    }
    for month in months {
        let replace_best = aggregate
            .best_month
            .as_ref()
            .map(|best| month.balance > best.balance)
            .unwrap_or(true);
        if replace_best {
            aggregate.best_month = Some(month.clone());
        }
        let replace_worst = aggregate
            .worst_month
            .as_ref()
            .map(|worst| month.balance < worst.balance)
            .unwrap_or(true);
        if replace_worst {
            aggregate.worst_month = Some(month);
        }
    }
    if aggregate.total_income > 0.0 {
        aggregate.savings_rate_percent = aggregate.total_balance / aggregate.total_income * 100.0;
    }
    aggregate
}
