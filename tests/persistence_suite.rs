use budgetflow_core::currency::CurrencyCode;
use budgetflow_core::ledger::{RecurringTemplate, TransactionDraft, TransactionKind};
use budgetflow_core::session::Session;
use budgetflow_core::storage::{
    JsonStore, ARCHIVES_KEY, LAST_RESET_KEY, RECURRING_APPLIED_KEY, SETTINGS_KEY, TRANSACTIONS_KEY,
};
use chrono::NaiveDate;
use tempfile::TempDir;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn draft(kind: TransactionKind, amount: f64, category: &str, on: NaiveDate) -> TransactionDraft {
    TransactionDraft {
        kind,
        amount,
        currency: CurrencyCode::new("EUR"),
        category: category.into(),
        date: on,
        description: String::new(),
    }
}

fn open(root: &TempDir, user: &str) -> JsonStore {
    JsonStore::new(Some(root.path().to_path_buf()), user).expect("json store")
}

#[test]
fn session_state_survives_reopening_the_same_directory() {
    let root = TempDir::new().unwrap();

    {
        let mut session = Session::start(open(&root, "alice"), date(2024, 6, 5)).unwrap();
        session
            .add_transaction(draft(TransactionKind::Income, 1800.0, "Salary", date(2024, 6, 1)))
            .unwrap();
        session
            .add_transaction(draft(TransactionKind::Expense, 220.0, "Groceries", date(2024, 6, 4)))
            .unwrap();
        session.set_savings_goal(500.0).unwrap();
        session
            .add_template(RecurringTemplate::new(
                TransactionKind::Expense,
                45.0,
                "Bills",
                "Internet",
                3,
            ))
            .unwrap();
    }

    let session = Session::start(open(&root, "alice"), date(2024, 6, 6)).unwrap();
    // Two manual entries plus the recurring application that fired on reopen.
    assert_eq!(session.transactions().len(), 3);
    assert_eq!(session.settings().savings_goal, 500.0);
    assert_eq!(session.settings().recurring.len(), 1);
    assert_eq!(session.totals().income, 1800.0);
    assert_eq!(session.totals().expense, 220.0 + 45.0);
}

#[test]
fn rollover_across_reopen_writes_the_archive_file() {
    let root = TempDir::new().unwrap();

    {
        let mut session = Session::start(open(&root, "alice"), date(2024, 5, 20)).unwrap();
        session
            .add_transaction(draft(TransactionKind::Income, 900.0, "Salary", date(2024, 5, 1)))
            .unwrap();
        session
            .add_template(RecurringTemplate::new(
                TransactionKind::Expense,
                35.0,
                "Bills",
                "Phone",
                2,
            ))
            .unwrap();
    }

    let session = Session::start(open(&root, "alice"), date(2024, 6, 1)).unwrap();
    // The May entry rolled into the archive; June holds only the freshly
    // materialized recurring expense.
    assert_eq!(session.transactions().len(), 1);
    assert!(session.transactions()[0].recurring);
    assert_eq!(session.archives().len(), 1);
    assert_eq!(session.archives()[0].income, 900.0);

    let user_dir = root.path().join("users").join("alice");
    for key in [
        TRANSACTIONS_KEY,
        ARCHIVES_KEY,
        SETTINGS_KEY,
        LAST_RESET_KEY,
        RECURRING_APPLIED_KEY,
    ] {
        assert!(
            user_dir.join(format!("{}.json", key)).exists(),
            "missing {}.json",
            key
        );
    }
}

#[test]
fn users_do_not_see_each_other() {
    let root = TempDir::new().unwrap();

    {
        let mut session = Session::start(open(&root, "alice"), date(2024, 6, 5)).unwrap();
        session
            .add_transaction(draft(TransactionKind::Expense, 50.0, "Leisure", date(2024, 6, 4)))
            .unwrap();
    }

    let session = Session::start(open(&root, "bob"), date(2024, 6, 5)).unwrap();
    assert!(session.transactions().is_empty());
}

#[test]
fn stored_blobs_are_plain_json() {
    let root = TempDir::new().unwrap();

    {
        let mut session = Session::start(open(&root, "alice"), date(2024, 6, 5)).unwrap();
        session
            .add_transaction(draft(TransactionKind::Expense, 12.5, "Transport", date(2024, 6, 4)))
            .unwrap();
    }

    let blob = std::fs::read_to_string(
        root.path()
            .join("users")
            .join("alice")
            .join(format!("{}.json", TRANSACTIONS_KEY)),
    )
    .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&blob).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "Transport");
    assert_eq!(entries[0]["kind"], "expense");
}
