#![doc(test(attr(deny(warnings))))]

//! BudgetFlow Core tracks a user's monthly income and expense ledger:
//! period rollover into immutable archives, exactly-once application of
//! recurring templates, currency normalization to a base currency, and
//! derived spending analytics.

pub mod analytics;
pub mod config;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("BudgetFlow Core tracing initialized.");
    });
}
