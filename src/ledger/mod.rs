//! Ledger domain models: the live monthly store, recurring templates, the
//! closed-period archive, and the rollover state machine.

pub mod archive;
pub mod period;
pub mod recurring;
pub mod rollover;
pub mod store;
pub mod transaction;

pub use archive::{ArchiveRepository, PeriodArchive};
pub use period::PeriodKey;
pub use recurring::{ApplicationLedger, RecurringTemplate};
pub use rollover::{plan, route_entry, EntryRoute, RolloverAction};
pub use store::TransactionStore;
pub use transaction::{Transaction, TransactionDraft, TransactionKind};
