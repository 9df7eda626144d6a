//! Keyed stores for the circulation system
//!
//! Three stores, each a sharded concurrent map with per-record atomicity:
//! - [`CatalogStore`]: Book records keyed by id, with an ISBN index for dedup
//! - [`MembershipStore`]: Member records keyed by id, with an email index
//! - [`LoanLedger`]: Loan records; owns the Active→Returned transition
//!
//! ## Concurrency
//!
//! There is no global lock across unrelated records. Each mutation runs
//! under the map's entry guard for that one record; the `*_and` /
//! `close_with` / `remove_if` closure hooks let the engine extend a guard
//! over a dependent write or check, which is how cross-store units (stock
//! decrement + loan open, debt + stock + loan close, guarded deletes)
//! stay atomic. All such units acquire guards in the fixed order
//! member → book → loan.
//!
//! ## Ownership
//!
//! The stores own record identity and uniqueness constraints only. Business
//! rules (eligibility, delete refusals) live in the engine.

pub mod catalog;
pub mod ledger;
pub mod members;

pub use catalog::CatalogStore;
pub use ledger::LoanLedger;
pub use members::MembershipStore;
