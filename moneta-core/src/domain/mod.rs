//! Core domain entities
//!
//! Plain data structures with validation logic - no I/O.

mod category;
pub mod date_range;
pub mod result;
mod session;
mod summary;
mod transaction;

pub use category::Category;
pub use date_range::DateRange;
pub use session::{bearer, Session};
pub use summary::Summary;
pub use transaction::{
    sort_for_display, Transaction, TransactionDraft, TransactionForm, TransactionType,
};
