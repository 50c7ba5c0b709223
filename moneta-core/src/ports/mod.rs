//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on concrete implementations.

mod finance_api;
mod key_value;

pub use finance_api::{Endpoint, FinanceApi, LoginOutcome, RegisterOutcome};
pub use key_value::KeyValueStore;
