//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the FinanceApi port
//! - JSON file and in-memory stores for the KeyValueStore port

pub mod file_store;
pub mod http;
pub mod memory_store;

#[cfg(test)]
pub mod mock_server;
