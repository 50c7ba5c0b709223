//! Key-value storage port - durable home of the session

use crate::domain::result::Result;

/// Durable string key-value storage
///
/// Implementations must survive process restarts when they are meant to
/// persist a session. Methods take `&self`; implementations provide their own
/// interior mutability.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never set or was removed
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
