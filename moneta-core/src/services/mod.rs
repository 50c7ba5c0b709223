//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod auth;
pub mod logging;
mod session;
mod transactions;

pub use auth::AuthService;
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use session::{SessionStore, TOKEN_KEY, USER_EMAIL_KEY};
pub use transactions::{DashboardView, Mutation, MutationOutcome, TransactionService};
