//! Finance API port
//!
//! Defines the interface to the remote finance server: authentication,
//! transaction CRUD and the date-ranged summary.

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{DateRange, Summary, Transaction, TransactionDraft};

/// Operations of the finance API, named by route template
///
/// Templates never carry ids or emails, so they are safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endpoint {
    Login,
    Register,
    ListTransactions,
    Summary,
    CreateTransaction,
    UpdateTransaction,
    DeleteTransaction,
}

impl Endpoint {
    pub fn template(self) -> &'static str {
        match self {
            Endpoint::Login => "POST /auth/login",
            Endpoint::Register => "POST /auth/register",
            Endpoint::ListTransactions => "GET /transactions/by-email/{email}",
            Endpoint::Summary => "GET /transactions/summary/by-email",
            Endpoint::CreateTransaction => "POST /transactions",
            Endpoint::UpdateTransaction => "PUT /transactions/{id}",
            Endpoint::DeleteTransaction => "DELETE /transactions/{id}",
        }
    }
}

/// Classified result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginOutcome {
    /// The server issued a token for this email
    Authenticated { token: String, email: String },
    /// The server answered but refused the credentials
    Rejected { message: String },
}

/// Classified result of a registration attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegisterOutcome {
    /// Account created; the user still has to log in
    Registered { email: String, message: String },
    /// The server refused the registration (e.g. email already in use)
    Rejected { message: String },
}

/// Remote finance API
///
/// Implementations decorate requests with the current session's bearer token
/// (except for the auth endpoints) and normalize response shapes. They never
/// retry and never cache.
pub trait FinanceApi: Send + Sync {
    /// Exchange credentials for a token. Does not touch the session.
    fn login(&self, email: &str, password: &str) -> Result<LoginOutcome>;

    /// Create an account. Does not authenticate.
    fn register(&self, name: &str, email: &str, password: &str) -> Result<RegisterOutcome>;

    /// Transactions owned by `email` whose date lies in `range`, in server order
    fn list_transactions_by_email(
        &self,
        email: &str,
        range: &DateRange,
    ) -> Result<Vec<Transaction>>;

    /// Create a transaction
    fn create_transaction(&self, draft: &TransactionDraft) -> Result<Transaction>;

    /// Replace transaction `id`
    fn update_transaction(&self, id: i64, draft: &TransactionDraft) -> Result<Transaction>;

    /// Remove transaction `id`
    fn delete_transaction(&self, id: i64) -> Result<()>;

    /// Totals for `email` over `range`
    fn get_summary(&self, email: &str, range: &DateRange) -> Result<Summary>;
}
