//! Moneta Core - client library for a personal finance API
//!
//! This crate implements the client logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Transaction, Summary, Category, DateRange, Session)
//! - **ports**: Trait definitions for external dependencies (FinanceApi, KeyValueStore)
//! - **services**: Business logic orchestration (session, auth, transactions, logging)
//! - **adapters**: Concrete implementations (reqwest HTTP client, JSON file store)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::file_store::JsonFileStore;
use adapters::http::HttpFinanceApi;
use config::Config;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result as CoreResult};
pub use domain::{
    Category, DateRange, Session, Summary, Transaction, TransactionDraft, TransactionForm,
    TransactionType,
};
pub use ports::{Endpoint, FinanceApi, LoginOutcome, RegisterOutcome};
pub use services::{
    AuthService, DashboardView, LogEntry, LogEvent, LoggingService, Mutation, MutationOutcome,
    SessionStore, TransactionService,
};

/// File holding the persisted session
pub const SESSION_FILE: &str = "session.json";

/// Main context for Moneta operations
///
/// Built once per invocation. The session store is shared by the HTTP client
/// and the services, so a login is visible to the next request.
pub struct MonetaContext {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub auth_service: AuthService,
    pub transaction_service: TransactionService,
}

impl MonetaContext {
    /// Create a context rooted at `moneta_dir`
    pub fn new(moneta_dir: &Path) -> Result<Self> {
        let config = Config::load(moneta_dir)?;
        let store = JsonFileStore::new(moneta_dir.join(SESSION_FILE));
        let session = Arc::new(SessionStore::new(Box::new(store)));
        let api: Arc<dyn FinanceApi> =
            Arc::new(HttpFinanceApi::new(&config.api_url, Arc::clone(&session))?);

        Ok(Self::with_api(config, session, api))
    }

    /// Assemble a context around any `FinanceApi` implementation
    pub fn with_api(config: Config, session: Arc<SessionStore>, api: Arc<dyn FinanceApi>) -> Self {
        let auth_service = AuthService::new(Arc::clone(&api), Arc::clone(&session));
        let transaction_service = TransactionService::new(api, Arc::clone(&session));

        Self {
            config,
            session,
            auth_service,
            transaction_service,
        }
    }
}
