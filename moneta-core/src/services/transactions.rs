//! Transaction service - dashboard state and list reconciliation
//!
//! Every create, update and delete is followed by a full re-fetch of the
//! transaction list and the summary. The client never patches its view
//! locally, so what it shows is always what the server returned last.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{
    sort_for_display, DateRange, Session, Summary, Transaction, TransactionForm,
};
use crate::ports::{Endpoint, FinanceApi};
use crate::services::SessionStore;

/// Transactions and totals for one date range, as last fetched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub range: DateRange,
    /// Newest first
    pub transactions: Vec<Transaction>,
    pub summary: Summary,
}

/// Which mutation ran
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Mutation {
    Created { transaction: Transaction },
    Updated { transaction: Transaction },
    Deleted { id: i64 },
}

impl Mutation {
    /// The call that carried out this mutation
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Mutation::Created { .. } => Endpoint::CreateTransaction,
            Mutation::Updated { .. } => Endpoint::UpdateTransaction,
            Mutation::Deleted { .. } => Endpoint::DeleteTransaction,
        }
    }
}

/// Result of a mutation followed by a refresh
///
/// The mutation itself succeeded; `refresh` says whether the view could be
/// re-fetched afterwards.
#[derive(Debug)]
pub struct MutationOutcome {
    pub mutation: Mutation,
    pub refresh: Result<DashboardView>,
    /// Which refresh call failed, when `refresh` is an error
    pub failed_call: Option<Endpoint>,
}

impl MutationOutcome {
    /// The server applied the change but the view is stale
    pub fn is_partial(&self) -> bool {
        self.refresh.is_err()
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.refresh.as_ref().ok()
    }
}

pub struct TransactionService {
    api: Arc<dyn FinanceApi>,
    session: Arc<SessionStore>,
}

impl TransactionService {
    pub fn new(api: Arc<dyn FinanceApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// List and summary for `range`, list sorted for display
    pub fn dashboard(&self, range: &DateRange) -> Result<DashboardView> {
        let session = self.session.guard()?;
        self.fetch(&session, range)
    }

    fn fetch(&self, session: &Session, range: &DateRange) -> Result<DashboardView> {
        self.fetch_traced(session, range).map_err(|(_, e)| e)
    }

    /// Like `fetch`, naming the call that failed
    fn fetch_traced(
        &self,
        session: &Session,
        range: &DateRange,
    ) -> std::result::Result<DashboardView, (Endpoint, Error)> {
        let mut transactions = self
            .api
            .list_transactions_by_email(&session.user_email, range)
            .map_err(|e| (Endpoint::ListTransactions, e))?;
        sort_for_display(&mut transactions);
        let summary = self
            .api
            .get_summary(&session.user_email, range)
            .map_err(|e| (Endpoint::Summary, e))?;

        Ok(DashboardView {
            range: *range,
            transactions,
            summary,
        })
    }

    /// Transactions in `range`, newest first
    pub fn transactions(&self, range: &DateRange) -> Result<Vec<Transaction>> {
        let session = self.session.guard()?;
        let mut transactions = self
            .api
            .list_transactions_by_email(&session.user_email, range)?;
        sort_for_display(&mut transactions);
        Ok(transactions)
    }

    pub fn summary(&self, range: &DateRange) -> Result<Summary> {
        let session = self.session.guard()?;
        self.api.get_summary(&session.user_email, range)
    }

    /// Look a transaction up by id among those in `range`
    ///
    /// The API has no single-transaction endpoint, so this lists the range.
    pub fn find(&self, id: i64, range: &DateRange) -> Result<Transaction> {
        self.transactions(range)?
            .into_iter()
            .find(|tx| tx.id == id)
            .ok_or_else(|| {
                Error::not_found(format!("Transaction {} is not in {}", id, range))
            })
    }

    /// Create a transaction, then refresh `range`
    pub fn create(&self, form: &TransactionForm, range: &DateRange) -> Result<MutationOutcome> {
        let session = self.session.guard()?;
        let draft = form.validate(&session.user_email)?;
        let transaction = self.api.create_transaction(&draft)?;
        Ok(self.refreshed(&session, Mutation::Created { transaction }, range))
    }

    /// Replace transaction `id` with a complete form, then refresh `range`
    pub fn update(
        &self,
        id: i64,
        form: &TransactionForm,
        range: &DateRange,
    ) -> Result<MutationOutcome> {
        let session = self.session.guard()?;
        let draft = form.validate(&session.user_email)?;
        let transaction = self.api.update_transaction(id, &draft)?;
        Ok(self.refreshed(&session, Mutation::Updated { transaction }, range))
    }

    /// Edit transaction `id`: fields set in `changes` replace the current ones
    ///
    /// The current values come from the transaction as listed in `range`.
    pub fn edit(
        &self,
        id: i64,
        changes: TransactionForm,
        range: &DateRange,
    ) -> Result<MutationOutcome> {
        let current = self.find(id, range)?;
        let form = TransactionForm::from_transaction(&current)?.with_overrides(changes);
        self.update(id, &form, range)
    }

    /// Delete transaction `id`, then refresh `range`
    pub fn delete(&self, id: i64, range: &DateRange) -> Result<MutationOutcome> {
        let session = self.session.guard()?;
        self.api.delete_transaction(id)?;
        Ok(self.refreshed(&session, Mutation::Deleted { id }, range))
    }

    fn refreshed(
        &self,
        session: &Session,
        mutation: Mutation,
        range: &DateRange,
    ) -> MutationOutcome {
        match self.fetch_traced(session, range) {
            Ok(view) => MutationOutcome {
                mutation,
                refresh: Ok(view),
                failed_call: None,
            },
            Err((endpoint, e)) => MutationOutcome {
                mutation,
                refresh: Err(e),
                failed_call: Some(endpoint),
            },
        }
    }
}
