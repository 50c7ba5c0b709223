//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::result::{Error, Result};

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Wire name ("INCOME" / "EXPENSE")
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }

    /// Contribution of `amount` to a balance: income adds, expense subtracts
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            other => Err(Error::validation(format!(
                "Unknown transaction type '{}'. Use INCOME or EXPENSE",
                other
            ))),
        }
    }
}

/// A transaction as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    /// Signed amount, never a float
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category_id: i64,
    /// Derived by the server from `category_id`; may be missing
    #[serde(default)]
    pub category_name: Option<String>,
}

impl Transaction {
    /// The known category for `category_id`, if any
    pub fn category(&self) -> Option<Category> {
        Category::from_id(self.category_id)
    }

    /// Name to display for the category: the server's name, then the lookup table, then "N/A"
    pub fn category_label(&self) -> &str {
        if let Some(name) = self.category_name.as_deref().filter(|n| !n.is_empty()) {
            return name;
        }
        self.category().map(Category::name).unwrap_or("N/A")
    }
}

/// Order transactions for display: newest date first.
///
/// The sort is stable, so transactions sharing a date keep the order the
/// server returned them in.
pub fn sort_for_display(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Body of a create or update request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(rename = "categoryId")]
    pub category: Category,
    /// Owner of the transaction; the server resolves the user from it
    pub email: String,
}

/// Unsubmitted transaction form
///
/// Every field may be missing. [`TransactionForm::validate`] turns a complete
/// form into a [`TransactionDraft`] before anything is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<Category>,
}

impl Default for TransactionForm {
    /// A fresh form: an expense in the first category, everything else empty
    fn default() -> Self {
        Self {
            transaction_type: Some(TransactionType::Expense),
            category: Some(Category::Food),
            ..Self::blank()
        }
    }
}

impl TransactionForm {
    /// A form with no field set, used to carry partial edits
    pub fn blank() -> Self {
        Self {
            description: None,
            amount: None,
            date: None,
            transaction_type: None,
            category: None,
        }
    }

    /// A form pre-filled from an existing transaction, for editing
    ///
    /// Fails when the transaction points at a category this client doesn't know.
    pub fn from_transaction(tx: &Transaction) -> Result<Self> {
        let category = tx.category().ok_or_else(|| {
            Error::validation(format!(
                "Transaction {} has unknown category id {}",
                tx.id, tx.category_id
            ))
        })?;

        Ok(Self {
            description: Some(tx.description.clone()),
            amount: Some(tx.amount),
            date: Some(tx.date),
            transaction_type: Some(tx.transaction_type),
            category: Some(category),
        })
    }

    /// Overlay every field that is set in `overrides`
    pub fn with_overrides(self, overrides: TransactionForm) -> Self {
        Self {
            description: overrides.description.or(self.description),
            amount: overrides.amount.or(self.amount),
            date: overrides.date.or(self.date),
            transaction_type: overrides.transaction_type.or(self.transaction_type),
            category: overrides.category.or(self.category),
        }
    }

    /// Check that all required fields are present and build the request body
    pub fn validate(&self, email: &str) -> Result<TransactionDraft> {
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::validation("Description is required"))?;
        let amount = self
            .amount
            .ok_or_else(|| Error::validation("Amount is required"))?;
        let date = self
            .date
            .ok_or_else(|| Error::validation("Date is required"))?;
        let transaction_type = self
            .transaction_type
            .ok_or_else(|| Error::validation("Type is required"))?;
        let category = self
            .category
            .ok_or_else(|| Error::validation("Category is required"))?;

        if email.trim().is_empty() {
            return Err(Error::validation("Owner email is required"));
        }

        Ok(TransactionDraft {
            description: description.to_string(),
            amount,
            date,
            transaction_type,
            category,
            email: email.trim().to_string(),
        })
    }
}
