//! Aggregates over a date range

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::transaction::{Transaction, TransactionType};

/// Server-computed totals for a date range. Read-only; never cached.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Income minus expense
    pub balance: Decimal,
    #[serde(deserialize_with = "deserialize_totals_by_type")]
    pub totals_by_type: BTreeMap<TransactionType, Decimal>,
    /// Raw amount sums keyed by category name, regardless of type
    pub totals_by_category: BTreeMap<String, Decimal>,
}

/// The server groups by the stored type string, so keys may differ in case.
/// Keys naming the same type are added up; keys naming no known type are dropped.
fn deserialize_totals_by_type<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<TransactionType, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Decimal>::deserialize(deserializer)?;

    let mut totals = BTreeMap::new();
    for (key, amount) in raw {
        if let Ok(transaction_type) = key.parse::<TransactionType>() {
            *totals.entry(transaction_type).or_insert(Decimal::ZERO) += amount;
        }
    }
    Ok(totals)
}

impl Summary {
    /// Compute the summary the server would return for these transactions
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut summary = Summary::default();

        for tx in transactions {
            summary.balance += tx.transaction_type.signed(tx.amount);
            *summary
                .totals_by_type
                .entry(tx.transaction_type)
                .or_insert(Decimal::ZERO) += tx.amount;
            *summary
                .totals_by_category
                .entry(tx.category_label().to_string())
                .or_insert(Decimal::ZERO) += tx.amount;
        }

        summary
    }

    /// Total for one type; zero when the server omitted it
    pub fn total(&self, transaction_type: TransactionType) -> Decimal {
        self.totals_by_type
            .get(&transaction_type)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Income minus expense as derived from `totals_by_type`
    pub fn expected_balance(&self) -> Decimal {
        self.total(TransactionType::Income) - self.total(TransactionType::Expense)
    }

    /// Whether `balance` agrees with `totals_by_type`
    pub fn is_consistent(&self) -> bool {
        self.balance == self.expected_balance()
    }
}
