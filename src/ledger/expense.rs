use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{BudgetError, Result},
    money::Money,
};

use super::category::Category;

/// Identifier of an expense or external-income entry.
///
/// Derived from the creation instant in milliseconds and kept strictly
/// increasing per state, so ordering by id matches creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl EntryId {
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        EntryId(instant.timestamp_millis())
    }

    /// Smallest id that is both derived from `instant` and greater than `previous`.
    pub fn next_after(previous: Option<EntryId>, instant: DateTime<Utc>) -> Self {
        let candidate = Self::from_instant(instant);
        match previous {
            Some(prev) if prev >= candidate => EntryId(prev.0 + 1),
            _ => candidate,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: EntryId,
    pub amount: Money,
    pub category: Category,
    pub description: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

/// Validated input for a new expense, before it is given an id.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub amount: Money,
    pub category: Category,
    pub description: String,
    pub date: NaiveDate,
}

impl ExpenseDraft {
    pub fn new(
        amount: Money,
        category: Category,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self> {
        if !amount.is_positive() {
            return Err(BudgetError::InvalidAmount(format!(
                "expense amount must be greater than zero (got {amount})"
            )));
        }
        let amount = amount.within_limit()?;
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(BudgetError::MissingField("description"));
        }
        Ok(Self {
            amount,
            category,
            description,
            date,
        })
    }

    /// Builds a draft from raw form values.
    pub fn from_input(
        amount: &str,
        category: &str,
        description: &str,
        date: Option<NaiveDate>,
    ) -> Result<Self> {
        let category: Category = category.parse()?;
        let amount = Money::parse(amount)?;
        let date = date.ok_or(BudgetError::MissingField("date"))?;
        Self::new(amount, category, description, date)
    }

    pub fn into_expense(self, id: EntryId, timestamp: DateTime<Utc>) -> Expense {
        Expense {
            id,
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date,
            timestamp,
        }
    }
}

/// Income received outside the monthly allowance. Informational history only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalIncomeRecord {
    pub id: EntryId,
    pub amount: Money,
    pub description: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}
