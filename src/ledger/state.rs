use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::{
    account::IncomeAccounts,
    bucket::WeekBuckets,
    category::Category,
    expense::{EntryId, Expense, ExternalIncomeRecord},
    plan::BudgetPlan,
};

/// The whole budget for one month: plan, buckets, accounts and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    #[serde(default)]
    pub plan: BudgetPlan,
    #[serde(default)]
    pub needs: WeekBuckets,
    #[serde(default)]
    pub income: IncomeAccounts,
    /// Expense ids, most recent first.
    #[serde(default)]
    pub history: Vec<EntryId>,
    #[serde(default)]
    pub external_income: Vec<ExternalIncomeRecord>,
    /// First day of the month this state belongs to.
    pub month_anchor: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_entry_id: Option<EntryId>,
}

impl BudgetState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            plan: BudgetPlan::default(),
            needs: WeekBuckets::default(),
            income: IncomeAccounts::default(),
            history: Vec::new(),
            external_income: Vec::new(),
            month_anchor: month_start(today),
            last_entry_id: None,
        }
    }

    /// Id the next entry would receive. Does not reserve it.
    pub fn entry_id_after(&self, now: DateTime<Utc>) -> EntryId {
        EntryId::next_after(self.last_entry_id, now)
    }

    pub fn record_entry_id(&mut self, id: EntryId) {
        if self.last_entry_id.map_or(true, |last| id > last) {
            self.last_entry_id = Some(id);
        }
    }

    pub fn find_expense(&self, id: EntryId) -> Option<&Expense> {
        self.needs
            .iter()
            .flat_map(|bucket| bucket.expenses.iter())
            .chain(self.income.iter().flat_map(|account| account.expenses.iter()))
            .find(|expense| expense.id == id)
    }

    /// Owner of an expense, scanning buckets before accounts.
    pub fn locate_expense(&self, id: EntryId) -> Option<Category> {
        if let Some(bucket) = self.needs.iter().find(|bucket| bucket.contains(id)) {
            return Some(Category::Bucket(bucket.key));
        }
        self.income
            .iter()
            .find(|account| account.contains(id))
            .map(|account| Category::Account(account.kind))
    }

    pub fn expense_count(&self) -> usize {
        self.needs.iter().map(|bucket| bucket.expenses.len()).sum::<usize>()
            + self.income.iter().map(|account| account.expenses.len()).sum::<usize>()
    }

    pub fn total_external_income(&self) -> Money {
        self.external_income.iter().map(|record| record.amount).sum()
    }

    pub fn is_current_month(&self, today: NaiveDate) -> bool {
        self.month_anchor.year() == today.year() && self.month_anchor.month() == today.month()
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
