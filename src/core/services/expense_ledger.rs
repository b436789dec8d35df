//! Routing expenses to their bucket or account and keeping the unified history.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::{
    errors::{BudgetError, Result},
    ledger::{AccountKind, BudgetState, Category, EntryId, Expense, ExpenseDraft},
    money::Money,
};

/// An expense that was just recorded, with the bucket overspend it caused.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedExpense {
    pub expense: Expense,
    pub overspend: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Need,
    Savings,
    Personal,
}

impl From<Category> for TransactionKind {
    fn from(category: Category) -> Self {
        match category {
            Category::Bucket(_) => TransactionKind::Need,
            Category::Account(AccountKind::Savings) => TransactionKind::Savings,
            Category::Account(AccountKind::Personal) => TransactionKind::Personal,
        }
    }
}

/// One row of the recent-activity feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionView<'a> {
    pub expense: &'a Expense,
    pub kind: TransactionKind,
    pub label: &'static str,
    /// Remaining amount of the owning bucket, or balance of the owning account.
    pub balance: Money,
}

pub struct ExpenseLedger;

impl ExpenseLedger {
    /// Validates `draft` against the current state without changing it and
    /// returns how far it would overspend its bucket.
    pub fn check(state: &BudgetState, draft: &ExpenseDraft) -> Result<Option<Money>> {
        match draft.category {
            Category::Bucket(key) => {
                let bucket = state.needs.get(key);
                bucket.ensure_open()?;
                Ok(bucket.overspend_for(draft.amount))
            }
            Category::Account(kind) => {
                state.income.get(kind).check_debit(draft.amount)?;
                Ok(None)
            }
        }
    }

    /// Records the expense in its bucket or account, then in the history.
    /// Nothing changes when routing fails.
    pub fn add(state: &mut BudgetState, draft: ExpenseDraft, now: DateTime<Utc>) -> Result<AddedExpense> {
        let id = state.entry_id_after(now);
        let expense = draft.into_expense(id, now);
        let overspend = match expense.category {
            Category::Bucket(key) => {
                let bucket = state.needs.get_mut(key);
                bucket.post_expense(expense.clone())?;
                let remaining = bucket.remaining();
                remaining.is_negative().then(|| remaining.abs())
            }
            Category::Account(kind) => {
                state.income.get_mut(kind).debit(expense.clone())?;
                None
            }
        };
        state.history.insert(0, id);
        state.record_entry_id(id);

        info!(
            id = %id,
            category = expense.category.key(),
            amount = %expense.amount,
            "expense recorded"
        );
        Ok(AddedExpense { expense, overspend })
    }

    /// Removes an expense and reverses its effect on the owner.
    pub fn delete(state: &mut BudgetState, id: EntryId) -> Result<Expense> {
        let owner = state.locate_expense(id).ok_or(BudgetError::NotFound(id))?;
        let expense = match owner {
            Category::Bucket(key) => state.needs.get_mut(key).reverse_expense(id)?,
            Category::Account(kind) => state.income.get_mut(kind).refund_expense(id)?,
        };
        state.history.retain(|entry| *entry != id);

        info!(id = %id, category = owner.key(), amount = %expense.amount, "expense deleted");
        Ok(expense)
    }

    /// Expenses in history order, newest first.
    pub fn history(state: &BudgetState) -> impl Iterator<Item = &Expense> + Clone + '_ {
        state
            .history
            .iter()
            .filter_map(move |id| state.find_expense(*id))
    }

    /// Newest expenses across buckets and accounts, ordered by date then
    /// creation time. The iterator can be cloned to walk the feed again.
    pub fn recent_transactions(
        state: &BudgetState,
        limit: usize,
    ) -> impl Iterator<Item = TransactionView<'_>> + Clone + '_ {
        let mut rows: Vec<(&Expense, Money)> = state
            .needs
            .iter()
            .flat_map(|bucket| {
                let remaining = bucket.remaining();
                bucket.expenses.iter().map(move |expense| (expense, remaining))
            })
            .chain(state.income.iter().flat_map(|account| {
                let balance = account.balance;
                account.expenses.iter().map(move |expense| (expense, balance))
            }))
            .collect();
        rows.sort_by_key(|(expense, _)| Reverse(sort_key(expense)));
        debug!(total = rows.len(), limit, "building recent transactions");

        rows.into_iter().take(limit).map(|(expense, balance)| TransactionView {
            expense,
            kind: TransactionKind::from(expense.category),
            label: expense.category.label(),
            balance,
        })
    }
}

fn sort_key(expense: &Expense) -> (NaiveDate, DateTime<Utc>, EntryId) {
    (expense.date, expense.timestamp, expense.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::PlanService;
    use crate::ledger::BucketKey;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 9, 10, 0, 0).unwrap()
    }

    fn planned_state() -> BudgetState {
        let mut state = BudgetState::new(now().date_naive());
        PlanService::commit(&mut state, Money::from_units(10_000), Money::from_units(3_000))
            .unwrap();
        state
    }

    fn draft(amount: i64, category: Category, day: u32) -> ExpenseDraft {
        ExpenseDraft::new(
            Money::from_units(amount),
            category,
            "groceries",
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn add_routes_and_prepends_history() {
        let mut state = planned_state();
        let first = ExpenseLedger::add(&mut state, draft(100, BucketKey::Week2.into(), 9), now())
            .unwrap();
        let second = ExpenseLedger::add(
            &mut state,
            draft(5, AccountKind::Savings.into(), 9),
            now(),
        )
        .unwrap();
        assert!(second.expense.id > first.expense.id);
        assert_eq!(state.history, vec![second.expense.id, first.expense.id]);
        assert_eq!(state.needs.week2.spent, Money::from_units(100));
        assert_eq!(state.income.savings.balance, Money::from_units(5));
    }

    #[test]
    fn failed_debit_leaves_no_trace() {
        let mut state = planned_state();
        let before = state.clone();
        let err = ExpenseLedger::add(&mut state, draft(50, AccountKind::Personal.into(), 9), now())
            .unwrap_err();
        assert!(matches!(err, BudgetError::InsufficientFunds { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn delete_from_ended_week_is_rejected() {
        let mut state = planned_state();
        let added = ExpenseLedger::add(&mut state, draft(100, BucketKey::Week3.into(), 16), now())
            .unwrap();
        state.needs.week3.close().unwrap();
        let before = state.clone();
        assert!(matches!(
            ExpenseLedger::delete(&mut state, added.expense.id),
            Err(BudgetError::WeekEnded(BucketKey::Week3))
        ));
        assert_eq!(state, before);
        assert!(matches!(
            ExpenseLedger::delete(&mut state, EntryId(1)),
            Err(BudgetError::NotFound(EntryId(1)))
        ));
    }

    #[test]
    fn recent_transactions_are_newest_first_and_restartable() {
        let mut state = planned_state();
        ExpenseLedger::add(&mut state, draft(10, BucketKey::Week2.into(), 8), now()).unwrap();
        ExpenseLedger::add(
            &mut state,
            draft(20, BucketKey::FixedWeek1.into(), 12),
            now() + Duration::seconds(1),
        )
        .unwrap();
        ExpenseLedger::add(
            &mut state,
            draft(30, BucketKey::Week2.into(), 12),
            now() + Duration::seconds(2),
        )
        .unwrap();

        let feed = ExpenseLedger::recent_transactions(&state, 2);
        let amounts: Vec<Money> = feed.clone().map(|row| row.expense.amount).collect();
        assert_eq!(amounts, vec![Money::from_units(30), Money::from_units(20)]);
        assert_eq!(feed.count(), 2);

        let oldest = ExpenseLedger::recent_transactions(&state, 10).last().unwrap();
        assert_eq!(oldest.kind, TransactionKind::Need);
        assert_eq!(oldest.label, "Week 2");
        assert_eq!(oldest.balance, state.needs.week2.remaining());
    }
}
