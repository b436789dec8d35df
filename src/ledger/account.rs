use serde::{Deserialize, Serialize};

use crate::{
    errors::{BudgetError, Result},
    money::Money,
};

use super::{
    category::AccountKind,
    expense::{EntryId, Expense},
};

/// A discretionary account (savings or personal). Its balance is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeAccount {
    pub kind: AccountKind,
    #[serde(default)]
    pub balance: Money,
    #[serde(default)]
    pub spent: Money,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl IncomeAccount {
    pub fn new(kind: AccountKind) -> Self {
        Self {
            kind,
            balance: Money::ZERO,
            spent: Money::ZERO,
            expenses: Vec::new(),
        }
    }

    pub fn credit(&mut self, amount: Money) {
        self.balance += amount;
    }

    /// Checks a debit without applying it.
    pub fn check_debit(&self, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(BudgetError::InvalidAmount(format!(
                "expense amount must be greater than zero (got {amount})"
            )));
        }
        if self.balance < amount {
            return Err(BudgetError::InsufficientFunds {
                account: self.kind,
                balance: self.balance,
                requested: amount,
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, expense: Expense) -> Result<()> {
        self.check_debit(expense.amount)?;
        self.balance -= expense.amount;
        self.spent += expense.amount;
        self.expenses.push(expense);
        Ok(())
    }

    /// Takes up to `amount` out of the balance and returns how much was taken.
    pub fn absorb_deficit(&mut self, amount: Money) -> Money {
        if !amount.is_positive() || !self.balance.is_positive() {
            return Money::ZERO;
        }
        let absorbed = amount.min(self.balance);
        self.balance -= absorbed;
        absorbed
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.expenses.iter().any(|expense| expense.id == id)
    }

    /// Removes an expense and gives its amount back to the balance.
    pub fn refund_expense(&mut self, id: EntryId) -> Result<Expense> {
        let position = self
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or(BudgetError::NotFound(id))?;
        let expense = self.expenses.remove(position);
        self.balance += expense.amount;
        self.spent -= expense.amount;
        Ok(expense)
    }

    /// Month boundary: the balance carries forward, activity does not.
    pub fn reset_month(&mut self) {
        self.spent = Money::ZERO;
        self.expenses.clear();
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.kind);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeAccounts {
    pub savings: IncomeAccount,
    pub personal: IncomeAccount,
}

impl Default for IncomeAccounts {
    fn default() -> Self {
        Self {
            savings: IncomeAccount::new(AccountKind::Savings),
            personal: IncomeAccount::new(AccountKind::Personal),
        }
    }
}

impl IncomeAccounts {
    pub fn get(&self, kind: AccountKind) -> &IncomeAccount {
        match kind {
            AccountKind::Savings => &self.savings,
            AccountKind::Personal => &self.personal,
        }
    }

    pub fn get_mut(&mut self, kind: AccountKind) -> &mut IncomeAccount {
        match kind {
            AccountKind::Savings => &mut self.savings,
            AccountKind::Personal => &mut self.personal,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncomeAccount> + Clone {
        AccountKind::ALL.into_iter().map(move |kind| self.get(kind))
    }

    pub fn total_balance(&self) -> Money {
        self.savings.balance + self.personal.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Category;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn expense(id: i64, units: i64) -> Expense {
        Expense {
            id: EntryId(id),
            amount: Money::from_units(units),
            category: Category::Account(AccountKind::Personal),
            description: "cinema".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 2, 20, 0, 0).unwrap(),
        }
    }

    #[test]
    fn debit_beyond_balance_changes_nothing() {
        let mut account = IncomeAccount::new(AccountKind::Personal);
        account.credit(Money::from_units(40));
        let before = account.clone();
        let err = account.debit(expense(1, 50)).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::InsufficientFunds { account: AccountKind::Personal, .. }
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn absorb_clamps_at_zero() {
        let mut account = IncomeAccount::new(AccountKind::Savings);
        account.credit(Money::from_units(30));
        assert_eq!(account.absorb_deficit(Money::from_units(100)), Money::from_units(30));
        assert_eq!(account.balance, Money::ZERO);
        assert_eq!(account.absorb_deficit(Money::from_units(5)), Money::ZERO);
    }

    #[test]
    fn refund_restores_balance_and_spent() {
        let mut account = IncomeAccount::new(AccountKind::Personal);
        account.credit(Money::from_units(100));
        account.debit(expense(7, 25)).unwrap();
        assert_eq!(account.balance, Money::from_units(75));
        account.refund_expense(EntryId(7)).unwrap();
        assert_eq!(account.balance, Money::from_units(100));
        assert_eq!(account.spent, Money::ZERO);
        assert!(account.expenses.is_empty());
    }

    #[test]
    fn month_reset_keeps_balance() {
        let mut account = IncomeAccount::new(AccountKind::Personal);
        account.credit(Money::from_units(100));
        account.debit(expense(1, 25)).unwrap();
        account.reset_month();
        assert_eq!(account.balance, Money::from_units(75));
        assert_eq!(account.spent, Money::ZERO);
        assert!(account.expenses.is_empty());
    }
}
