use serde::{Deserialize, Serialize};

use crate::{
    errors::{BudgetError, Result},
    money::Money,
};

use super::{
    category::BucketKey,
    expense::{EntryId, Expense},
};

/// A weekly "needs" allocation. `remaining` is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekBucket {
    pub key: BucketKey,
    #[serde(default)]
    pub allocated: Money,
    #[serde(default)]
    pub spent: Money,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub ended: bool,
}

impl WeekBucket {
    pub fn new(key: BucketKey) -> Self {
        Self {
            key,
            allocated: Money::ZERO,
            spent: Money::ZERO,
            expenses: Vec::new(),
            ended: false,
        }
    }

    pub fn remaining(&self) -> Money {
        self.allocated - self.spent
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.ended {
            Err(BudgetError::WeekEnded(self.key))
        } else {
            Ok(())
        }
    }

    /// How far `amount` would push this bucket past its allocation, if at all.
    pub fn overspend_for(&self, amount: Money) -> Option<Money> {
        let after = self.remaining() - amount;
        after.is_negative().then(|| after.abs())
    }

    pub fn allocate(&mut self, amount: Money) -> Result<()> {
        self.ensure_open()?;
        self.allocated = amount;
        Ok(())
    }

    /// Records an expense. Overspending is allowed; `remaining` simply goes negative.
    pub fn post_expense(&mut self, expense: Expense) -> Result<()> {
        self.ensure_open()?;
        if !expense.amount.is_positive() {
            return Err(BudgetError::InvalidAmount(format!(
                "expense amount must be greater than zero (got {})",
                expense.amount
            )));
        }
        self.spent += expense.amount;
        self.expenses.push(expense);
        Ok(())
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.expenses.iter().any(|expense| expense.id == id)
    }

    pub fn reverse_expense(&mut self, id: EntryId) -> Result<Expense> {
        self.ensure_open()?;
        let position = self
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or(BudgetError::NotFound(id))?;
        let expense = self.expenses.remove(position);
        self.spent -= expense.amount;
        Ok(expense)
    }

    /// Ends the week and returns its surplus (positive) or deficit (negative).
    pub fn close(&mut self) -> Result<Money> {
        if self.ended {
            return Err(BudgetError::AlreadyEnded(self.key));
        }
        let result = self.remaining();
        self.ended = true;
        Ok(result)
    }

    pub fn usage_percent(&self) -> rust_decimal::Decimal {
        self.spent.percent_of(self.allocated)
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.key);
    }
}

/// The four buckets of a month, addressable by [`BucketKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekBuckets {
    pub fixed_week1: WeekBucket,
    pub week2: WeekBucket,
    pub week3: WeekBucket,
    pub week4: WeekBucket,
}

impl Default for WeekBuckets {
    fn default() -> Self {
        Self {
            fixed_week1: WeekBucket::new(BucketKey::FixedWeek1),
            week2: WeekBucket::new(BucketKey::Week2),
            week3: WeekBucket::new(BucketKey::Week3),
            week4: WeekBucket::new(BucketKey::Week4),
        }
    }
}

impl WeekBuckets {
    pub fn get(&self, key: BucketKey) -> &WeekBucket {
        match key {
            BucketKey::FixedWeek1 => &self.fixed_week1,
            BucketKey::Week2 => &self.week2,
            BucketKey::Week3 => &self.week3,
            BucketKey::Week4 => &self.week4,
        }
    }

    pub fn get_mut(&mut self, key: BucketKey) -> &mut WeekBucket {
        match key {
            BucketKey::FixedWeek1 => &mut self.fixed_week1,
            BucketKey::Week2 => &mut self.week2,
            BucketKey::Week3 => &mut self.week3,
            BucketKey::Week4 => &mut self.week4,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeekBucket> + Clone {
        BucketKey::ALL.into_iter().map(move |key| self.get(key))
    }

    pub fn total_allocated(&self) -> Money {
        self.iter().map(|bucket| bucket.allocated).sum()
    }

    pub fn total_spent(&self) -> Money {
        self.iter().map(|bucket| bucket.spent).sum()
    }

    pub fn any_ended(&self) -> bool {
        self.iter().any(|bucket| bucket.ended)
    }
}
