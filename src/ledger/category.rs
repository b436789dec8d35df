use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{BudgetError, Result};

/// One of the four weekly "needs" allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    FixedWeek1,
    Week2,
    Week3,
    Week4,
}

impl BucketKey {
    pub const ALL: [BucketKey; 4] = [
        BucketKey::FixedWeek1,
        BucketKey::Week2,
        BucketKey::Week3,
        BucketKey::Week4,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BucketKey::FixedWeek1 => "fixed_week1",
            BucketKey::Week2 => "week2",
            BucketKey::Week3 => "week3",
            BucketKey::Week4 => "week4",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BucketKey::FixedWeek1 => "Fixed + Week 1",
            BucketKey::Week2 => "Week 2",
            BucketKey::Week3 => "Week 3",
            BucketKey::Week4 => "Week 4",
        }
    }

    /// Zero-based position within the month.
    pub fn index(self) -> usize {
        match self {
            BucketKey::FixedWeek1 => 0,
            BucketKey::Week2 => 1,
            BucketKey::Week3 => 2,
            BucketKey::Week4 => 3,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The two discretionary accounts fed by surpluses and external income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Savings,
    Personal,
}

impl AccountKind {
    pub const ALL: [AccountKind; 2] = [AccountKind::Savings, AccountKind::Personal];

    pub fn key(self) -> &'static str {
        match self {
            AccountKind::Savings => "savings",
            AccountKind::Personal => "personal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Savings => "Savings",
            AccountKind::Personal => "Personal",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an expense is charged: a weekly bucket or a discretionary account.
///
/// Serialized as its key (`fixed_week1`, `week2`, ..., `savings`, `personal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Bucket(BucketKey),
    Account(AccountKind),
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Bucket(BucketKey::FixedWeek1),
        Category::Bucket(BucketKey::Week2),
        Category::Bucket(BucketKey::Week3),
        Category::Bucket(BucketKey::Week4),
        Category::Account(AccountKind::Savings),
        Category::Account(AccountKind::Personal),
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Bucket(bucket) => bucket.key(),
            Category::Account(account) => account.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Bucket(bucket) => bucket.label(),
            Category::Account(account) => account.label(),
        }
    }

    pub fn bucket(self) -> Option<BucketKey> {
        match self {
            Category::Bucket(bucket) => Some(bucket),
            Category::Account(_) => None,
        }
    }

    pub fn account(self) -> Option<AccountKind> {
        match self {
            Category::Account(account) => Some(account),
            Category::Bucket(_) => None,
        }
    }
}

impl From<BucketKey> for Category {
    fn from(value: BucketKey) -> Self {
        Category::Bucket(value)
    }
}

impl From<AccountKind> for Category {
    fn from(value: AccountKind) -> Self {
        Category::Account(value)
    }
}

impl FromStr for Category {
    type Err = BudgetError;

    fn from_str(raw: &str) -> Result<Self> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(BudgetError::MissingField("category"));
        }
        Category::ALL
            .into_iter()
            .find(|category| category.key() == key)
            .ok_or_else(|| BudgetError::InvalidCategory(key.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = BudgetError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.key().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
