//! Budget domain model: the plan, weekly buckets, discretionary accounts and
//! the expenses recorded against them.

pub mod account;
pub mod bucket;
pub mod category;
pub mod expense;
pub mod plan;
pub mod state;

pub use account::{IncomeAccount, IncomeAccounts};
pub use bucket::{WeekBucket, WeekBuckets};
pub use category::{AccountKind, BucketKey, Category};
pub use expense::{EntryId, Expense, ExpenseDraft, ExternalIncomeRecord};
pub use plan::{BudgetPlan, BudgetSplit, ALLOCATION_STEP};
pub use state::{month_start, BudgetState};
