pub mod expense_ledger;
pub mod plan_service;
pub mod rebalance_engine;
pub mod summary_service;

pub use expense_ledger::{AddedExpense, ExpenseLedger, TransactionKind, TransactionView};
pub use plan_service::PlanService;
pub use rebalance_engine::{Distribution, RebalanceEngine};
pub use summary_service::{
    BucketStatus, BucketSummary, MoneyFlow, Overview, SavingsLevel, SummaryService, UsageLevel,
};
