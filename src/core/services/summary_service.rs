//! Read-only views of the budget for presentation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    core::{calendar::week_of_month, notice::Notice},
    ledger::{BucketKey, BudgetState, WeekBucket},
    money::Money,
};

const UNDERSPENT_BELOW: u32 = 70;
const SAVED_BELOW: u32 = 50;
const PERSONAL_WARNING_ABOVE: u32 = 50;
const PERSONAL_DANGER_ABOVE: u32 = 80;
const SAVINGS_EXCELLENT_ABOVE: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    OnBudget,
    Underspent,
    Overspent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsLevel {
    Low,
    Growing,
    Excellent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary {
    pub key: BucketKey,
    pub label: &'static str,
    pub allocated: Money,
    pub spent: Money,
    pub remaining: Money,
    pub usage_percent: Decimal,
    /// Usage capped at 100 for progress bars.
    pub progress_percent: Decimal,
    pub status: BucketStatus,
    pub advisory: String,
    pub ended: bool,
}

/// Where the month's money went, for the flow chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoneyFlow {
    pub needs_spent: Money,
    pub savings_total: Money,
    pub personal_total: Money,
    pub needs_share: Decimal,
    pub savings_share: Decimal,
    pub personal_share: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub monthly_allowance: Money,
    pub total_allocated: Money,
    pub total_spent: Money,
    /// Allocated minus spent across all four buckets.
    pub net_needs: Money,
    pub savings_balance: Money,
    pub personal_balance: Money,
    pub external_income: Money,
    pub buckets: Vec<BucketSummary>,
    pub personal_usage_percent: Decimal,
    pub personal_level: UsageLevel,
    pub savings_level: SavingsLevel,
    pub flow: MoneyFlow,
    pub locked: bool,
}

pub struct SummaryService;

impl SummaryService {
    pub fn overview(state: &BudgetState, currency_symbol: &str) -> Overview {
        let total_allocated = state.needs.total_allocated();
        let total_spent = state.needs.total_spent();
        let personal = &state.income.personal;
        let personal_usage_percent = personal.spent.percent_of(personal.balance + personal.spent);
        let savings = state.income.savings.balance;

        Overview {
            monthly_allowance: state.plan.monthly_allowance,
            total_allocated,
            total_spent,
            net_needs: total_allocated - total_spent,
            savings_balance: savings,
            personal_balance: personal.balance,
            external_income: state.total_external_income(),
            buckets: state
                .needs
                .iter()
                .map(|bucket| Self::bucket_summary(bucket, currency_symbol))
                .collect(),
            personal_usage_percent,
            personal_level: usage_level(personal_usage_percent),
            savings_level: savings_level(savings),
            flow: Self::money_flow(state),
            locked: state.plan.locked,
        }
    }

    pub fn bucket_summary(bucket: &WeekBucket, currency_symbol: &str) -> BucketSummary {
        let remaining = bucket.remaining();
        let usage_percent = bucket.usage_percent();
        // Nothing allocated means there is nothing to underspend.
        let unallocated = !bucket.allocated.is_positive();
        let status = if remaining.is_negative() {
            BucketStatus::Overspent
        } else if unallocated {
            BucketStatus::OnBudget
        } else if usage_percent < Decimal::from(UNDERSPENT_BELOW) {
            BucketStatus::Underspent
        } else {
            BucketStatus::OnBudget
        };
        let advisory = if remaining.is_negative() {
            format!("Overspent by {}", remaining.abs().format_amount(currency_symbol))
        } else if !unallocated && usage_percent < Decimal::from(SAVED_BELOW) {
            format!("Saved {}", remaining.format_amount(currency_symbol))
        } else {
            "On budget".to_string()
        };

        BucketSummary {
            key: bucket.key,
            label: bucket.key.label(),
            allocated: bucket.allocated,
            spent: bucket.spent,
            remaining,
            usage_percent,
            progress_percent: usage_percent.min(Decimal::ONE_HUNDRED),
            status,
            advisory,
            ended: bucket.ended,
        }
    }

    pub fn money_flow(state: &BudgetState) -> MoneyFlow {
        let needs_spent = state.needs.total_spent();
        let savings_total = state.income.savings.balance + state.income.savings.spent;
        let personal_total = state.income.personal.balance + state.income.personal.spent;
        let total = needs_spent + savings_total + personal_total;
        MoneyFlow {
            needs_spent,
            savings_total,
            personal_total,
            needs_share: needs_spent.percent_of(total),
            savings_share: savings_total.percent_of(total),
            personal_share: personal_total.percent_of(total),
        }
    }

    /// Reminder about earlier weeks that were never ended. Never changes state.
    pub fn week_advisory(state: &BudgetState, today: NaiveDate) -> Option<Notice> {
        if !state.plan.locked || !state.is_current_month(today) {
            return None;
        }
        let current = week_of_month(today);
        let open: Vec<&str> = state
            .needs
            .iter()
            .filter(|bucket| bucket.key.index() < current.index() && !bucket.ended)
            .map(|bucket| bucket.key.label())
            .collect();
        if open.is_empty() {
            return None;
        }
        let verb = if open.len() == 1 { "is" } else { "are" };
        Some(Notice::warning(format!(
            "It is now {}. {} {verb} still open; end them to move their results into savings and personal.",
            current.label(),
            open.join(", ")
        )))
    }
}

fn usage_level(percent: Decimal) -> UsageLevel {
    if percent > Decimal::from(PERSONAL_DANGER_ABOVE) {
        UsageLevel::Danger
    } else if percent > Decimal::from(PERSONAL_WARNING_ABOVE) {
        UsageLevel::Warning
    } else {
        UsageLevel::Normal
    }
}

fn savings_level(balance: Money) -> SavingsLevel {
    if balance > Money::from_units(SAVINGS_EXCELLENT_ABOVE) {
        SavingsLevel::Excellent
    } else if balance.is_positive() {
        SavingsLevel::Growing
    } else {
        SavingsLevel::Low
    }
}
