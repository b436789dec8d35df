//! Moves week results and external income into the savings and personal
//! accounts, and resets the month.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::{
    errors::{BudgetError, Result},
    ledger::{month_start, BucketKey, BudgetState, ExternalIncomeRecord, WeekBuckets},
    money::Money,
};

/// Where a week's result went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Distribution {
    pub result: Money,
    pub to_savings: Money,
    pub to_personal: Money,
    pub from_personal: Money,
    pub from_savings: Money,
    /// Deficit left over once both balances reached zero. Not tracked further.
    pub uncovered: Money,
}

impl Distribution {
    pub fn is_surplus(&self) -> bool {
        self.result.is_positive()
    }

    pub fn is_deficit(&self) -> bool {
        self.result.is_negative()
    }
}

pub struct RebalanceEngine;

impl RebalanceEngine {
    /// A surplus is halved between savings and personal. A deficit is taken
    /// from personal first, then savings, never pushing either below zero.
    pub fn distribute_week_result(state: &mut BudgetState, result: Money) -> Distribution {
        let mut distribution = Distribution {
            result,
            ..Distribution::default()
        };
        if result.is_positive() {
            let half = result.half();
            state.income.savings.credit(half);
            state.income.personal.credit(half);
            distribution.to_savings = half;
            distribution.to_personal = half;
        } else if result.is_negative() {
            let deficit = result.abs();
            distribution.from_personal = state.income.personal.absorb_deficit(deficit);
            let rest = deficit - distribution.from_personal;
            distribution.from_savings = state.income.savings.absorb_deficit(rest);
            distribution.uncovered = rest - distribution.from_savings;
            if distribution.uncovered.is_positive() {
                warn!(uncovered = %distribution.uncovered, "deficit exceeded both balances");
            }
        }
        distribution
    }

    /// Closes a week and distributes its result.
    pub fn end_week(state: &mut BudgetState, key: BucketKey) -> Result<Distribution> {
        let result = state.needs.get_mut(key).close()?;
        let distribution = Self::distribute_week_result(state, result);
        info!(
            week = key.key(),
            result = %result,
            to_savings = %distribution.to_savings,
            to_personal = %distribution.to_personal,
            from_personal = %distribution.from_personal,
            from_savings = %distribution.from_savings,
            "week ended"
        );
        Ok(distribution)
    }

    /// Splits income received outside the allowance evenly into both accounts.
    pub fn distribute_external_income(
        state: &mut BudgetState,
        amount: Money,
        description: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ExternalIncomeRecord> {
        if !amount.is_positive() {
            return Err(BudgetError::InvalidAmount(format!(
                "income amount must be greater than zero (got {amount})"
            )));
        }
        let amount = amount.within_limit()?;
        let description = description.trim();
        if description.is_empty() {
            return Err(BudgetError::MissingField("description"));
        }

        let half = amount.half();
        state.income.savings.credit(half);
        state.income.personal.credit(half);

        let id = state.entry_id_after(now);
        let record = ExternalIncomeRecord {
            id,
            amount,
            description: description.to_string(),
            date,
            timestamp: now,
        };
        state.external_income.push(record.clone());
        state.record_entry_id(id);

        info!(id = %id, amount = %amount, share = %half, "external income added");
        Ok(record)
    }

    /// Starts a new month: plan values and account balances carry forward,
    /// everything else is cleared and the plan is unlocked.
    pub fn reset_month(state: &mut BudgetState, today: NaiveDate) {
        state.needs = WeekBuckets::default();
        state.income.savings.reset_month();
        state.income.personal.reset_month();
        state.history.clear();
        state.external_income.clear();
        state.plan.locked = false;
        state.month_anchor = month_start(today);
        info!(
            month = %state.month_anchor,
            savings = %state.income.savings.balance,
            personal = %state.income.personal.balance,
            "month reset"
        );
    }

    /// Discards everything, including savings.
    pub fn clear_all(state: &mut BudgetState, today: NaiveDate) {
        let last_entry_id = state.last_entry_id;
        *state = BudgetState::new(today);
        state.last_entry_id = last_entry_id;
        info!("all budget data cleared");
    }
}
