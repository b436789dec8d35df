//! Monthly plan: splitting the allowance and allocating the weekly buckets.

use tracing::info;

use crate::{
    errors::{BudgetError, Result},
    ledger::{BucketKey, BudgetPlan, BudgetSplit, BudgetState},
    money::Money,
};

pub struct PlanService;

impl PlanService {
    /// Computes the split without touching any state.
    pub fn preview(allowance: Money, week1: Money) -> Result<BudgetSplit> {
        BudgetPlan::compute_split(allowance, week1)
    }

    /// Allocates all four buckets, credits any leftover to savings and locks the plan.
    pub fn commit(state: &mut BudgetState, allowance: Money, week1: Money) -> Result<BudgetSplit> {
        if state.plan.locked {
            return Err(BudgetError::PlanLocked);
        }
        let split = BudgetPlan::compute_split(allowance, week1)?;
        if let Some(bucket) = state.needs.iter().find(|bucket| bucket.ended) {
            return Err(BudgetError::WeekEnded(bucket.key));
        }

        for key in BucketKey::ALL {
            let amount = match key {
                BucketKey::FixedWeek1 => week1,
                _ => split.weekly_budget,
            };
            state.needs.get_mut(key).allocate(amount)?;
        }
        if split.leftover.is_positive() {
            state.income.savings.credit(split.leftover);
        }
        state.plan.apply_split(allowance, week1, split);

        info!(
            allowance = %allowance,
            week1 = %week1,
            weekly = %split.weekly_budget,
            leftover = %split.leftover,
            "budget plan committed"
        );
        Ok(split)
    }
}
