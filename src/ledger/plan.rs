use serde::{Deserialize, Serialize};

use crate::{
    errors::{BudgetError, Result},
    money::Money,
};

/// Weekly allocations for weeks 2-4 are floored to a multiple of this.
pub const ALLOCATION_STEP: u32 = 10;

const FLEX_WEEKS: u32 = 3;

/// How the allowance left after week 1 is spread over weeks 2-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSplit {
    pub weekly_budget: Money,
    pub leftover: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    #[serde(default)]
    pub monthly_allowance: Money,
    #[serde(default)]
    pub fixed_week1_budget: Money,
    #[serde(default)]
    pub weeks2to4_budget: Money,
    #[serde(default)]
    pub leftover: Money,
    #[serde(default)]
    pub locked: bool,
}

impl BudgetPlan {
    /// Splits `allowance - week1` into three equal weekly budgets floored to
    /// [`ALLOCATION_STEP`], with the residue returned as `leftover`.
    pub fn compute_split(allowance: Money, week1: Money) -> Result<BudgetSplit> {
        if !allowance.is_positive() {
            return Err(BudgetError::InvalidBudget(
                "monthly allowance must be greater than zero".into(),
            ));
        }
        if !week1.is_positive() {
            return Err(BudgetError::InvalidBudget(
                "fixed + week 1 budget must be greater than zero".into(),
            ));
        }
        if week1 >= allowance {
            return Err(BudgetError::InvalidBudget(format!(
                "fixed + week 1 budget ({week1}) must be less than the monthly allowance ({allowance})"
            )));
        }
        let allowance = allowance
            .within_limit()
            .map_err(|err| BudgetError::InvalidBudget(err.to_string()))?;
        let remaining = allowance - week1;
        let weekly_budget = remaining.divide_floor(FLEX_WEEKS, ALLOCATION_STEP);
        let leftover = remaining - weekly_budget.times(FLEX_WEEKS);
        Ok(BudgetSplit {
            weekly_budget,
            leftover,
        })
    }

    pub fn apply_split(&mut self, allowance: Money, week1: Money, split: BudgetSplit) {
        self.monthly_allowance = allowance;
        self.fixed_week1_budget = week1;
        self.weeks2to4_budget = split.weekly_budget;
        self.leftover = split.leftover;
        self.locked = true;
    }

    pub fn is_configured(&self) -> bool {
        self.monthly_allowance.is_positive()
    }
}
