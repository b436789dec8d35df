use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    config::{Config, ConfigManager},
    core::{
        clock::{Clock, SystemClock},
        notice::Notice,
        proposal::{Confirmation, Outcome, Proposal, ProposedChange},
        services::{
            Distribution, ExpenseLedger, Overview, PlanService, RebalanceEngine, SummaryService,
            TransactionView,
        },
    },
    errors::{BudgetError, Result},
    ledger::{BucketKey, BudgetSplit, BudgetState, EntryId, Expense, ExpenseDraft},
    money::Money,
    storage::{JsonStorage, StorageBackend},
};

/// Facade that owns the budget state and coordinates services, persistence
/// and the confirm-then-apply flow.
pub struct BudgetManager {
    state: BudgetState,
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
    config: Config,
}

impl BudgetManager {
    /// Loads the saved budget (migrating and rolling the month over when
    /// needed) and returns the notices produced while doing so.
    pub fn open(
        storage: Box<dyn StorageBackend>,
        clock: Box<dyn Clock>,
        config: Config,
    ) -> Result<(Self, Vec<Notice>)> {
        let today = clock.today();
        let mut notices = Vec::new();
        let state = match storage.load(today) {
            Ok(Some(report)) => {
                for step in &report.migrations {
                    notices.push(Notice::info(format!("Saved data upgraded ({step}).")));
                }
                report.state
            }
            Ok(None) => BudgetState::new(today),
            Err(err) => {
                warn!(error = %err, "failed to load saved data, starting fresh");
                notices.push(Notice::warning("Failed to load saved data. Starting fresh."));
                BudgetState::new(today)
            }
        };

        let mut manager = Self {
            state,
            storage,
            clock,
            config,
        };
        if !manager.state.is_current_month(today) {
            info!(
                previous = %manager.state.month_anchor,
                today = %today,
                "month rolled over since last save"
            );
            RebalanceEngine::reset_month(&mut manager.state, today);
            notices.push(Notice::info(
                "A new month has started. Weekly budgets were reset and balances carried forward.",
            ));
            manager.persist(&mut notices);
        }
        Ok((manager, notices))
    }

    /// Opens the budget stored under the configured data directory.
    pub fn open_default() -> Result<(Self, Vec<Notice>)> {
        let config = ConfigManager::new()?.load()?;
        let storage = JsonStorage::new(config.data_dir.clone(), Some(config.backup_retention))?;
        Self::open(Box::new(storage), Box::new(SystemClock), config)
    }

    pub fn state(&self) -> &BudgetState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn preview_split(&self, allowance: Money, week1: Money) -> Result<BudgetSplit> {
        PlanService::preview(allowance, week1)
    }

    pub fn commit_plan(&mut self, allowance: Money, week1: Money) -> Result<Outcome> {
        let split = PlanService::commit(&mut self.state, allowance, week1)?;
        let mut notices = vec![Notice::success("Budget updated successfully!")];
        if split.leftover.is_positive() {
            notices.push(Notice::info(format!(
                "{} left over after rounding weekly budgets was added to savings.",
                self.format(split.leftover)
            )));
        }
        self.persist(&mut notices);
        Ok(Outcome::applied(notices))
    }

    pub fn propose_add_expense(&self, draft: ExpenseDraft) -> Result<Proposal> {
        let overspend = ExpenseLedger::check(&self.state, &draft)?;
        let prompt = match overspend {
            Some(amount) => format!(
                "This will overspend your {} budget by {}. Continue?",
                draft.category.label(),
                self.format(amount)
            ),
            None => format!(
                "Add {} to {} for \"{}\"?",
                self.format(draft.amount),
                draft.category.label(),
                draft.description
            ),
        };
        let requires_confirmation = overspend.is_some();
        Ok(Proposal::new(
            ProposedChange::AddExpense { draft, overspend },
            prompt,
            requires_confirmation,
        ))
    }

    pub fn propose_delete_expense(&self, id: EntryId) -> Result<Proposal> {
        let owner = self.state.locate_expense(id).ok_or(BudgetError::NotFound(id))?;
        if let Some(key) = owner.bucket() {
            self.state.needs.get(key).ensure_open()?;
        }
        let expense = self.state.find_expense(id).ok_or(BudgetError::NotFound(id))?;
        Ok(Proposal::new(
            ProposedChange::DeleteExpense {
                id,
                category: owner,
                amount: expense.amount,
                description: expense.description.clone(),
            },
            "Are you sure you want to delete this expense? This action cannot be undone.",
            true,
        ))
    }

    pub fn propose_end_week(&self, key: BucketKey) -> Result<Proposal> {
        let bucket = self.state.needs.get(key);
        if bucket.ended {
            return Err(BudgetError::AlreadyEnded(key));
        }
        let result = bucket.remaining();
        let prompt = if result.is_positive() {
            format!(
                "End {}? The surplus of {} will be split between savings and personal.",
                key.label(),
                self.format(result)
            )
        } else if result.is_negative() {
            format!(
                "End {}? The deficit of {} will be taken from personal, then savings.",
                key.label(),
                self.format(result.abs())
            )
        } else {
            format!("End {}? It finished exactly on budget.", key.label())
        };
        Ok(Proposal::new(
            ProposedChange::EndWeek {
                bucket: key,
                result,
            },
            prompt,
            true,
        ))
    }

    pub fn propose_reset_month(&self) -> Proposal {
        Proposal::new(
            ProposedChange::ResetMonth,
            "Reset everything for a new month? This clears all expenses but keeps your savings and personal balances.",
            true,
        )
    }

    pub fn propose_clear_all(&self) -> Proposal {
        Proposal::new(
            ProposedChange::ClearAll,
            "Clear all data, including savings? This cannot be undone.",
            true,
        )
    }

    /// Applies a proposal once the user has answered it. A declined proposal
    /// changes neither the state nor storage.
    pub fn apply(&mut self, proposal: Proposal, confirmation: Confirmation) -> Result<Outcome> {
        if confirmation == Confirmation::Declined {
            info!(prompt = proposal.prompt.as_str(), "proposal declined");
            return Ok(Outcome::declined());
        }

        let mut notices = Vec::new();
        match proposal.change {
            ProposedChange::AddExpense { draft, overspend } => {
                if let Some(current) = ExpenseLedger::check(&self.state, &draft)? {
                    if overspend.map_or(true, |confirmed| current > confirmed) {
                        return Err(BudgetError::UnconfirmedOverspend {
                            category: draft.category,
                            overspend: current,
                        });
                    }
                }
                let added = ExpenseLedger::add(&mut self.state, draft, self.clock.now())?;
                let expense = &added.expense;
                notices.push(Notice::success(format!(
                    "Expense added: {} - {}",
                    expense.description,
                    self.format(expense.amount)
                )));
                if let Some(overspend) = added.overspend {
                    notices.push(Notice::warning(format!(
                        "Warning: You've overspent your {} budget by {}!",
                        expense.category.label(),
                        self.format(overspend)
                    )));
                }
            }
            ProposedChange::DeleteExpense { id, .. } => {
                ExpenseLedger::delete(&mut self.state, id)?;
                notices.push(Notice::success("Expense deleted successfully"));
            }
            ProposedChange::EndWeek { bucket, .. } => {
                let distribution = RebalanceEngine::end_week(&mut self.state, bucket)?;
                notices.extend(self.describe_distribution(bucket, &distribution));
            }
            ProposedChange::ResetMonth => {
                RebalanceEngine::reset_month(&mut self.state, self.clock.today());
                notices.push(Notice::success(
                    "Month reset successfully! Savings carried forward.",
                ));
            }
            ProposedChange::ClearAll => {
                RebalanceEngine::clear_all(&mut self.state, self.clock.today());
                match self.storage.clear() {
                    Ok(()) => notices.push(Notice::success("All data cleared.")),
                    Err(err) => {
                        warn!(error = %err, "failed to remove saved data");
                        notices.push(Notice::danger(format!("Failed to remove saved data: {err}")));
                    }
                }
                return Ok(Outcome::applied(notices));
            }
        }
        self.persist(&mut notices);
        Ok(Outcome::applied(notices))
    }

    pub fn add_external_income(
        &mut self,
        amount: Money,
        description: &str,
        date: NaiveDate,
    ) -> Result<Outcome> {
        let record = RebalanceEngine::distribute_external_income(
            &mut self.state,
            amount,
            description,
            date,
            self.clock.now(),
        )?;
        let share = record.amount.half();
        let mut notices = vec![Notice::success(format!(
            "Income added: {} - {} to savings and {} to personal",
            self.format(record.amount),
            self.format(share),
            self.format(share)
        ))];
        self.persist(&mut notices);
        Ok(Outcome::applied(notices))
    }

    /// Periodic check. Reports earlier weeks that are still open; never mutates.
    pub fn tick(&self) -> Option<Notice> {
        SummaryService::week_advisory(&self.state, self.clock.today())
    }

    pub fn overview(&self) -> Overview {
        SummaryService::overview(&self.state, &self.config.currency_symbol)
    }

    pub fn recent_transactions(&self) -> impl Iterator<Item = TransactionView<'_>> + Clone + '_ {
        ExpenseLedger::recent_transactions(&self.state, self.config.recent_limit)
    }

    pub fn history(&self) -> impl Iterator<Item = &Expense> + Clone + '_ {
        ExpenseLedger::history(&self.state).take(self.config.history_limit)
    }

    pub fn save(&mut self) -> Result<()> {
        self.storage.save(&self.state)
    }

    fn persist(&mut self, notices: &mut Vec<Notice>) {
        if let Err(err) = self.storage.save(&self.state) {
            warn!(error = %err, "failed to save budget");
            notices.push(Notice::danger(
                "Failed to save data. Please check your storage location.",
            ));
        }
    }

    fn format(&self, amount: Money) -> String {
        amount.format_amount(&self.config.currency_symbol)
    }

    fn describe_distribution(&self, key: BucketKey, distribution: &Distribution) -> Vec<Notice> {
        let mut notices = Vec::new();
        if distribution.is_surplus() {
            notices.push(Notice::success(format!(
                "{} ended with a surplus of {}: {} to savings, {} to personal.",
                key.label(),
                self.format(distribution.result),
                self.format(distribution.to_savings),
                self.format(distribution.to_personal)
            )));
        } else if distribution.is_deficit() {
            notices.push(Notice::warning(format!(
                "{} ended {} over budget: {} taken from personal, {} from savings.",
                key.label(),
                self.format(distribution.result.abs()),
                self.format(distribution.from_personal),
                self.format(distribution.from_savings)
            )));
            if distribution.uncovered.is_positive() {
                notices.push(Notice::warning(format!(
                    "{} of the deficit could not be covered by your balances.",
                    self.format(distribution.uncovered)
                )));
            }
        } else {
            notices.push(Notice::info(format!(
                "{} ended exactly on budget.",
                key.label()
            )));
        }
        notices
    }
}
