#![allow(dead_code)]

use std::sync::Arc;

use allowance_core::{
    config::Config,
    core::{BudgetManager, Confirmation, FixedClock, Notice},
    ledger::{Category, ExpenseDraft},
    storage::JsonStorage,
    Money,
};
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

/// A manager backed by its own temp directory and a clock the test controls.
pub struct TestEnv {
    pub manager: BudgetManager,
    pub clock: Arc<FixedClock>,
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::starting_at(2024, 3, 4)
    }

    pub fn starting_at(year: i32, month: u32, day: u32) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap(),
        ));
        let (manager, notices) = open(&dir, &clock);
        assert!(notices.is_empty(), "fresh env produced notices: {notices:?}");
        Self {
            manager,
            clock,
            dir,
        }
    }

    /// Opens a second manager over the same directory, as a restart would.
    pub fn reopen(&self) -> (BudgetManager, Vec<Notice>) {
        open(&self.dir, &self.clock)
    }

    pub fn date(&self, day: u32) -> NaiveDate {
        let today = self.manager.today();
        NaiveDate::from_ymd_opt(today.year(), today.month(), day).unwrap()
    }

    /// Proposes and confirms an expense dated today, returning the notices.
    pub fn spend(&mut self, amount: &str, category: Category, description: &str) -> Vec<Notice> {
        let draft = ExpenseDraft::new(money(amount), category, description, self.manager.today())
            .expect("valid draft");
        let proposal = self.manager.propose_add_expense(draft).expect("proposal");
        self.manager
            .apply(proposal, Confirmation::Granted)
            .expect("apply expense")
            .notices
    }
}

fn open(dir: &TempDir, clock: &Arc<FixedClock>) -> (BudgetManager, Vec<Notice>) {
    let storage =
        JsonStorage::new(Some(dir.path().to_path_buf()), Some(3)).expect("create json storage");
    BudgetManager::open(Box::new(storage), Box::new(Arc::clone(clock)), Config::default())
        .expect("open manager")
}

pub fn money(raw: &str) -> Money {
    Money::parse(raw).unwrap()
}
