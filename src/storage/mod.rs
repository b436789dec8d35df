pub mod json_backend;
pub mod migrate;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{errors::Result, ledger::BudgetState, utils::build_info};

pub const CURRENT_VERSION: &str = "3.0";

/// Abstraction over persistence backends holding the single budget snapshot.
pub trait StorageBackend: Send + Sync {
    /// Returns `None` when nothing has been saved yet. `today` anchors legacy
    /// snapshots that never recorded which month they belong to.
    fn load(&self, today: NaiveDate) -> Result<Option<LoadReport>>;
    fn save(&self, state: &BudgetState) -> Result<()>;
    /// Removes the persisted snapshot entirely.
    fn clear(&self) -> Result<()>;
}

/// On-disk envelope around the budget state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub saved_by: String,
    pub state: BudgetState,
}

impl Snapshot {
    pub fn new(state: BudgetState) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            saved_at: Utc::now(),
            saved_by: build_info::current().label(),
            state,
        }
    }
}

/// A loaded state plus what happened while loading it.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub state: BudgetState,
    /// Version found on disk, before migration.
    pub version: String,
    pub migrations: Vec<String>,
    pub path: PathBuf,
}

pub use json_backend::JsonStorage;
