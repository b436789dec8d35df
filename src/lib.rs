#![doc(test(attr(deny(warnings))))]

//! Allowance Core tracks a monthly allowance split into four weekly "needs"
//! buckets plus savings and personal accounts, and settles each week's
//! surplus or deficit into those accounts.

pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod money;
pub mod storage;
pub mod utils;

pub use crate::core::{BudgetManager, Confirmation, Notice, NoticeLevel, Outcome, Proposal};
pub use errors::{BudgetError, Result};
pub use money::Money;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and logs the build this library came from.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        let build = utils::build_info::current();
        tracing::info!(
            version = build.version,
            git = build.git_hash,
            profile = build.profile,
            "Allowance Core tracing initialized."
        );
    });
}
