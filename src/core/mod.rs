pub mod budget_manager;
pub mod calendar;
pub mod clock;
pub mod notice;
pub mod proposal;
pub mod services;

pub use budget_manager::BudgetManager;
pub use calendar::week_of_month;
pub use clock::{Clock, FixedClock, SystemClock};
pub use notice::{Notice, NoticeLevel};
pub use proposal::{Confirmation, Outcome, Proposal, ProposedChange};
