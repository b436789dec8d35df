//! Two-phase mutations: an operation is first described as a [`Proposal`],
//! shown to the user, and only applied once a [`Confirmation`] is granted.

use crate::{
    core::notice::Notice,
    ledger::{BucketKey, Category, EntryId, ExpenseDraft},
    money::Money,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ProposedChange {
    AddExpense {
        draft: ExpenseDraft,
        /// Amount by which the target bucket would go past its allocation.
        overspend: Option<Money>,
    },
    DeleteExpense {
        id: EntryId,
        category: Category,
        amount: Money,
        description: String,
    },
    EndWeek {
        bucket: BucketKey,
        result: Money,
    },
    ResetMonth,
    ClearAll,
}

/// A validated change waiting for the user's decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub change: ProposedChange,
    pub prompt: String,
    pub requires_confirmation: bool,
}

impl Proposal {
    pub fn new(change: ProposedChange, prompt: impl Into<String>, requires_confirmation: bool) -> Self {
        Self {
            change,
            prompt: prompt.into(),
            requires_confirmation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Declined,
}

impl Confirmation {
    pub fn from_bool(granted: bool) -> Self {
        if granted {
            Confirmation::Granted
        } else {
            Confirmation::Declined
        }
    }
}

/// Result of applying a proposal or running a direct operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    pub applied: bool,
    pub notices: Vec<Notice>,
}

impl Outcome {
    pub fn applied(notices: Vec<Notice>) -> Self {
        Self {
            applied: true,
            notices,
        }
    }

    pub fn declined() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
