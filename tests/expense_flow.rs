mod common;

use allowance_core::{
    core::{Confirmation, ProposedChange},
    ledger::{AccountKind, BucketKey, Category, EntryId, ExpenseDraft},
    BudgetError, Money, NoticeLevel,
};
use common::{money, TestEnv};

const FIXED: Category = Category::Bucket(BucketKey::FixedWeek1);
const PERSONAL: Category = Category::Account(AccountKind::Personal);

fn planned_env() -> TestEnv {
    let mut env = TestEnv::new();
    env.manager.commit_plan(money("1000"), money("400")).unwrap();
    env
}

fn draft(env: &TestEnv, amount: &str, category: Category) -> ExpenseDraft {
    ExpenseDraft::new(money(amount), category, "groceries", env.manager.today()).unwrap()
}

#[test]
fn expense_within_budget_needs_no_confirmation() {
    let env = planned_env();
    let proposal = env.manager.propose_add_expense(draft(&env, "150", FIXED)).unwrap();
    assert!(!proposal.requires_confirmation);
    assert!(matches!(
        proposal.change,
        ProposedChange::AddExpense { overspend: None, .. }
    ));
}

#[test]
fn overspend_requires_confirmation_and_decline_changes_nothing() {
    let mut env = planned_env();
    let before = env.manager.state().clone();
    let proposal = env.manager.propose_add_expense(draft(&env, "450.25", FIXED)).unwrap();
    assert!(proposal.requires_confirmation);
    assert!(proposal.prompt.contains("overspend your Fixed + Week 1 budget by Rs 50.25"));

    let outcome = env.manager.apply(proposal, Confirmation::Declined).unwrap();
    assert!(!outcome.applied);
    assert_eq!(env.manager.state(), &before);
}

#[test]
fn confirmed_overspend_posts_with_warning() {
    let mut env = planned_env();
    let notices = env.spend("450.25", FIXED, "semester fees");
    assert!(notices.iter().any(|n| n.level == NoticeLevel::Success));
    assert!(notices
        .iter()
        .any(|n| n.level == NoticeLevel::Warning && n.message.contains("Rs 50.25")));
    assert_eq!(env.manager.state().needs.fixed_week1.remaining(), money("-50.25"));
}

#[test]
fn account_expense_needs_funds() {
    let mut env = planned_env();
    let err = env
        .manager
        .propose_add_expense(draft(&env, "10", PERSONAL))
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::InsufficientFunds { account: AccountKind::Personal, .. }
    ));

    env.manager
        .add_external_income(money("100"), "allowance bonus", env.date(4))
        .unwrap();
    env.spend("10", PERSONAL, "snacks");
    let personal = &env.manager.state().income.personal;
    assert_eq!(personal.balance, money("40"));
    assert_eq!(personal.spent, money("10"));
}

#[test]
fn confirmation_revalidates_stale_proposals() {
    let mut env = planned_env();
    env.manager
        .add_external_income(money("20"), "refund", env.date(4))
        .unwrap();
    let first = env.manager.propose_add_expense(draft(&env, "8", PERSONAL)).unwrap();
    let second = env.manager.propose_add_expense(draft(&env, "8", PERSONAL)).unwrap();
    env.manager.apply(first, Confirmation::Granted).unwrap();
    let before = env.manager.state().clone();
    assert!(matches!(
        env.manager.apply(second, Confirmation::Granted),
        Err(BudgetError::InsufficientFunds { .. })
    ));
    assert_eq!(env.manager.state(), &before);
}

#[test]
fn stale_proposal_cannot_overspend_without_confirmation() {
    let mut env = planned_env();
    let first = env.manager.propose_add_expense(draft(&env, "300", FIXED)).unwrap();
    let second = env.manager.propose_add_expense(draft(&env, "300", FIXED)).unwrap();
    assert!(!first.requires_confirmation);
    assert!(!second.requires_confirmation);

    env.manager.apply(first, Confirmation::Granted).unwrap();
    let before = env.manager.state().clone();
    let err = env.manager.apply(second, Confirmation::Granted).unwrap_err();
    assert!(matches!(
        err,
        BudgetError::UnconfirmedOverspend { overspend, .. } if overspend == money("200")
    ));
    assert_eq!(env.manager.state(), &before);

    let fresh = env.manager.propose_add_expense(draft(&env, "300", FIXED)).unwrap();
    assert!(fresh.requires_confirmation);
    env.manager.apply(fresh, Confirmation::Granted).unwrap();
    assert_eq!(env.manager.state().needs.fixed_week1.remaining(), money("-200"));
}

#[test]
fn confirmed_overspend_must_not_grow_before_apply() {
    let mut env = planned_env();
    env.spend("350", FIXED, "rent share");
    let confirmed = env.manager.propose_add_expense(draft(&env, "100", FIXED)).unwrap();
    assert!(confirmed.requires_confirmation);
    env.spend("20", FIXED, "snacks");
    assert!(matches!(
        env.manager.apply(confirmed, Confirmation::Granted),
        Err(BudgetError::UnconfirmedOverspend { .. })
    ));
}

#[test]
fn delete_reverses_bucket_and_history() {
    let mut env = planned_env();
    env.spend("120", FIXED, "bus pass");
    let id = env.manager.state().history[0];

    let proposal = env.manager.propose_delete_expense(id).unwrap();
    assert!(proposal.requires_confirmation);
    env.manager.apply(proposal, Confirmation::Granted).unwrap();

    let state = env.manager.state();
    assert_eq!(state.needs.fixed_week1.spent, Money::ZERO);
    assert_eq!(state.needs.fixed_week1.remaining(), money("400"));
    assert!(state.history.is_empty());
    assert!(state.find_expense(id).is_none());
}

#[test]
fn delete_refunds_account_expense() {
    let mut env = planned_env();
    env.manager
        .add_external_income(money("60"), "gift", env.date(4))
        .unwrap();
    env.spend("25", PERSONAL, "movie");
    let id = env.manager.state().history[0];
    let proposal = env.manager.propose_delete_expense(id).unwrap();
    env.manager.apply(proposal, Confirmation::Granted).unwrap();
    assert_eq!(env.manager.state().income.personal.balance, money("30"));
}

#[test]
fn delete_unknown_or_ended_is_rejected() {
    let mut env = planned_env();
    assert!(matches!(
        env.manager.propose_delete_expense(EntryId(42)),
        Err(BudgetError::NotFound(EntryId(42)))
    ));

    env.spend("120", FIXED, "bus pass");
    let id = env.manager.state().history[0];
    let end = env.manager.propose_end_week(BucketKey::FixedWeek1).unwrap();
    env.manager.apply(end, Confirmation::Granted).unwrap();
    let before = env.manager.state().clone();
    assert!(matches!(
        env.manager.propose_delete_expense(id),
        Err(BudgetError::WeekEnded(BucketKey::FixedWeek1))
    ));
    assert_eq!(env.manager.state(), &before);
}

#[test]
fn recent_and_history_respect_config_limits() {
    let mut env = planned_env();
    for n in 0..20 {
        env.spend("1", Category::Bucket(BucketKey::Week2), &format!("item {n}"));
    }
    let recent: Vec<_> = env.manager.recent_transactions().collect();
    assert_eq!(recent.len(), 15);
    assert_eq!(recent[0].expense.description, "item 19");

    let history: Vec<_> = env.manager.history().collect();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].description, "item 19");
    assert_eq!(history[9].description, "item 10");
}

#[test]
fn ids_are_unique_when_created_in_the_same_instant() {
    let mut env = planned_env();
    env.spend("1", FIXED, "a");
    env.spend("1", FIXED, "b");
    let history = &env.manager.state().history;
    assert_eq!(history.len(), 2);
    assert!(history[0] > history[1]);
}

#[test]
fn plan_is_locked_until_month_reset() {
    let mut env = planned_env();
    assert!(matches!(
        env.manager.commit_plan(money("2000"), money("500")),
        Err(BudgetError::PlanLocked)
    ));
    let reset = env.manager.propose_reset_month();
    env.manager.apply(reset, Confirmation::Granted).unwrap();
    env.manager.commit_plan(money("2000"), money("500")).unwrap();
    assert_eq!(env.manager.state().needs.week2.allocated, money("500"));
}

#[test]
fn tick_reports_open_weeks_without_mutating() {
    let mut env = planned_env();
    assert!(env.manager.tick().is_none());
    env.clock.advance(chrono::Duration::days(20));
    let before = env.manager.state().clone();
    let notice = env.manager.tick().expect("advisory after week 3 starts");
    assert!(notice.message.contains("Fixed + Week 1, Week 2"));
    assert_eq!(env.manager.state(), &before);
}
