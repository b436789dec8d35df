use allowance_core::{
    core::services::{ExpenseLedger, PlanService, RebalanceEngine},
    ledger::{BucketKey, BudgetState, Category, ExpenseDraft},
    storage::{JsonStorage, StorageBackend},
    Money,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::tempdir;

fn build_sample_state(expense_count: usize) -> BudgetState {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
    let mut state = BudgetState::new(start.date_naive());
    PlanService::commit(&mut state, Money::from_units(40_000), Money::from_units(10_000))
        .expect("commit plan");

    for idx in 0..expense_count {
        let key = BucketKey::ALL[idx % BucketKey::ALL.len()];
        let day = NaiveDate::from_ymd_opt(2025, 1, 1 + (idx % 28) as u32).expect("valid day");
        let draft = ExpenseDraft::new(
            Money::from_cents(500 + (idx % 100) as i64),
            Category::Bucket(key),
            format!("expense {idx}"),
            day,
        )
        .expect("valid draft");
        ExpenseLedger::add(&mut state, draft, start + Duration::seconds(idx as i64))
            .expect("add expense");
    }
    state
}

fn bench_engine(c: &mut Criterion) {
    c.bench_function("post_1000_expenses", |b| {
        b.iter(|| black_box(build_sample_state(1_000)))
    });

    let state = build_sample_state(2_000);
    c.bench_function("recent_transactions_2000", |b| {
        b.iter(|| black_box(ExpenseLedger::recent_transactions(&state, 15).count()))
    });

    c.bench_function("end_all_weeks", |b| {
        b.iter_batched(
            || state.clone(),
            |mut state| {
                for key in BucketKey::ALL {
                    black_box(RebalanceEngine::end_week(&mut state, key).expect("end week"));
                }
            },
            BatchSize::SmallInput,
        )
    });

    let dir = tempdir().expect("temp dir");
    let storage = JsonStorage::new(Some(dir.path().to_path_buf()), Some(2)).expect("storage");
    c.bench_function("save_load_snapshot_2000", |b| {
        b.iter(|| {
            storage.save(&state).expect("save snapshot");
            black_box(storage.load(state.month_anchor).expect("load snapshot"))
        })
    });
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
