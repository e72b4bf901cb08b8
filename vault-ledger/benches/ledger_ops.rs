use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use vault_ledger::{state::LedgerState, AccountId, InMemorySink, Ledger, Limits};

fn bench_state_transitions(c: &mut Criterion) {
    let accounts: Vec<AccountId> = (0..64).map(|i| AccountId::new(format!("acct-{i}"))).collect();

    c.bench_function("state_credit_debit", |b| {
        let mut state = LedgerState::new(Limits::new(u128::MAX, 1_000));
        let mut i = 0usize;
        b.iter(|| {
            let account = &accounts[i % accounts.len()];
            i += 1;
            state.credit(account, 10).unwrap();
            let staged = state.debit(account, 10).unwrap();
            state.commit(staged)
        })
    });
}

fn bench_actor_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = rt.block_on(async {
        Ledger::initialize(Limits::new(u128::MAX, 1_000), Arc::new(InMemorySink::new()))
            .await
            .unwrap()
    });
    let alice = AccountId::new("alice");

    c.bench_function("ledger_deposit_withdraw", |b| {
        b.to_async(&rt).iter(|| async {
            ledger.deposit(&alice, 10).await.unwrap();
            ledger.withdraw(&alice, 10).await.unwrap()
        })
    });

    rt.block_on(ledger.shutdown()).unwrap();
}

criterion_group!(benches, bench_state_transitions, bench_actor_round_trip);
criterion_main!(benches);
