use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

use agora_core::{
    create_power_aggregator, LocalScriptRunner, MockCheckpointedToken, MockStakingLedger,
    PowerAggregator, SourceKind, StaticPermissions, StaticProviderDirectory,
};

const ADMIN: &str = "root";
const USER: &str = "user1";

fn build_aggregator(rt: &Runtime, sources: usize) -> Arc<PowerAggregator> {
    let permissions = Arc::new(StaticPermissions::new());
    permissions.grant_all(ADMIN);
    let directory = Arc::new(StaticProviderDirectory::new());
    let aggregator = create_power_aggregator(
        permissions,
        directory.clone(),
        Arc::new(LocalScriptRunner::new()),
    );

    rt.block_on(async {
        aggregator
            .initialize("Voting Aggregator", "VA", 18)
            .await
            .unwrap();

        // Alternate checkpointed and staking sources.
        for ii in 0..sources {
            let address = format!("0xsource{:02}", ii);
            if ii % 2 == 0 {
                let token = Arc::new(MockCheckpointedToken::new());
                for checkpoint in 1..=100u64 {
                    token.set_balance_at(USER, checkpoint, checkpoint as u128 * 10);
                }
                directory.register_token(&address, token);
                aggregator
                    .add_power_source(ADMIN, &address, SourceKind::CheckpointedBalance, 1)
                    .await
                    .unwrap();
            } else {
                let staking = Arc::new(MockStakingLedger::new());
                for checkpoint in 1..=100u64 {
                    staking.set_stake_at(USER, checkpoint, checkpoint as u128 * 20);
                }
                directory.register_staking(&address, staking);
                aggregator
                    .add_power_source(ADMIN, &address, SourceKind::Stake, 3)
                    .await
                    .unwrap();
            }
        }
    });

    aggregator
}

fn bench_aggregation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("PowerAggregator");

    for sources in [2usize, 10, 20] {
        let aggregator = build_aggregator(&rt, sources);

        group.bench_function(BenchmarkId::new("balance_of", sources), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let _ = black_box(aggregator.balance_of(USER).await);
                });
            });
        });

        group.bench_function(BenchmarkId::new("balance_of_at", sources), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let _ = black_box(aggregator.balance_of_at(USER, 50).await);
                });
            });
        });

        group.bench_function(BenchmarkId::new("total_supply_at", sources), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let _ = black_box(aggregator.total_supply_at(50).await);
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_aggregation);
criterion_main!(benches);
