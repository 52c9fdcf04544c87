use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use proxyvote_governance::{
    GovernorDescription, GovernorKeeper, GovernorParams, VoteOption, WeightedVoteOptions,
};
use proxyvote_nullables::{NullKvStore, NullStakingOracle};
use proxyvote_types::{AccountAddress, Dec, GovernorAddress, Int, ProposalId, ValidatorAddress};

const VALIDATORS: usize = 10;

fn make_keeper(governors: usize) -> (
    GovernorKeeper<NullKvStore, NullStakingOracle>,
    BTreeMap<GovernorAddress, WeightedVoteOptions>,
) {
    let oracle = NullStakingOracle::new();
    for v in 0..VALIDATORS {
        oracle.set_validator(
            &ValidatorAddress::new(format!("val1v{v}")),
            Int::from(1_000_000u64 + v as u64),
            Dec::from(1_000_000u64),
        );
    }
    let params = GovernorParams {
        max_governors: 100,
        min_governor_self_delegation: "0".to_string(),
    };
    let keeper = GovernorKeeper::new(NullKvStore::new(), oracle, params);

    let mut votes = BTreeMap::new();
    for g in 0..governors {
        let account = AccountAddress::new(format!("acc1g{g}"));
        for v in 0..VALIDATORS {
            keeper.oracle().set_delegation(
                &account,
                &ValidatorAddress::new(format!("val1v{v}")),
                Dec::from((g * 31 + v * 7) as u64 + 1),
            );
        }
        let address = GovernorAddress::from_account(&account);
        keeper
            .create_governor(&address, GovernorDescription::new(format!("g{g}")))
            .unwrap();
        let option = if g % 3 == 0 { VoteOption::No } else { VoteOption::Yes };
        votes.insert(address, WeightedVoteOptions::single(option));
    }
    (keeper, votes)
}

fn bench_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("governor_tally");

    for governors in [10, 100, 500] {
        let (keeper, votes) = make_keeper(governors);
        group.bench_with_input(BenchmarkId::new("tally", governors), &governors, |b, _| {
            b.iter(|| {
                black_box(
                    keeper
                        .tally_engine()
                        .tally(black_box(ProposalId::new(1)), black_box(&votes))
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_refresh_voting_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_voting_power");
    let (keeper, _) = make_keeper(100);
    let target = GovernorAddress::new("gov1g50");

    group.bench_function("single_governor", |b| {
        b.iter(|| black_box(keeper.refresh_voting_power(black_box(&target)).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_tally, bench_refresh_voting_power);
criterion_main!(benches);
