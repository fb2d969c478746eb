use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use jobshop::greedy::{self, PriorityRule};
use jobshop::local_search::{Descent, TabuSearch};
use jobshop::Problem;

const FT06: &str = "\
6 6
2 1 0 3 1 6 3 7 5 3 4 6
1 8 2 5 4 10 5 10 0 10 3 4
2 5 3 4 5 8 0 9 1 1 4 7
1 5 0 5 2 5 3 3 4 8 5 9
2 9 1 3 4 5 5 4 0 3 3 1
1 3 3 3 5 9 0 10 4 4 2 1
";

fn ft06() -> Problem {
    Problem::from_reader(FT06.as_bytes()).expect("ft06 parses")
}

fn far() -> Instant {
    Instant::now() + Duration::from_secs(3600)
}

fn bench_decode(c: &mut Criterion) {
    let problem = ft06();
    let order = greedy::construct(&problem, PriorityRule::EstLrpt);
    c.bench_function("decode_ft06", |b| {
        b.iter(|| black_box(order.decode(black_box(&problem)).makespan()))
    });
}

fn bench_greedy(c: &mut Criterion) {
    let problem = ft06();
    let mut group = c.benchmark_group("greedy_ft06");
    for rule in PriorityRule::ALL {
        group.bench_function(rule.to_string(), |b| {
            b.iter(|| black_box(greedy::construct(black_box(&problem), rule)))
        });
    }
    group.finish();
}

fn bench_descent(c: &mut Criterion) {
    let problem = ft06();
    let seed = greedy::construct(&problem, PriorityRule::EstLrpt);
    c.bench_function("descent_ft06", |b| {
        b.iter(|| black_box(Descent::default().search(&problem, seed.clone(), far()).makespan))
    });
}

fn bench_tabu(c: &mut Criterion) {
    let problem = ft06();
    let seed = greedy::construct(&problem, PriorityRule::EstLrpt);
    let tabu = TabuSearch::default();
    c.bench_function("tabu_ft06", |b| {
        b.iter(|| black_box(tabu.search(&problem, seed.clone(), far()).makespan))
    });
}

criterion_group!(benches, bench_decode, bench_greedy, bench_descent, bench_tabu);
criterion_main!(benches);
