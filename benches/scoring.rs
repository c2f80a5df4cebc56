//! Scoring benchmark: snapshot → matrix build → forest fit + batch scores.

use creep_audit::config::ScoringConfig;
use creep_audit::features::FeatureMatrix;
use creep_audit::model::{ForestParams, IsolationForest};
use creep_audit::risk::RiskEngine;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::{BTreeMap, BTreeSet};

fn make_snapshot(users: usize) -> BTreeMap<String, BTreeSet<String>> {
    let roles: [&[&str]; 4] = [
        &["view_salaries", "edit_profiles", "onboard_users"],
        &["access_github", "deploy_code", "read_logs"],
        &["process_payments", "view_tax_data", "approve_expenses"],
        &["db_admin", "server_root", "manage_cloud"],
    ];
    (0..users)
        .map(|i| {
            let mut held: BTreeSet<String> = roles[i % 4].iter().map(|p| p.to_string()).collect();
            held.extend(roles[(i + 1) % 4].iter().map(|p| p.to_string()));
            (format!("user_{:03}", i), held)
        })
        .collect()
}

fn bench_matrix_build(c: &mut Criterion) {
    let snapshot = make_snapshot(200);
    c.bench_function("matrix_build_200_users", |b| {
        b.iter(|| FeatureMatrix::build(black_box(&snapshot)).unwrap())
    });
}

fn bench_forest_fit_and_score(c: &mut Criterion) {
    let snapshot = make_snapshot(200);
    let matrix = FeatureMatrix::build(&snapshot).unwrap();
    let params = ForestParams::default();
    c.bench_function("forest_fit_200x12", |b| {
        b.iter(|| IsolationForest::fit(black_box(matrix.view()), &params).unwrap())
    });

    let forest = IsolationForest::fit(matrix.view(), &params).unwrap();
    c.bench_function("forest_score_batch_200", |b| {
        b.iter(|| black_box(forest.decision_batch(matrix.view())))
    });
}

fn bench_full_pass(c: &mut Criterion) {
    let snapshot = make_snapshot(200);
    let engine = RiskEngine::new(ScoringConfig::default());
    c.bench_function("full_scoring_pass_200_users", |b| {
        b.iter(|| {
            let matrix = FeatureMatrix::build(black_box(&snapshot)).unwrap();
            black_box(engine.score(&matrix))
        })
    });
}

criterion_group!(
    benches,
    bench_matrix_build,
    bench_forest_fit_and_score,
    bench_full_pass
);
criterion_main!(benches);
