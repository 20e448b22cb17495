//! Benchmarks for the Matching Engine
//!
//! Compares single-pair evaluation with full trial-set and patient-batch scans.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use trialmatch_core::{Criteria, MatchingEngine, Patient, Trial};

fn create_trial(index: usize) -> Trial {
    serde_json::from_value(json!({
        "trial_id": format!("NCT{:08}", index),
        "title": format!("Benchmark Trial {}", index),
        "description": "Trial for benchmarking",
        "criteria": {
            "stage": ["III", "IIIA", "IIIB", "IV"],
            "mutation_required": if index % 2 == 0 { json!("EGFR+") } else { json!(["KRAS G12C+", "ALK+"]) },
            "performance_status_max": (index % 3) as i64,
            "raw_inclusion": ["Histologically confirmed NSCLC"]
        }
    }))
    .unwrap()
}

fn create_patient(index: usize) -> Patient {
    let stages = ["I", "II", "IIIA", "IV"];
    let mutations = ["EGFR+", "KRAS G12C+", "None", "ALK+"];
    Patient {
        patient_id: format!("P{:05}", index),
        age: 40 + (index % 40) as u32,
        gender: if index % 2 == 0 { "F" } else { "M" }.to_string(),
        stage: stages[index % stages.len()].to_string(),
        mutation_status: mutations[index % mutations.len()].to_string(),
        smoker: index % 3 == 0,
        performance_status: (index % 5) as u8,
    }
}

fn create_engine(trial_count: usize) -> MatchingEngine {
    MatchingEngine::with_trials((0..trial_count).map(|i| (format!("trials/bench_{}.json", i), create_trial(i))))
}

fn bench_criteria_normalization(c: &mut Criterion) {
    let raw = json!({
        "stage": ["III", "IV"],
        "mutation_required": "EGFR+",
        "performance_status_max": "2",
        "raw_inclusion": ["Age >= 18"],
        "raw_exclusion": ["Prior TKI therapy"]
    });

    c.bench_function("criteria_from_value", |b| {
        b.iter(|| black_box(Criteria::from_value(black_box(&raw))))
    });
}

fn bench_single_match(c: &mut Criterion) {
    let engine = MatchingEngine::new();
    let criteria = create_trial(0).criteria;
    let patient = create_patient(3);

    c.bench_function("match_patient_to_trial", |b| {
        b.iter(|| black_box(engine.match_patient_to_trial(black_box(&patient), black_box(&criteria))))
    });
}

fn bench_find_matches_for_patient(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_matches_for_patient");
    let patient = create_patient(3);

    for trial_count in [5, 50, 500] {
        let engine = create_engine(trial_count);
        group.bench_with_input(BenchmarkId::from_parameter(trial_count), &trial_count, |b, _| {
            b.iter(|| black_box(engine.find_matches_for_patient(black_box(&patient))))
        });
    }

    group.finish();
}

fn bench_find_patients_for_trial(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_patients_for_trial");
    let engine = create_engine(5);

    for patient_count in [10, 1_000] {
        let patients: Vec<Patient> = (0..patient_count).map(create_patient).collect();
        group.bench_with_input(BenchmarkId::from_parameter(patient_count), &patients, |b, patients| {
            b.iter(|| black_box(engine.find_patients_for_trial("trials/bench_0.json", patients).unwrap()))
        });
    }

    group.finish();
}

fn bench_trial_reload(c: &mut Criterion) {
    let engine = MatchingEngine::new();
    let trials: Vec<(String, Trial)> = (0..50)
        .map(|i| (format!("trials/bench_{}.json", i), create_trial(i)))
        .collect();

    c.bench_function("load_trials_50", |b| {
        b.iter(|| engine.load_trials(black_box(trials.clone())))
    });
}

criterion_group!(
    benches,
    bench_criteria_normalization,
    bench_single_match,
    bench_find_matches_for_patient,
    bench_find_patients_for_trial,
    bench_trial_reload,
);
criterion_main!(benches);
