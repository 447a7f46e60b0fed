//! KPI engine benchmarks

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use moorkpi::{
    AlarmEvent, CanonicalDuration, EngineConfig, EventType, KpiBatch, KpiEngine, KpiRequest,
    StateSample,
};

fn end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()
}

/// One Remote session per hour over `days`, each with a fault and a failure alarm
fn create_test_batch(days: i64) -> KpiBatch {
    let start = end() - Duration::days(days);
    let mut samples = Vec::new();
    let mut alarms = Vec::new();

    for hour in 0..days * 24 {
        let t = start + Duration::hours(hour);
        samples.push(StateSample::new("U1", t, 11));
        samples.push(StateSample::new("U1", t + Duration::minutes(10), 4));
        samples.push(StateSample::new("U1", t + Duration::minutes(20), 6));
        samples.push(StateSample::new("U1", t + Duration::minutes(40), 11));

        alarms.push(AlarmEvent::new("MoorUnit1", 1, "U1 in Remote", EventType::Raised, t));
        alarms.push(AlarmEvent::new(
            "MoorUnit1",
            20,
            "U1 Check Vacuum Failed",
            EventType::Raised,
            t + Duration::minutes(15),
        ));
        alarms.push(AlarmEvent::new(
            "MoorUnit1",
            1,
            "U1 in Remote",
            EventType::Cleared,
            t + Duration::minutes(50),
        ));
    }

    KpiBatch::new(samples, alarms).expect("Generated batch is ordered")
}

fn benchmark_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let engine = KpiEngine::new(EngineConfig::default()).expect("Failed to create engine");

    for (duration, days) in [
        (CanonicalDuration::OneDay, 1),
        (CanonicalDuration::ThirtyDays, 30),
        (CanonicalDuration::OneYear, 365),
    ] {
        let batch = create_test_batch(days);
        let request = KpiRequest::new("U1", duration).ending_at(end());

        group.bench_function(duration.code(), |b| {
            b.iter(|| black_box(engine.evaluate(&request, &batch)))
        });
    }

    group.finish();
}

fn benchmark_series(c: &mut Criterion) {
    let engine = KpiEngine::new(EngineConfig::default()).expect("Failed to create engine");
    let batch = create_test_batch(14);
    let request = KpiRequest::new("U1", CanonicalDuration::SevenDays).ending_at(end());

    c.bench_function("series_7D", |b| {
        b.iter(|| black_box(engine.series(&request, &batch)))
    });
}

criterion_group!(benches, benchmark_evaluate, benchmark_series);
criterion_main!(benches);
