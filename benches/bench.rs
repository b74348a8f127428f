// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{Duration, NaiveDate};
use criterion::*;
use indexmap::IndexMap;

use podcal::{
    harmonization::{build_aligned_pair, train},
    AggregationMode, PodTimeseries, Resampler,
};

/// A week of minutely readings.
fn pod(gain: f64, offset: f64) -> PodTimeseries {
    let start = NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let num_rows = 7 * 24 * 60;
    let timestamps = (0..num_rows)
        .map(|i| start + Duration::minutes(i))
        .collect::<Vec<_>>();
    let readings = (0..num_rows)
        .map(|i| gain * (300.0 + (i as f64 / 90.0).sin() * 40.0) + offset)
        .collect();
    let mut columns = IndexMap::new();
    columns.insert("Fig2600".to_string(), readings);
    PodTimeseries::new(timestamps, columns).unwrap()
}

fn harmonization(c: &mut Criterion) {
    let colocation = pod(1.0, 0.0);
    let field_pod = pod(0.8, 12.0);
    let resampler = Resampler::new(Duration::minutes(5), AggregationMode::Median).unwrap();

    c.bench_function("resample and align one sensor", |b| {
        b.iter(|| {
            build_aligned_pair(&colocation, &field_pod, "Fig2600", &resampler, None).unwrap()
        })
    });

    let pair = build_aligned_pair(&colocation, &field_pod, "Fig2600", &resampler, None).unwrap();
    c.bench_function("train with 5 folds", |b| b.iter(|| train(&pair, 5).unwrap()));
}

criterion_group!(benches, harmonization);
criterion_main!(benches);
