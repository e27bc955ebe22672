use autoplot_charts::core::{AxesLimits, DataPoint, LinearAxes, PixelRect};
use autoplot_charts::format::number_format;
use autoplot_charts::plugins::tooltip::resolve_label_overlaps;
use autoplot_charts::search::{DEFAULT_TOLERANCE_PX, nearest_sample, tolerance_buffer};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn minute_series(count: usize) -> Vec<DataPoint> {
    (0..count)
        .map(|i| {
            let t = i as f64 * 60.0;
            DataPoint::new(t, (t / 3_600.0).sin() * 100.0)
        })
        .collect()
}

fn bench_nearest_sample_100k(c: &mut Criterion) {
    let points = minute_series(100_000);
    let span = points[points.len() - 1].x;
    let axes = LinearAxes::new(
        PixelRect::new(60.0, 20.0, 1_200.0, 600.0),
        AxesLimits::new((0.0, span), (-100.0, 100.0)),
    )
    .expect("valid axes");
    let tolerance = tolerance_buffer(&axes, &points, DEFAULT_TOLERANCE_PX).expect("tolerance");

    c.bench_function("nearest_sample_100k", |b| {
        let mut target = 0.0;
        b.iter(|| {
            target = (target + 7_919.0) % span;
            let _ = nearest_sample(black_box(&points), black_box(target), tolerance);
        })
    });
}

fn bench_number_format(c: &mut Criterion) {
    let values = [0.000_42, 0.73, 42.125, 9_999.96, 123_456.0, 7_500_000.0];

    c.bench_function("number_format_mixed", |b| {
        b.iter(|| {
            for value in values {
                let _ = number_format(black_box(value)).format(value);
            }
        })
    });
}

fn bench_label_overlaps_32(c: &mut Criterion) {
    let anchors: Vec<f64> = (0..32).map(|i| f64::from((i * 37) % 200)).collect();

    c.bench_function("resolve_label_overlaps_32", |b| {
        b.iter(|| {
            let _ = resolve_label_overlaps(black_box(&anchors), 18.0);
        })
    });
}

criterion_group!(
    benches,
    bench_nearest_sample_100k,
    bench_number_format,
    bench_label_overlaps_32
);
criterion_main!(benches);
