use autoplot_charts::core::{AxesLimits, DataPoint, LinearAxes, PixelRect};
use autoplot_charts::format::number_format;
use autoplot_charts::geometry::{canvas_px_to_time, x_to_canvas_px};
use autoplot_charts::plugins::tooltip::resolve_label_overlaps;
use autoplot_charts::search::nearest_sample_index;
use proptest::prelude::*;

fn sorted_points(mut times: Vec<f64>) -> Vec<DataPoint> {
    times.sort_by(f64::total_cmp);
    times
        .into_iter()
        .enumerate()
        .map(|(index, x)| DataPoint::new(x, index as f64))
        .collect()
}

proptest! {
    #[test]
    fn nearest_sample_is_never_beaten_by_another_sample(
        times in proptest::collection::vec(-1_000_000.0f64..1_000_000.0, 1..200),
        fraction in 0.0f64..=1.0
    ) {
        let points = sorted_points(times);
        let first = points[0].x;
        let last = points[points.len() - 1].x;
        let target = first + (last - first) * fraction;

        let index = nearest_sample_index(&points, target, 0.0);
        prop_assert!(index.is_some());
        let found = (points[index.unwrap_or_default()].x - target).abs();
        let best = points
            .iter()
            .map(|point| (point.x - target).abs())
            .fold(f64::INFINITY, f64::min);
        prop_assert!((found - best).abs() <= 1e-9);
    }

    #[test]
    fn nearest_sample_with_repeated_timestamps_stays_in_bounds(
        steps in proptest::collection::vec(0u8..3, 1..120),
        target in 0.0f64..240.0
    ) {
        let mut x = 0.0;
        let mut points = vec![DataPoint::new(0.0, 0.0)];
        for step in &steps {
            x += f64::from(*step);
            points.push(DataPoint::new(x, 0.0));
        }

        let tolerance = 1.0;
        match nearest_sample_index(&points, target, tolerance) {
            Some(index) => prop_assert!(index < points.len()),
            None => prop_assert!(target > x + tolerance),
        }
    }

    #[test]
    fn nearest_index_never_decreases_as_the_target_advances(
        steps in proptest::collection::vec(0u8..3, 1..120),
        start in 0u8..4
    ) {
        let mut x = f64::from(start);
        let mut points = vec![DataPoint::new(x, 0.0)];
        for step in &steps {
            x += f64::from(*step);
            points.push(DataPoint::new(x, 0.0));
        }

        let mut previous = 0usize;
        let mut target = -1.0;
        while target <= x + 1.0 {
            if let Some(index) = nearest_sample_index(&points, target, 0.5) {
                prop_assert!(
                    index >= previous,
                    "index fell from {} to {} at target {}", previous, index, target
                );
                previous = index;
            }
            target += 0.25;
        }
    }

    #[test]
    fn canvas_pixels_round_trip_to_time(
        start in -1.0e9f64..1.0e9,
        span in 60.0f64..1.0e8,
        left in 0.0f64..200.0,
        width in 50.0f64..2_000.0,
        fraction in 0.0f64..=1.0
    ) {
        let axes = LinearAxes::new(
            PixelRect::new(left, 10.0, width, 100.0),
            AxesLimits::new((start, start + span), (0.0, 1.0)),
        )
        .expect("axes");
        let time = start + span * fraction;

        let px = x_to_canvas_px(&axes, time).expect("to canvas");
        prop_assert!(px >= left - 1e-6 && px <= left + width + 1e-6);
        let back = canvas_px_to_time(&axes, px).expect("to time");
        prop_assert!((back - time).abs() <= span * 1e-9 + start.abs() * 1e-12);
    }

    #[test]
    fn resolved_labels_never_overlap(
        anchors in proptest::collection::vec(-500.0f64..500.0, 0..24),
        height in 1.0f64..40.0
    ) {
        let tops = resolve_label_overlaps(&anchors, height);
        prop_assert_eq!(tops.len(), anchors.len());
        for (top, anchor) in tops.iter().zip(&anchors) {
            prop_assert!(*top >= *anchor);
        }

        let mut sorted = tops.clone();
        sorted.sort_by(f64::total_cmp);
        for pair in sorted.windows(2) {
            prop_assert!(pair[1] - pair[0] >= height - 1e-9);
        }
    }

    #[test]
    fn finite_values_always_format(value in -1.0e12f64..1.0e12) {
        let text = number_format(value).format(value);
        prop_assert!(!text.is_empty());
        prop_assert_ne!(text, "nan");
    }
}
