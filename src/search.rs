//! Nearest-sample lookup over time-ordered series.

use smallvec::SmallVec;

use crate::core::{AxesView, DataPoint};
use crate::error::PlotResult;

/// Pixel allowance beyond either end of a line within which the end sample
/// still counts as a match.
pub const DEFAULT_TOLERANCE_PX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSample {
    pub index: usize,
    pub point: DataPoint,
}

/// Converts a pixel allowance into data units for one rendered line.
///
/// The ratio comes from the line's own pixel width over its time span. Lines
/// with a single sample (or zero span) fall back to the axes' scale.
pub fn tolerance_buffer(
    axes: &dyn AxesView,
    points: &[DataPoint],
    tolerance_px: f64,
) -> PlotResult<f64> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(0.0);
    };

    let data_span = last.x - first.x;
    let pixel_span = (axes.x_to_px(last.x)? - axes.x_to_px(first.x)?).abs();
    let units_per_px = if data_span > 0.0 && pixel_span > f64::EPSILON {
        data_span / pixel_span
    } else {
        let (start, end) = axes.x_domain();
        (end - start).abs() / axes.bounds().width
    };
    Ok(tolerance_px * units_per_px)
}

/// Returns the sample closest to `target`, or `None` when the target lies
/// outside the series by more than `tolerance` data units.
#[must_use]
pub fn nearest_sample(points: &[DataPoint], target: f64, tolerance: f64) -> Option<NearestSample> {
    nearest_sample_index(points, target, tolerance).map(|index| NearestSample {
        index,
        point: points[index],
    })
}

/// Index form of [`nearest_sample`].
///
/// Inside the series range this walks with a step that starts at half the
/// sample count and halves down to one, moving only when a neighbor is
/// strictly closer. Equal-distance candidates never replace the current one.
///
/// Repeated timestamps resolve to the first sample carrying that time, so
/// the returned index never decreases as `target` grows.
#[must_use]
pub fn nearest_sample_index(points: &[DataPoint], target: f64, tolerance: f64) -> Option<usize> {
    if !target.is_finite() {
        return None;
    }
    let first = points.first()?;
    let last = points.last()?;

    let index = if target < first.x {
        (first.x - target <= tolerance).then_some(0)?
    } else if target > last.x {
        (target - last.x <= tolerance).then_some(points.len() - 1)?
    } else {
        step_search(points, target)
    };
    Some(first_of_run(points, index))
}

fn first_of_run(points: &[DataPoint], index: usize) -> usize {
    let time = points[index].x;
    points[..index].partition_point(|point| point.x < time)
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

fn step_search(points: &[DataPoint], target: f64) -> usize {
    let distance = |index: usize| (points[index].x - target).abs();
    let mut index = 0;
    let mut step = (points.len() / 2).max(1);

    loop {
        let current = distance(index);
        let neighbors: SmallVec<[usize; 2]> = [Direction::Forward, Direction::Backward]
            .into_iter()
            .filter_map(|direction| distinct_neighbor(points, index, step, direction))
            .collect();

        match neighbors.into_iter().find(|&candidate| distance(candidate) < current) {
            Some(next) => index = next,
            None if step == 1 => return index,
            None => step = (step / 2).max(1),
        }
    }
}

/// Neighbor `step` samples away, skipping repeats of the current timestamp so
/// duplicated times cannot stall the walk.
fn distinct_neighbor(
    points: &[DataPoint],
    index: usize,
    step: usize,
    direction: Direction,
) -> Option<usize> {
    let origin = points[index].x;
    match direction {
        Direction::Forward => {
            let mut candidate = index.checked_add(step)?;
            while points.get(candidate)?.x == origin {
                candidate += 1;
            }
            Some(candidate)
        }
        Direction::Backward => {
            let mut candidate = index.checked_sub(step)?;
            while points[candidate].x == origin {
                candidate = candidate.checked_sub(1)?;
            }
            Some(candidate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(count: usize) -> Vec<DataPoint> {
        (0..count)
            .map(|i| DataPoint::new(i as f64 * 86_400.0, i as f64))
            .collect()
    }

    #[test]
    fn exact_timestamps_resolve_to_their_index() {
        let points = daily(37);
        for (index, point) in points.iter().enumerate() {
            assert_eq!(nearest_sample_index(&points, point.x, 0.0), Some(index));
        }
    }

    #[test]
    fn between_samples_picks_the_closer_one() {
        let points = daily(10);
        assert_eq!(nearest_sample_index(&points, 3.2 * 86_400.0, 0.0), Some(3));
        assert_eq!(nearest_sample_index(&points, 3.8 * 86_400.0, 0.0), Some(4));
    }

    #[test]
    fn midpoint_ties_are_reproducible() {
        let points = daily(10);
        let first = nearest_sample_index(&points, 4.5 * 86_400.0, 0.0);
        let second = nearest_sample_index(&points, 4.5 * 86_400.0, 0.0);
        assert_eq!(first, second);
        assert!(matches!(first, Some(4) | Some(5)));
    }

    #[test]
    fn out_of_range_targets_respect_tolerance() {
        let points = daily(5);
        let tolerance = 86_400.0 / 2.0;
        assert_eq!(nearest_sample_index(&points, -1_000.0, tolerance), Some(0));
        assert_eq!(nearest_sample_index(&points, -86_400.0, tolerance), None);
        assert_eq!(
            nearest_sample_index(&points, 4.0 * 86_400.0 + 1_000.0, tolerance),
            Some(4)
        );
        assert_eq!(nearest_sample_index(&points, 6.0 * 86_400.0, tolerance), None);
    }

    #[test]
    fn repeated_timestamps_do_not_stall_the_walk() {
        let mut points = vec![DataPoint::new(0.0, 0.0); 6];
        points.extend((1..5).map(|i| DataPoint::new(f64::from(i) * 10.0, 0.0)));
        assert_eq!(nearest_sample_index(&points, 39.0, 0.0), Some(9));
        assert_eq!(nearest_sample_index(&points, 1.0, 0.0), Some(0));
    }

    #[test]
    fn repeated_timestamps_resolve_to_the_first_of_the_run() {
        let xs = [1.0, 2.0, 4.0, 5.0, 6.0, 7.0, 8.0, 8.0, 10.0, 10.0, 12.0];
        let points: Vec<DataPoint> = xs.iter().map(|&x| DataPoint::new(x, 0.0)).collect();
        assert_eq!(nearest_sample_index(&points, 8.0, 0.0), Some(6));
        assert_eq!(nearest_sample_index(&points, 9.75, 0.0), Some(8));
        assert_eq!(nearest_sample_index(&points, 10.0, 0.0), Some(8));

        let mut previous = 0;
        for step in 0..=48 {
            let target = f64::from(step) * 0.25;
            if let Some(index) = nearest_sample_index(&points, target, 1.0) {
                assert!(index >= previous, "index fell from {previous} to {index} at {target}");
                previous = index;
            }
        }
    }

    #[test]
    fn empty_series_has_no_match() {
        assert_eq!(nearest_sample_index(&[], 1.0, 10.0), None);
    }
}
