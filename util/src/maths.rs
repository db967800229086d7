//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Map a value from one range into another, saturating the result to the
/// target range.
pub fn lin_map_sat<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    let (lo, hi) = if target_range.0 < target_range.1 {
        (target_range.0, target_range.1)
    }
    else {
        (target_range.1, target_range.0)
    };

    lin_map(source_range, target_range, value).max(lo).min(hi)
}

/// Return the shortest distance between a point and the segment `start` to
/// `end`.
///
/// Degenerate (zero length) segments are treated as a single point.
pub fn dist_point_to_segment(
    point: &Vector2<f64>, 
    start: &Vector2<f64>, 
    end: &Vector2<f64>
) -> f64 {
    let seg = end - start;
    let len_sq = seg.norm_squared();

    if len_sq == 0.0 {
        return (point - start).norm();
    }

    // Projection of the point onto the segment, as a fraction of its length
    let t = ((point - start).dot(&seg) / len_sq).max(0.0).min(1.0);

    (point - (start + seg * t)).norm()
}

/// Return the shortest distance between a point and a polyline.
///
/// Returns `None` if the polyline has fewer than two points.
pub fn dist_point_to_polyline(point: &Vector2<f64>, line: &[Vector2<f64>]) -> Option<f64> {
    line.windows(2)
        .map(|w| dist_point_to_segment(point, &w[0], &w[1]))
        .fold(None, |min, d| match min {
            Some(m) if m <= d => Some(m),
            _ => Some(d)
        })
}
