//! Geometric utilities for network construction

mod line;
mod plane;

use nalgebra::{Matrix4, Point3 as NPoint3, Vector3};

pub use line::Line;
pub use plane::Plane;

pub type Point3 = NPoint3<f64>;
pub type Vec3 = Vector3<f64>;
/// Homogeneous 4x4 transform
pub type Mat4 = Matrix4<f64>;

/// Lines shorter than this are degenerate
pub const MIN_LINE_LENGTH: f64 = 1e-12;

/// Check that every coordinate of a point is finite
pub fn is_finite_point(pt: &Point3) -> bool {
    pt.coords.iter().all(|c| c.is_finite())
}

/// Check that every component of a vector is finite
pub fn is_finite_vector(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Remove points lying closer than `min_distance` to an already accepted point.
///
/// The first occurrence wins; order is preserved. Non-finite points are skipped.
pub fn remove_duplicate_points(points: &[Point3], min_distance: f64) -> Vec<Point3> {
    let min_dist_squared = min_distance * min_distance;
    let mut accepted: Vec<Point3> = Vec::with_capacity(points.len());

    for pt in points.iter().filter(|p| is_finite_point(p)) {
        let duplicate = accepted
            .iter()
            .any(|a| (pt - a).norm_squared() < min_dist_squared);
        if !duplicate {
            accepted.push(*pt);
        }
    }

    accepted
}

/// Index of the point closest to `target`, or `None` for an empty slice
pub fn closest_point_index(points: &[Point3], target: &Point3) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p - target).norm_squared()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Result of a closest-point search over a set of lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestLinePoint {
    /// Closest point on the winning line
    pub point: Point3,
    /// Index of the winning line
    pub line_index: usize,
    /// Distance from the query point to `point`
    pub distance: f64,
}

/// Find the closest point to `pt` over all `lines`
///
/// # Arguments
/// * `pt` - Query point
/// * `lines` - Candidate lines (degenerate lines are ignored)
///
/// # Returns
/// `None` if the point is not finite or there is no usable line
pub fn point_on_closest_lines(pt: &Point3, lines: &[Line]) -> Option<ClosestLinePoint> {
    if !is_finite_point(pt) {
        return None;
    }

    let mut best: Option<ClosestLinePoint> = None;
    for (i, line) in lines.iter().enumerate().filter(|(_, l)| l.is_valid()) {
        let candidate = line.closest_point(pt);
        let distance = (pt - candidate).norm();
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(ClosestLinePoint {
                point: candidate,
                line_index: i,
                distance,
            });
        }
    }
    best
}

/// Check whether `pt` lies within `tolerance` of any of the `lines`
pub fn is_point_on_lines(pt: &Point3, lines: &[Line], tolerance: f64) -> bool {
    lines
        .iter()
        .filter(|l| l.is_valid())
        .any(|l| l.distance_to(pt) < tolerance)
}
