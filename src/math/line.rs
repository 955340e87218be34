//! Straight line segment

use serde::{Deserialize, Serialize};

use super::{is_finite_point, Mat4, Point3, Vec3, MIN_LINE_LENGTH};

/// A straight segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start point
    pub from: Point3,
    /// End point
    pub to: Point3,
}

impl Line {
    /// Create a new line
    pub fn new(from: Point3, to: Point3) -> Self {
        Self { from, to }
    }

    /// Create a line from raw coordinates
    pub fn from_coords(from: [f64; 3], to: [f64; 3]) -> Self {
        Self::new(
            Point3::new(from[0], from[1], from[2]),
            Point3::new(to[0], to[1], to[2]),
        )
    }

    /// Vector from start to end
    pub fn direction(&self) -> Vec3 {
        self.to - self.from
    }

    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// A line is usable when both ends are finite and it is not degenerate
    pub fn is_valid(&self) -> bool {
        is_finite_point(&self.from) && is_finite_point(&self.to) && self.length() > MIN_LINE_LENGTH
    }

    /// Point at normalized parameter `t` (0 = start, 1 = end)
    pub fn point_at(&self, t: f64) -> Point3 {
        self.from + self.direction() * t
    }

    /// Normalized parameter of the closest point, clamped to the segment
    pub fn closest_parameter(&self, pt: &Point3) -> f64 {
        let dir = self.direction();
        let len_sq = dir.norm_squared();
        if len_sq <= MIN_LINE_LENGTH * MIN_LINE_LENGTH {
            return 0.0;
        }
        ((pt - self.from).dot(&dir) / len_sq).clamp(0.0, 1.0)
    }

    pub fn closest_point(&self, pt: &Point3) -> Point3 {
        self.point_at(self.closest_parameter(pt))
    }

    pub fn distance_to(&self, pt: &Point3) -> f64 {
        (pt - self.closest_point(pt)).norm()
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.to, self.from)
    }

    /// Apply a homogeneous transform to both ends
    pub fn transformed(&self, xform: &Mat4) -> Self {
        Self::new(xform.transform_point(&self.from), xform.transform_point(&self.to))
    }

    /// Split the segment at the given normalized parameters.
    ///
    /// Parameters outside (0, 1) are ignored, the rest are sorted.
    /// Pieces shorter than `min_length` are dropped.
    pub fn split_at(&self, params: &[f64], min_length: f64) -> Vec<Line> {
        let mut ts: Vec<f64> = params
            .iter()
            .copied()
            .filter(|t| t.is_finite() && *t > 0.0 && *t < 1.0)
            .collect();
        ts.sort_by(|a, b| a.total_cmp(b));

        let mut cuts = Vec::with_capacity(ts.len() + 2);
        cuts.push(0.0);
        cuts.extend(ts);
        cuts.push(1.0);

        cuts.windows(2)
            .map(|w| {
                // exact ends keep junction points bit-identical
                let a = if w[0] == 0.0 { self.from } else { self.point_at(w[0]) };
                let b = if w[1] == 1.0 { self.to } else { self.point_at(w[1]) };
                Line::new(a, b)
            })
            .filter(|seg| seg.length() >= min_length)
            .collect()
    }

    /// Sample `divisions + 1` points at equal parametric spacing, ends included
    pub fn divide_by_count(&self, divisions: usize) -> Vec<Point3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| {
                if i == 0 {
                    self.from
                } else if i == divisions {
                    self.to
                } else {
                    self.point_at(i as f64 / divisions as f64)
                }
            })
            .collect()
    }
}
