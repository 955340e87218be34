//! Solid regions used by region loads

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::math::{is_finite_point, is_finite_vector, Point3, Vec3};

/// Regions with a smaller volume are rejected
pub const MIN_REGION_VOLUME: f64 = 1e-6;

/// A closed solid used to select nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Region {
    /// Axis-aligned box
    Box { min: Point3, max: Point3 },
    /// Sphere
    Sphere { center: Point3, radius: f64 },
    /// Capped cylinder from `base` along `axis` (axis length = height)
    Cylinder { base: Point3, axis: Vec3, radius: f64 },
}

impl Region {
    /// Axis-aligned box spanning two corners in any order
    pub fn aabb(a: Point3, b: Point3) -> Self {
        Region::Box {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    pub fn sphere(center: Point3, radius: f64) -> Self {
        Region::Sphere {
            center,
            radius: radius.abs(),
        }
    }

    pub fn cylinder(base: Point3, axis: Vec3, radius: f64) -> Self {
        Region::Cylinder {
            base,
            axis,
            radius: radius.abs(),
        }
    }

    pub fn volume(&self) -> f64 {
        match self {
            Region::Box { min, max } => {
                let d = max - min;
                (d.x * d.y * d.z).abs()
            }
            Region::Sphere { radius, .. } => 4.0 / 3.0 * PI * radius.powi(3),
            Region::Cylinder { axis, radius, .. } => PI * radius * radius * axis.norm(),
        }
    }

    /// Finite geometry enclosing a non-negligible volume
    pub fn is_valid(&self) -> bool {
        let finite = match self {
            Region::Box { min, max } => is_finite_point(min) && is_finite_point(max),
            Region::Sphere { center, radius } => is_finite_point(center) && radius.is_finite(),
            Region::Cylinder { base, axis, radius } => {
                is_finite_point(base) && is_finite_vector(axis) && radius.is_finite()
            }
        };
        finite && self.volume() > MIN_REGION_VOLUME
    }

    /// Point-inside test, with the surface inflated by `tolerance`
    pub fn contains(&self, pt: &Point3, tolerance: f64) -> bool {
        match self {
            Region::Box { min, max } => (0..3).all(|i| {
                pt[i] >= min[i] - tolerance && pt[i] <= max[i] + tolerance
            }),
            Region::Sphere { center, radius } => (pt - center).norm() <= radius + tolerance,
            Region::Cylinder { base, axis, radius } => {
                let height = axis.norm();
                if height <= 0.0 {
                    return false;
                }
                let dir = axis / height;
                let rel = pt - base;
                let along = rel.dot(&dir);
                if along < -tolerance || along > height + tolerance {
                    return false;
                }
                (rel - dir * along).norm() <= radius + tolerance
            }
        }
    }
}
