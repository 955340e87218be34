//! Mirror plane

use serde::{Deserialize, Serialize};

use super::{Mat4, Point3, Vec3};

/// An infinite plane defined by an origin and a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane; the normal is normalized. A zero normal falls back to +Z.
    pub fn new(origin: Point3, normal: Vec3) -> Self {
        let normal = normal.try_normalize(1e-12).unwrap_or_else(Vec3::z);
        Self { origin, normal }
    }

    /// The world XY plane
    pub fn world_xy() -> Self {
        Self::new(Point3::origin(), Vec3::z())
    }

    /// Signed distance from the plane along its normal
    pub fn signed_distance(&self, pt: &Point3) -> f64 {
        (pt - self.origin).dot(&self.normal)
    }

    /// Reflect a point across the plane
    pub fn mirror_point(&self, pt: &Point3) -> Point3 {
        pt - self.normal * (2.0 * self.signed_distance(pt))
    }

    /// Homogeneous reflection matrix (Householder about the plane)
    pub fn mirror_transform(&self) -> Mat4 {
        let n = self.normal;
        let d = self.origin.coords.dot(&n);
        let mut m = Mat4::identity();
        for r in 0..3 {
            for c in 0..3 {
                m[(r, c)] -= 2.0 * n[r] * n[c];
            }
            m[(r, 3)] = 2.0 * d * n[r];
        }
        m
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::world_xy()
    }
}
