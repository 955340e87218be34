//! Anchor specifications and translational freedom

use serde::{Deserialize, Serialize};

use crate::math::{is_finite_point, Point3, Vec3};

/// Smallest accepted search tolerance for anchors and loads
pub const MIN_SEARCH_TOLERANCE: f64 = 1e-5;

/// Translational freedom of an anchored node.
///
/// `true` means the node may move along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Freedom {
    /// Free to translate along X
    pub x: bool,
    /// Free to translate along Y
    pub y: bool,
    /// Free to translate along Z
    pub z: bool,
}

impl Freedom {
    /// No translation allowed
    pub fn fixed() -> Self {
        Self::default()
    }

    /// Every axis free (an anchor that restricts nothing)
    pub fn free() -> Self {
        Self { x: true, y: true, z: true }
    }

    /// Free only along Z, e.g. a vertical slider
    pub fn slider_z() -> Self {
        Self { x: false, y: false, z: true }
    }

    /// Free in the XY plane
    pub fn planar_xy() -> Self {
        Self { x: true, y: true, z: false }
    }

    pub fn with_axes(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// All three translations restrained
    pub fn is_fixed(&self) -> bool {
        !self.x && !self.y && !self.z
    }

    /// Number of free axes (0-3)
    pub fn num_free(&self) -> usize {
        [self.x, self.y, self.z].iter().filter(|&&f| f).count()
    }

    /// Zero the components of `v` along restrained axes
    pub fn project(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            if self.x { v.x } else { 0.0 },
            if self.y { v.y } else { 0.0 },
            if self.z { v.z } else { 0.0 },
        )
    }
}

/// Input descriptor pinning the network near a point.
///
/// Consumed once by [`crate::model::ChainModel::build`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Anchor location
    pub position: Point3,
    /// Search tolerance to the closest chain
    pub tolerance: f64,
    /// Allowed translations of the anchored node
    pub freedom: Freedom,
}

impl Anchor {
    /// Create an anchor; negative tolerances are made positive and clamped
    pub fn new(position: Point3, tolerance: f64, freedom: Freedom) -> Self {
        Self {
            position,
            tolerance: tolerance.abs().max(MIN_SEARCH_TOLERANCE),
            freedom,
        }
    }

    /// Fully fixed anchor with the default 0.01 tolerance
    pub fn fixed(position: Point3) -> Self {
        Self::new(position, 0.01, Freedom::fixed())
    }

    /// Set the translational freedom
    pub fn with_freedom(mut self, freedom: Freedom) -> Self {
        self.freedom = freedom;
        self
    }

    /// Set the search tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs().max(MIN_SEARCH_TOLERANCE);
        self
    }

    pub fn is_valid(&self) -> bool {
        is_finite_point(&self.position) && self.tolerance.is_finite()
    }
}
