//! Load specifications

use serde::{Deserialize, Serialize};

use super::Region;
use crate::elements::MIN_SEARCH_TOLERANCE;
use crate::math::{is_finite_point, Line, Point3};

/// Kind of a load, without its geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadType {
    Point,
    Line,
    Region,
}

/// Externally applied mass, consumed once during network construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Load {
    /// Mass added to the single closest node
    Point {
        position: Point3,
        tolerance: f64,
        mass: f64,
    },
    /// Mass spread equally over the nodes near a line
    Line {
        line: Line,
        tolerance: f64,
        mass_per_length: f64,
    },
    /// Mass spread equally over the nodes inside a solid
    Region {
        region: Region,
        tolerance: f64,
        mass: f64,
    },
}

fn sanitize_tolerance(tolerance: f64) -> f64 {
    tolerance.abs().max(MIN_SEARCH_TOLERANCE)
}

impl Load {
    /// Create a point load
    pub fn point(position: Point3, tolerance: f64, mass: f64) -> Self {
        Load::Point {
            position,
            tolerance: sanitize_tolerance(tolerance),
            mass: mass.abs(),
        }
    }

    /// Create a linear load; the total mass is `mass_per_length * line.length()`
    pub fn line(line: Line, tolerance: f64, mass_per_length: f64) -> Self {
        Load::Line {
            line,
            tolerance: sanitize_tolerance(tolerance),
            mass_per_length: mass_per_length.abs(),
        }
    }

    /// Create a region load
    pub fn region(region: Region, tolerance: f64, mass: f64) -> Self {
        Load::Region {
            region,
            tolerance: sanitize_tolerance(tolerance),
            mass: mass.abs(),
        }
    }

    pub fn load_type(&self) -> LoadType {
        match self {
            Load::Point { .. } => LoadType::Point,
            Load::Line { .. } => LoadType::Line,
            Load::Region { .. } => LoadType::Region,
        }
    }

    pub fn tolerance(&self) -> f64 {
        match self {
            Load::Point { tolerance, .. }
            | Load::Line { tolerance, .. }
            | Load::Region { tolerance, .. } => *tolerance,
        }
    }

    /// Total mass carried by this load
    pub fn total_mass(&self) -> f64 {
        match self {
            Load::Point { mass, .. } | Load::Region { mass, .. } => *mass,
            Load::Line {
                line,
                mass_per_length,
                ..
            } => mass_per_length * line.length(),
        }
    }

    pub fn is_valid(&self) -> bool {
        let geometry = match self {
            Load::Point { position, .. } => is_finite_point(position),
            Load::Line { line, .. } => line.is_valid(),
            Load::Region { region, .. } => region.is_valid(),
        };
        geometry && self.tolerance().is_finite() && self.total_mass().is_finite()
    }
}
