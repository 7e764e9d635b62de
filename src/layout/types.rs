//! Data structures for layout computation.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::Error;

/// A point or displacement in scene space. `y` is up; 2D layouts keep it at 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Mean of `points`, or the origin for an empty slice.
    pub fn centroid(points: &[Self]) -> Self {
        if points.is_empty() {
            return Self::ZERO;
        }
        let sum = points.iter().fold(Self::ZERO, |acc, &p| acc + p);
        sum / points.len() as f64
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    TwoD,
    #[default]
    ThreeD,
}

impl ViewMode {
    pub fn is_3d(self) -> bool {
        self == Self::ThreeD
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
        })
    }
}

impl FromStr for ViewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2d" => Ok(Self::TwoD),
            "3d" => Ok(Self::ThreeD),
            other => Err(Error::UnknownViewMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutAlgorithm {
    #[default]
    ForceDirected,
    Hierarchical,
    Circular,
}

impl fmt::Display for LayoutAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ForceDirected => "force",
            Self::Hierarchical => "hierarchical",
            Self::Circular => "circular",
        })
    }
}

impl FromStr for LayoutAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "force" | "force-directed" | "forcedirected" => Ok(Self::ForceDirected),
            "hierarchical" | "hierarchy" => Ok(Self::Hierarchical),
            "circular" | "circle" | "spherical" => Ok(Self::Circular),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Force-directed simulation constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceParams {
    pub iterations: usize,
    pub repulsion_2d: f64,
    pub repulsion_3d: f64,
    /// Pull toward the live centroid, 3D only.
    pub centering: f64,
    /// Upper bound on the length of the centering contribution.
    pub centering_limit: f64,
    pub rest_length_2d: f64,
    pub rest_length_3d: f64,
    pub stiffness: f64,
    pub damping: f64,
    /// Closer pairs are treated as this far apart along +X.
    pub min_distance: f64,
    /// Node mass is `1 + mass_per_column * columns`.
    pub mass_per_column: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            iterations: 150,
            repulsion_2d: 12.0,
            repulsion_3d: 15.0,
            centering: 0.01,
            centering_limit: 0.5,
            rest_length_2d: 3.0,
            rest_length_3d: 4.0,
            stiffness: 0.08,
            damping: 0.85,
            min_distance: 0.1,
            mass_per_column: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyParams {
    /// X distance between consecutive levels.
    pub level_spacing: f64,
    /// Y rise per level in 3D.
    pub level_rise: f64,
    /// Distance between members of one level.
    pub grid_spacing: f64,
}

impl Default for HierarchyParams {
    fn default() -> Self {
        Self {
            level_spacing: 12.0,
            level_rise: 10.0,
            grid_spacing: 6.0,
        }
    }
}

/// Radius of the circle or sphere is `max(min_radius, n * radius_per_table)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularParams {
    pub min_radius: f64,
    pub radius_per_table: f64,
}

impl Default for CircularParams {
    fn default() -> Self {
        Self {
            min_radius: 6.0,
            radius_per_table: 0.8,
        }
    }
}

impl CircularParams {
    pub fn radius(&self, n: usize) -> f64 {
        self.min_radius.max(n as f64 * self.radius_per_table)
    }
}
