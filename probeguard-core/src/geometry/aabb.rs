//! Axis-aligned bounding boxes anchored to a probe tip
//!
//! A probe's silhouette is described by a polygon relative to its tip. For
//! overlap testing the polygon is reduced to its enclosing axis-aligned
//! extent, so L-shaped or rotated probes are over-approximated: a test may
//! report a collision the real silhouettes would not have, never the reverse.

use heapless::Vec;

use super::point::Point2D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum vertices in a bounding polygon
pub const MAX_POLYGON_POINTS: usize = 16;

/// Minimum vertices in a bounding polygon
pub const MIN_POLYGON_POINTS: usize = 3;

/// Bounding polygon rejection reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Fewer than three vertices
    TooFewPoints { found: usize },
    /// More vertices than the polygon can hold
    TooManyPoints { found: usize },
    /// A vertex has a NaN or infinite coordinate
    NonFinite,
}

/// Probe silhouette relative to its tip
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "Vec<Point2D, MAX_POLYGON_POINTS>",
        into = "Vec<Point2D, MAX_POLYGON_POINTS>"
    )
)]
pub struct BoundingPolygon {
    points: Vec<Point2D, MAX_POLYGON_POINTS>,
}

impl BoundingPolygon {
    /// Validate and copy a vertex list
    pub fn new(points: &[Point2D]) -> Result<Self, GeometryError> {
        if points.len() < MIN_POLYGON_POINTS {
            return Err(GeometryError::TooFewPoints {
                found: points.len(),
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        let points = Vec::from_slice(points).map_err(|_| GeometryError::TooManyPoints {
            found: points.len(),
        })?;
        Ok(Self { points })
    }

    /// Axis-aligned rectangle centred on the tip
    pub fn rectangle(width: f64, height: f64) -> Result<Self, GeometryError> {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(&[
            Point2D::new(-hw, -hh),
            Point2D::new(hw, -hh),
            Point2D::new(hw, hh),
            Point2D::new(-hw, hh),
        ])
    }

    /// Vertices relative to the tip
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a validated polygon
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Extent of the polygon relative to the tip
    pub fn local_extent(&self) -> Extent {
        Extent::enclosing(&self.points)
    }
}

impl TryFrom<Vec<Point2D, MAX_POLYGON_POINTS>> for BoundingPolygon {
    type Error = GeometryError;

    fn try_from(points: Vec<Point2D, MAX_POLYGON_POINTS>) -> Result<Self, Self::Error> {
        Self::new(&points)
    }
}

impl From<BoundingPolygon> for Vec<Point2D, MAX_POLYGON_POINTS> {
    fn from(polygon: BoundingPolygon) -> Self {
        polygon.points
    }
}

#[cfg(feature = "serde")]
impl core::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooFewPoints { found } => write!(f, "polygon has {} points, need 3", found),
            Self::TooManyPoints { found } => write!(
                f,
                "polygon has {} points, at most {} supported",
                found, MAX_POLYGON_POINTS
            ),
            Self::NonFinite => write!(f, "polygon has a non-finite vertex"),
        }
    }
}

/// Axis-aligned extent (min/max on each axis)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    /// Smallest extent containing every point
    ///
    /// An empty slice yields an inverted extent that overlaps nothing.
    pub fn enclosing(points: &[Point2D]) -> Self {
        let mut extent = Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            extent.min_x = extent.min_x.min(p.x);
            extent.max_x = extent.max_x.max(p.x);
            extent.min_y = extent.min_y.min(p.y);
            extent.max_y = extent.max_y.max(p.y);
        }
        extent
    }

    /// Shift by an offset
    pub fn translate(self, by: Point2D) -> Self {
        Self {
            min_x: self.min_x + by.x,
            max_x: self.max_x + by.x,
            min_y: self.min_y + by.y,
            max_y: self.max_y + by.y,
        }
    }

    /// Width of the shared span on the x axis (negative when disjoint)
    pub fn overlap_x(&self, other: &Self) -> f64 {
        self.max_x.min(other.max_x) - self.min_x.max(other.min_x)
    }

    /// Width of the shared span on the y axis (negative when disjoint)
    pub fn overlap_y(&self, other: &Self) -> f64 {
        self.max_y.min(other.max_y) - self.min_y.max(other.min_y)
    }

    /// Strictly positive intersection on both axes
    ///
    /// Extents that only share an edge or corner do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.overlap_x(other) > 0.0 && self.overlap_y(other) > 0.0
    }
}

/// Probe bounding box anchored to a moving tip
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Aabb {
    tip: Point2D,
    relative_corners: BoundingPolygon,
    local: Extent,
}

impl Aabb {
    /// Create a box for `polygon` with its tip at `tip`
    pub fn new(tip: Point2D, polygon: BoundingPolygon) -> Self {
        let local = polygon.local_extent();
        Self {
            tip,
            relative_corners: polygon,
            local,
        }
    }

    /// Current tip position
    pub fn tip(&self) -> Point2D {
        self.tip
    }

    /// Silhouette relative to the tip
    pub fn polygon(&self) -> &BoundingPolygon {
        &self.relative_corners
    }

    /// Translate the box so its tip sits at `new_tip`
    pub fn move_to(&mut self, new_tip: Point2D) {
        self.tip = new_tip;
    }

    /// Copy of this box with the tip at `tip`
    pub fn at(&self, tip: Point2D) -> Self {
        let mut moved = self.clone();
        moved.move_to(tip);
        moved
    }

    /// Polygon vertices in the stage frame
    pub fn absolute_corners(&self) -> impl Iterator<Item = Point2D> + '_ {
        let tip = self.tip;
        self.relative_corners.points().iter().map(move |&p| p + tip)
    }

    /// Enclosing extent in the stage frame
    pub fn extent(&self) -> Extent {
        self.local.translate(self.tip)
    }

    /// Extent this box would have with its tip at `tip`
    pub fn extent_at(&self, tip: Point2D) -> Extent {
        self.local.translate(tip)
    }

    /// Check for a positive-area intersection with another box
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.extent().intersects(&other.extent())
    }
}
