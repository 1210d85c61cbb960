//! Probe geometry
//!
//! Points in the shared stage/camera frame and the axis-aligned boxes that
//! over-approximate each probe's silhouette.

pub mod aabb;
pub mod point;

pub use aabb::{Aabb, BoundingPolygon, Extent, GeometryError, MAX_POLYGON_POINTS};
pub use point::Point2D;
