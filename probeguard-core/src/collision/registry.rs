//! Bounding box registry
//!
//! Holds zero or one box per manipulator. Positions stored here are the
//! last tip positions the caller reported; the registry never queries
//! hardware. Mutation needs `&mut`, so it is serialized by ownership.

use crate::geometry::{Aabb, BoundingPolygon, GeometryError, Point2D};
use crate::motion::{ManipulatorIndex, MAX_MANIPULATORS};

/// Registry lookup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// No bounding box registered for this manipulator
    Unregistered(ManipulatorIndex),
}

/// Owned per-manipulator bounding boxes, indexed by dense slot
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxRegistry {
    slots: [Option<Aabb>; MAX_MANIPULATORS],
}

impl BoundingBoxRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the silhouette of a manipulator
    ///
    /// Polygons with fewer than three points are rejected. A replaced entry
    /// keeps its tip position; a new entry starts at the origin.
    pub fn set_bounding_box(
        &mut self,
        index: ManipulatorIndex,
        points: &[Point2D],
    ) -> Result<(), GeometryError> {
        let polygon = match BoundingPolygon::new(points) {
            Ok(polygon) => polygon,
            Err(e) => {
                warn!("rejected polygon for manipulator {}: {}", index, e);
                return Err(e);
            }
        };
        let tip = self.tip_position(index).unwrap_or(Point2D::ORIGIN);
        self.set_bounding_box_at(index, polygon, tip);
        Ok(())
    }

    /// Register or replace a manipulator with an explicit tip position
    ///
    /// Returns the previous box, if any.
    pub fn set_bounding_box_at(
        &mut self,
        index: ManipulatorIndex,
        polygon: BoundingPolygon,
        tip: Point2D,
    ) -> Option<Aabb> {
        debug!("register manipulator {} at ({}, {})", index, tip.x, tip.y);
        self.slots[index.slot()].replace(Aabb::new(tip, polygon))
    }

    /// Remove a manipulator's box
    ///
    /// Returns `false` if nothing was registered.
    pub fn clear_bounding_box(&mut self, index: ManipulatorIndex) -> bool {
        self.slots[index.slot()].take().is_some()
    }

    /// Record a confirmed tip position
    #[must_use = "an unregistered manipulator is reported through the result"]
    pub fn update_tip_position(
        &mut self,
        index: ManipulatorIndex,
        tip: Point2D,
    ) -> Result<(), RegistryError> {
        match self.slots[index.slot()].as_mut() {
            Some(aabb) => {
                aabb.move_to(tip);
                Ok(())
            }
            None => Err(RegistryError::Unregistered(index)),
        }
    }

    /// Get a manipulator's box
    pub fn get_bounding_box(&self, index: ManipulatorIndex) -> Option<&Aabb> {
        self.slots[index.slot()].as_ref()
    }

    /// Get a manipulator's last reported tip position
    pub fn tip_position(&self, index: ManipulatorIndex) -> Option<Point2D> {
        self.get_bounding_box(index).map(Aabb::tip)
    }

    /// Check if a manipulator has a box
    pub fn is_registered(&self, index: ManipulatorIndex) -> bool {
        self.slots[index.slot()].is_some()
    }

    /// Registered manipulators in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (ManipulatorIndex, &Aabb)> {
        self.slots.iter().enumerate().filter_map(|(slot, aabb)| {
            Some((ManipulatorIndex::from_slot(slot)?, aabb.as_ref()?))
        })
    }

    /// Number of registered manipulators
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
