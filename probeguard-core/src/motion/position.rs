//! Manipulator indices and move requests
//!
//! These types define the interface between the caller (which knows where
//! each probe is and where it should go) and the planner.

use crate::collision::{BoundingBoxRegistry, RegistryError};
use crate::geometry::Point2D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum manipulators on one bus
pub const MAX_MANIPULATORS: usize = 4;

/// Manipulator number as addressed on the bus (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct ManipulatorIndex(u8);

impl ManipulatorIndex {
    /// Create an index, or `None` if outside `1..=MAX_MANIPULATORS`
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= 1 && raw as usize <= MAX_MANIPULATORS {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Bus number
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Dense 0-based slot for array storage
    pub const fn slot(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Index for a dense slot, or `None` if out of range
    pub const fn from_slot(slot: usize) -> Option<Self> {
        if slot < MAX_MANIPULATORS {
            Some(Self(slot as u8 + 1))
        } else {
            None
        }
    }

    /// Every valid index in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..MAX_MANIPULATORS).filter_map(Self::from_slot)
    }
}

impl TryFrom<u8> for ManipulatorIndex {
    type Error = InvalidIndex;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(InvalidIndex(raw))
    }
}

impl From<ManipulatorIndex> for u8 {
    fn from(index: ManipulatorIndex) -> Self {
        index.0
    }
}

/// Manipulator number outside the supported range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidIndex(pub u8);

#[cfg(feature = "serde")]
impl core::fmt::Display for InvalidIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "manipulator index {} outside 1..={}",
            self.0, MAX_MANIPULATORS
        )
    }
}

/// Requested move for one manipulator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveRequest {
    /// Tip position before the move
    pub current: Point2D,
    /// Tip position after the move
    pub target: Point2D,
}

impl MoveRequest {
    /// Create a move request
    pub const fn new(current: Point2D, target: Point2D) -> Self {
        Self { current, target }
    }

    /// Check if the move has no displacement
    pub fn is_stationary(&self, epsilon: f64) -> bool {
        self.current.approx_eq(self.target, epsilon)
    }
}

/// Moves for one planning call, at most one per manipulator
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveSet {
    slots: [Option<MoveRequest>; MAX_MANIPULATORS],
}

impl MoveSet {
    /// Create an empty move set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a move set whose current positions come from the registry
    ///
    /// The registry holds the last confirmed tip of every manipulator, so
    /// this is the usual way to start a planning call.
    pub fn from_registry(
        registry: &BoundingBoxRegistry,
        targets: &[(ManipulatorIndex, Point2D)],
    ) -> Result<Self, RegistryError> {
        let mut moves = Self::new();
        for &(index, target) in targets {
            let current = registry
                .tip_position(index)
                .ok_or(RegistryError::Unregistered(index))?;
            moves.insert(index, current, target);
        }
        Ok(moves)
    }

    /// Add or replace the move for a manipulator
    ///
    /// Returns the previous request, if any.
    pub fn insert(
        &mut self,
        index: ManipulatorIndex,
        current: Point2D,
        target: Point2D,
    ) -> Option<MoveRequest> {
        self.slots[index.slot()].replace(MoveRequest::new(current, target))
    }

    /// Remove the move for a manipulator
    pub fn remove(&mut self, index: ManipulatorIndex) -> Option<MoveRequest> {
        self.slots[index.slot()].take()
    }

    /// Get the move for a manipulator
    pub fn get(&self, index: ManipulatorIndex) -> Option<&MoveRequest> {
        self.slots[index.slot()].as_ref()
    }

    /// Check if a manipulator has a move
    pub fn contains(&self, index: ManipulatorIndex) -> bool {
        self.slots[index.slot()].is_some()
    }

    /// Number of manipulators in the set
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Moves in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (ManipulatorIndex, &MoveRequest)> {
        self.slots.iter().enumerate().filter_map(|(slot, request)| {
            let request = request.as_ref()?;
            Some((ManipulatorIndex::from_slot(slot)?, request))
        })
    }

    /// Manipulators in ascending index order
    pub fn indices(&self) -> impl Iterator<Item = ManipulatorIndex> + '_ {
        self.iter().map(|(index, _)| index)
    }

    /// Target of every move
    pub fn targets(&self) -> TargetMap {
        let mut targets = TargetMap::new();
        for (index, request) in self.iter() {
            targets.insert(index, request.target);
        }
        targets
    }
}

/// Final tip position per manipulator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetMap {
    slots: [Option<Point2D>; MAX_MANIPULATORS],
}

impl TargetMap {
    /// Create an empty target map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target for a manipulator
    pub fn insert(&mut self, index: ManipulatorIndex, target: Point2D) -> Option<Point2D> {
        self.slots[index.slot()].replace(target)
    }

    /// Get the target for a manipulator
    pub fn get(&self, index: ManipulatorIndex) -> Option<Point2D> {
        self.slots[index.slot()]
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Check if no targets are set
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }
}

/// One move of a plan: bring a manipulator's tip to `target`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveStep {
    pub index: ManipulatorIndex,
    pub target: Point2D,
}

impl MoveStep {
    /// Create a move step
    pub const fn new(index: ManipulatorIndex, target: Point2D) -> Self {
        Self { index, target }
    }
}
