//! Units: the learned reference points of a quantizer.
//!
//! A quantizer owns its units in an arena and hands out [`UnitId`] handles.
//! A handle carries the unit's variant, the owning instance's tag and the
//! unit's index in the arena, so both "wrong variant" and "not ours" can be
//! detected without comparing references.

use crate::error::{QuantError, Result};
use crate::kmeans::Centroid;
use crate::som::GridNode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// The variant of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// A node of a Self-Organizing Map.
    GridNode,
    /// A K-Means centroid.
    Centroid,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::GridNode => write!(f, "GridNode"),
            UnitKind::Centroid => write!(f, "Centroid"),
        }
    }
}

/// Handle to a unit owned by a quantizer instance.
///
/// Handles are cheap to copy and stay valid for the lifetime of the owning
/// instance. Ordering follows the owner's enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    owner: u64,
    kind: UnitKind,
    index: usize,
}

impl UnitId {
    /// Position of the unit in its owner's enumeration order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Variant of the unit.
    #[inline]
    pub fn kind(&self) -> UnitKind {
        self.kind
    }
}

/// A unit detached from any quantizer, as returned by deep copies and
/// accepted by `set_units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Unit {
    /// A SOM node.
    GridNode(GridNode),
    /// A K-Means centroid.
    Centroid(Centroid),
}

impl Unit {
    /// Variant of this unit.
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::GridNode(_) => UnitKind::GridNode,
            Unit::Centroid(_) => UnitKind::Centroid,
        }
    }

    /// The unit's coordinate vector (weights for a node).
    pub fn coordinates(&self) -> &[f64] {
        match self {
            Unit::GridNode(node) => node.weights(),
            Unit::Centroid(centroid) => centroid.coordinates(),
        }
    }

    /// Replaces the coordinate vector, keeping its length.
    pub fn set_coordinates(&mut self, coordinates: &[f64]) -> Result<()> {
        match self {
            Unit::GridNode(node) => node.set_weights(coordinates),
            Unit::Centroid(centroid) => centroid.set_coordinates(coordinates),
        }
    }
}

impl From<GridNode> for Unit {
    fn from(node: GridNode) -> Self {
        Unit::GridNode(node)
    }
}

impl From<Centroid> for Unit {
    fn from(centroid: Centroid) -> Self {
        Unit::Centroid(centroid)
    }
}

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Ownership bookkeeping for a fixed-size unit arena.
#[derive(Debug, Clone)]
pub(crate) struct Ownership {
    owner: u64,
    kind: UnitKind,
    len: usize,
    label: &'static str,
}

impl Ownership {
    /// Creates bookkeeping with a fresh, process-unique owner tag.
    pub(crate) fn new(kind: UnitKind, len: usize, label: &'static str) -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            kind,
            len,
            label,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Handle for the unit at `index`.
    #[inline]
    pub(crate) fn handle(&self, index: usize) -> UnitId {
        debug_assert!(index < self.len);
        UnitId {
            owner: self.owner,
            kind: self.kind,
            index,
        }
    }

    /// All handles in enumeration order.
    pub(crate) fn handles(&self) -> Vec<UnitId> {
        (0..self.len).map(|i| self.handle(i)).collect()
    }

    /// Checks the variant of a detached unit.
    pub(crate) fn check_kind(&self, actual: UnitKind) -> Result<()> {
        if actual != self.kind {
            return Err(QuantError::InvalidUnitType {
                expected: self.kind,
                actual,
            });
        }
        Ok(())
    }

    /// Resolves a handle to an arena index.
    ///
    /// The variant is checked before ownership.
    pub(crate) fn resolve(&self, unit: UnitId) -> Result<usize> {
        self.check_kind(unit.kind)?;
        if unit.owner != self.owner || unit.index >= self.len {
            return Err(QuantError::ForeignUnit(self.label));
        }
        Ok(unit.index)
    }

    /// Checks the shape of a `set_units` argument before anything is copied.
    pub(crate) fn check_replacement(&self, units: &[Unit], dimension: usize) -> Result<()> {
        if units.len() != self.len {
            return Err(QuantError::CardinalityMismatch {
                expected: self.len,
                actual: units.len(),
            });
        }
        for unit in units {
            self.check_kind(unit.kind())?;
        }
        for unit in units {
            let actual = unit.coordinates().len();
            if actual != dimension {
                return Err(QuantError::dimension(dimension, actual));
            }
        }
        Ok(())
    }
}
