//! Error types for the simulation core.
//!
//! A rejected move is not an error: `move_to_position` reports it with
//! `false`. The variants below cover structural misuse (bad dimensions, out of
//! range indexing, impossible initial placement) and planning failures.

use gridsim_navigation::{DiscretePoint, NavigationError, PathFindingError};

use crate::entity::{EntityId, EntityKind};

/// Errors raised by [`crate::grid::Grid`] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Width or height was zero.
    #[error("invalid grid dimensions {width}x{height}: both must be non-zero")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
    /// A point outside the grid was indexed directly.
    #[error("{point} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// The offending point.
        point: DiscretePoint,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
    /// The initial placement of an entity was rejected by the move protocol.
    #[error("could not place {kind:?} at {point}")]
    AddFailed {
        /// What was being added.
        kind: EntityKind,
        /// Where it was supposed to go.
        point: DiscretePoint,
    },
    /// The id does not name an entity on this grid.
    #[error("entity {0} is not on this grid")]
    UnknownEntity(EntityId),
    /// Planning a route failed.
    #[error(transparent)]
    PathFinding(#[from] PathFindingError),
    /// Building a passability map failed.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    /// The element list and the cell lists disagree.
    #[error("grid invariant violated: {0}")]
    InvariantViolation(String),
}
