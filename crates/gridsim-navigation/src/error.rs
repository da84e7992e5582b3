//! This module defines the error types used by the `gridsim-navigation` crate.

#![warn(missing_docs)]

use core::fmt;

use gridsim_pose::DiscretePoint;

use crate::map::PassabilityMap;

/// Error type for map operations.
///
/// This enum encapsulates the ways building or indexing a
/// [`PassabilityMap`] can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// Error for invalid map dimensions.
    /// This variant is returned when map width or height is zero, or rows are ragged.
    #[error("Invalid map dimensions: {0}")]
    InvalidDimensions(&'static str),
    /// Error for out-of-bounds access.
    /// This variant is returned when attempting to access cells outside the map.
    #[error("Map access out of bounds: {point} is outside {width}x{height}")]
    OutOfBounds {
        /// The offending point.
        point: DiscretePoint,
        /// Map width in cells.
        width: usize,
        /// Map height in cells.
        height: usize,
    },
}

/// Why a path search gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureReason {
    /// Start or target lies outside the map.
    OutOfBounds,
    /// The target cell itself is blocked; no node was expanded.
    TargetImpassable,
    /// The frontier ran dry before the target was reached.
    Unreachable,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::OutOfBounds => write!(f, "endpoint out of bounds"),
            FailureReason::TargetImpassable => write!(f, "target impassable"),
            FailureReason::Unreachable => write!(f, "target unreachable"),
        }
    }
}

/// A failed path search, with the inputs needed to diagnose it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("no path from {start} to {target}: {reason} ({nodes_explored} nodes explored)")]
pub struct PathFindingError {
    /// Where the search started.
    pub start: DiscretePoint,
    /// Where the search was headed.
    pub target: DiscretePoint,
    /// Why it failed.
    pub reason: FailureReason,
    /// Nodes popped from the frontier before giving up.
    pub nodes_explored: usize,
    /// The passability map the search ran on.
    pub passability: PassabilityMap,
}
