//! Map-related functionality for navigation.
//!
//! This module provides the boolean passability grid that path planning
//! runs on.

pub mod passability;

pub use passability::PassabilityMap;
