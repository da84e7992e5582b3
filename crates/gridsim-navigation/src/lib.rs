//! Grid navigation primitives for the simulation core.
//!
//! * [`map::PassabilityMap`] is a boolean "can this entity stand here" snapshot.
//! * [`astar`] plans a 4-connected route over such a map.
//! * [`path::Path`] is the waypoint queue a path-following entity consumes.

#![warn(missing_docs)]

pub mod astar;
pub mod error;
pub mod map;
pub mod path;

pub use astar::{find_path, find_path_detailed, heuristic, PathSearch};
pub use error::{FailureReason, NavigationError, PathFindingError};
pub use map::PassabilityMap;
pub use path::{Path, PathMode};

pub use gridsim_pose::{DiscretePoint, Pose};
