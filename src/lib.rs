//! A tile-based simulation core.
//!
//! Entities live on a fixed-size [`grid::Grid`]. Each cell may hold several
//! entities as long as their [`entity::Coexistence`] rules agree. Entities
//! carry optional capabilities ([`capability`]) such as health, damage or
//! healing that act on co-located occupants every tick, and a path-following
//! component ([`pathing`]) that walks fixed, looping or continuously
//! re-planned routes produced by `gridsim_navigation`.
//!
//! ```
//! use gridsim::grid::Grid;
//! use gridsim::prefabs;
//! use gridsim_navigation::{DiscretePoint, Pose};
//!
//! let mut grid = Grid::new(8, 8).unwrap();
//! grid.add(prefabs::wall(Pose::new(3.0, 0.0, 0.0))).unwrap();
//! let drone = grid.add(prefabs::drone(Pose::new(0.0, 0.0, 0.0))).unwrap();
//!
//! grid.path_find(drone, &Pose::new(5.0, 0.0, 0.0)).unwrap();
//! for _ in 0..10 {
//!     grid.update(0.1);
//! }
//! let cell = grid.entity(drone).unwrap().pose().as_discrete_point();
//! assert_eq!(cell, DiscretePoint::new(5, 0));
//! ```

pub mod callbacks;
pub mod capability;
pub mod config;
pub mod entity;
pub mod error;
pub mod grid;
pub mod layout;
pub mod pathing;
pub mod prefabs;

pub use entity::{Entity, EntityId, EntityKind};
pub use error::GridError;
pub use grid::Grid;

pub use gridsim_pose::{DiscretePoint, Pose};
