//! Waypoint queues consumed one cell per tick by path-following entities.

use std::collections::VecDeque;

use gridsim_pose::{DiscretePoint, Pose};

/// How a [`Path`] is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathMode {
    /// Each waypoint is dropped once reached; the path ends.
    #[default]
    Once,
    /// Reached waypoints rotate to the back; the path repeats forever.
    Wrap,
}

/// An ordered queue of poses to visit.
///
/// The first waypoint is taken to be where the follower already stands. In
/// [`PathMode::Once`] it is dropped on construction; in [`PathMode::Wrap`] it
/// stays, because the loop must come back to it.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    waypoints: VecDeque<Pose>,
    mode: PathMode,
}

impl Path {
    /// Builds a path from waypoints listed in travel order, starting with the current position.
    pub fn new(waypoints: impl IntoIterator<Item = Pose>, mode: PathMode) -> Self {
        let mut waypoints: VecDeque<Pose> = waypoints.into_iter().collect();
        if mode == PathMode::Once {
            waypoints.pop_front();
        }
        Path { waypoints, mode }
    }

    /// Builds a one-shot path.
    pub fn once(waypoints: impl IntoIterator<Item = Pose>) -> Self {
        Path::new(waypoints, PathMode::Once)
    }

    /// Builds a looping path.
    pub fn wrapping(waypoints: impl IntoIterator<Item = Pose>) -> Self {
        Path::new(waypoints, PathMode::Wrap)
    }

    /// Builds a path from planner output.
    pub fn from_points(points: &[DiscretePoint], mode: PathMode) -> Self {
        Path::new(points.iter().copied().map(Pose::from_discrete_point), mode)
    }

    /// Returns the consumption mode.
    pub fn mode(&self) -> PathMode {
        self.mode
    }

    /// Number of waypoints still queued.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Returns `true` if no waypoint is left.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// A one-shot path is finished once every waypoint was consumed. A
    /// wrapping path only finishes if it was empty to begin with.
    pub fn is_finished(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Iterates the queued waypoints front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Pose> {
        self.waypoints.iter()
    }

    /// The waypoint to move to next.
    ///
    /// For a wrapping path the front is the cell just arrived at, so the next
    /// target is the second entry; a single-entry loop keeps targeting its
    /// only cell.
    pub fn next_waypoint(&self) -> Option<&Pose> {
        match self.mode {
            PathMode::Once => self.waypoints.front(),
            PathMode::Wrap if self.waypoints.len() == 1 => self.waypoints.front(),
            PathMode::Wrap => self.waypoints.get(1),
        }
    }

    /// Consumes the waypoint returned by [`Path::next_waypoint`].
    pub fn advance(&mut self) {
        match self.mode {
            PathMode::Once => {
                self.waypoints.pop_front();
            }
            PathMode::Wrap => {
                if !self.waypoints.is_empty() {
                    self.waypoints.rotate_left(1);
                }
            }
        }
    }
}
