//! Path-following state machine and the grid operations that drive it.
//!
//! ```text
//!            set_path(wrap=false)            path consumed
//!   Idle ───────────────────────▶ FollowingFixedPath ───────────▶ Idle
//!     │      set_path(wrap=true)
//!     ├─────────────────────────▶ FollowingWrappedPath  (loops until set_path)
//!     │      actively_path_find(target)
//!     └─────────────────────────▶ ActivelyTracking ── target gone ──▶ FollowingFixedPath
//! ```
//!
//! A follower advances at most one waypoint per tick. A blocked step is
//! retried on the next tick. While tracking, the route is re-planned on every
//! tick before stepping, so a moving target is chased along a fresh route.

use gridsim_navigation::{find_path, DiscretePoint, Path, PathMode, Pose};
use tracing::{debug, info, trace};

use crate::entity::EntityId;
use crate::error::GridError;
use crate::grid::Grid;

/// Where a [`PathFollower`] is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowState {
    #[default]
    Idle,
    FollowingFixedPath,
    FollowingWrappedPath,
    /// Chasing another entity, re-planning every tick.
    ActivelyTracking(EntityId),
}

/// The path-following capability of an entity.
#[derive(Debug, Clone, Default)]
pub struct PathFollower {
    path: Path,
    state: FollowState,
}

impl PathFollower {
    pub fn new() -> Self {
        PathFollower::default()
    }

    /// A follower that starts on `waypoints`, see [`PathFollower::set_path`].
    pub fn with_path(waypoints: impl IntoIterator<Item = Pose>, wrap: bool) -> Self {
        let mut follower = PathFollower::new();
        follower.set_path(waypoints, wrap);
        follower
    }

    pub fn state(&self) -> FollowState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_idle(&self) -> bool {
        self.state == FollowState::Idle
    }

    /// Replaces the current path and cancels any tracking. The first waypoint
    /// is the follower's current position.
    pub fn set_path(&mut self, waypoints: impl IntoIterator<Item = Pose>, wrap: bool) {
        let mode = if wrap { PathMode::Wrap } else { PathMode::Once };
        self.path = Path::new(waypoints, mode);
        self.state = match (self.path.is_finished(), wrap) {
            (true, _) => FollowState::Idle,
            (false, true) => FollowState::FollowingWrappedPath,
            (false, false) => FollowState::FollowingFixedPath,
        };
    }

    fn track(&mut self, target: EntityId, route: &[DiscretePoint]) {
        self.path = Path::from_points(route, PathMode::Once);
        self.state = FollowState::ActivelyTracking(target);
    }

    /// Ends tracking; whatever is left of the last route is followed as a fixed path.
    pub fn stop_tracking(&mut self) {
        if let FollowState::ActivelyTracking(_) = self.state {
            self.state = if self.path.is_finished() {
                FollowState::Idle
            } else {
                FollowState::FollowingFixedPath
            };
        }
    }

    /// Moves entity `id` towards the next waypoint. Returns `true` while
    /// waypoints remain afterwards.
    pub(crate) fn follow(&mut self, grid: &mut Grid, id: EntityId) -> bool {
        let Some(next) = self.path.next_waypoint().copied() else {
            self.finish();
            return false;
        };

        if grid.move_to_position(id, next) {
            self.path.advance();
        } else {
            trace!(%id, waypoint = %next.as_discrete_point(), "Path step blocked");
        }

        if self.path.is_finished() {
            self.finish();
            return false;
        }
        true
    }

    fn finish(&mut self) {
        if matches!(
            self.state,
            FollowState::FollowingFixedPath | FollowState::FollowingWrappedPath
        ) {
            self.state = FollowState::Idle;
        }
    }

    /// One simulation tick: re-plan if tracking, then take one step.
    pub(crate) fn tick(&mut self, grid: &mut Grid, id: EntityId) {
        if let FollowState::ActivelyTracking(target) = self.state {
            match grid.entity(target) {
                None => {
                    info!(%id, %target, "Tracked entity left the grid");
                    self.stop_tracking();
                }
                Some(entity) => {
                    let goal = entity.pose().as_discrete_point();
                    match grid.plan_route(id, goal) {
                        Ok(route) => self.path = Path::from_points(&route, PathMode::Once),
                        Err(e) => debug!(%id, %target, error = %e, "Re-plan failed, keeping previous route"),
                    }
                }
            }
        }

        if !self.is_idle() {
            self.follow(grid, id);
        }
    }
}

impl Grid {
    /// Route for entity `id` to `goal`, planned on its own collision matrix.
    pub(crate) fn plan_route(
        &self,
        id: EntityId,
        goal: DiscretePoint,
    ) -> Result<Vec<DiscretePoint>, GridError> {
        let entity = self.entity(id).ok_or(GridError::UnknownEntity(id))?;
        let passability = self.get_collision_matrix(id)?;
        let start = entity.pose().as_discrete_point();
        Ok(find_path(start, goal, &passability)?)
    }

    fn follower_mut(&mut self, id: EntityId) -> Result<&mut PathFollower, GridError> {
        let entity = self.entity_mut(id).ok_or(GridError::UnknownEntity(id))?;
        Ok(entity.path_follower.get_or_insert_with(PathFollower::new))
    }

    /// Gives entity `id` a path to follow, replacing any previous one.
    ///
    /// The first waypoint is where the entity currently stands. A wrapping
    /// path loops forever; a fixed one ends at its last waypoint.
    pub fn set_path(
        &mut self,
        id: EntityId,
        waypoints: impl IntoIterator<Item = Pose>,
        wrap: bool,
    ) -> Result<(), GridError> {
        self.follower_mut(id)?.set_path(waypoints, wrap);
        Ok(())
    }

    /// Plans a route from entity `id` to `target` and sets it as a fixed path.
    ///
    /// On failure the follower is left untouched and the planning error is
    /// returned as [`GridError::PathFinding`].
    pub fn path_find(&mut self, id: EntityId, target: &Pose) -> Result<(), GridError> {
        let route = self.plan_route(id, target.as_discrete_point())?;
        debug!(%id, target = %target.as_discrete_point(), steps = route.len() - 1, "Path planned");
        self.set_path(id, route.into_iter().map(Pose::from_discrete_point), false)
    }

    /// Starts chasing entity `target`. The route is re-planned every tick
    /// until the target leaves the grid or a new path is set.
    pub fn actively_path_find(&mut self, id: EntityId, target: EntityId) -> Result<(), GridError> {
        let goal = self
            .entity(target)
            .ok_or(GridError::UnknownEntity(target))?
            .pose()
            .as_discrete_point();
        let route = self.plan_route(id, goal)?;
        self.follower_mut(id)?.track(target, &route);
        debug!(%id, %target, "Tracking started");
        Ok(())
    }

    /// Takes one step along the current path of entity `id`.
    ///
    /// Returns `true` while waypoints remain after the step. `false` means the
    /// path is finished, or was empty, or `id` has no path to follow.
    pub fn follow_path(&mut self, id: EntityId) -> bool {
        let Some(mut follower) = self
            .entity_mut(id)
            .and_then(|entity| entity.path_follower.take())
        else {
            return false;
        };
        let remaining = follower.follow(self, id);
        self.restore_follower(id, follower);
        remaining
    }

    /// Ends tracking for entity `id`. Returns `false` if it was not tracking.
    pub fn stop_tracking(&mut self, id: EntityId) -> bool {
        let Some(follower) = self
            .entity_mut(id)
            .and_then(|entity| entity.path_follower.as_mut())
        else {
            return false;
        };
        let was_tracking = matches!(follower.state(), FollowState::ActivelyTracking(_));
        follower.stop_tracking();
        was_tracking
    }

    /// Follow state of entity `id`, `Idle` if it never had a path.
    pub fn follow_state(&self, id: EntityId) -> Option<FollowState> {
        let entity = self.entity(id)?;
        Some(entity.path_follower().map_or(FollowState::Idle, PathFollower::state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityKind};
    use gridsim_navigation::FailureReason;

    fn at(x: i32, y: i32) -> Pose {
        Pose::from_discrete_point(DiscretePoint::new(x, y))
    }

    fn cell_of(grid: &Grid, id: EntityId) -> DiscretePoint {
        grid.entity(id).unwrap().pose().as_discrete_point()
    }

    fn walker(x: i32, y: i32) -> Entity {
        Entity::new(EntityKind::Drone, at(x, y))
            .with_tile_size(1)
            .with_path_follower()
            .updating_every_frame()
    }

    #[test]
    fn test_fixed_path_finishes_after_last_waypoint() {
        let mut grid = Grid::new(5, 5).unwrap();
        let id = grid.add(walker(0, 0)).unwrap();
        grid.set_path(id, [at(0, 0), at(1, 0), at(2, 0), at(3, 0)], false)
            .unwrap();
        assert_eq!(grid.follow_state(id), Some(FollowState::FollowingFixedPath));

        assert!(grid.follow_path(id));
        assert!(grid.follow_path(id));
        assert!(!grid.follow_path(id));
        assert_eq!(cell_of(&grid, id), DiscretePoint::new(3, 0));
        assert_eq!(grid.follow_state(id), Some(FollowState::Idle));
        assert!(!grid.follow_path(id));
    }

    #[test]
    fn test_single_waypoint_path_is_idle() {
        let mut grid = Grid::new(3, 3).unwrap();
        let id = grid.add(walker(1, 1)).unwrap();
        grid.set_path(id, [at(1, 1)], false).unwrap();
        assert_eq!(grid.follow_state(id), Some(FollowState::Idle));
        assert!(!grid.follow_path(id));
    }

    #[test]
    fn test_wrapped_path_returns_to_start() {
        let mut grid = Grid::new(4, 4).unwrap();
        let id = grid.add(walker(0, 0)).unwrap();
        let loop_cells = [at(0, 0), at(1, 0), at(1, 1), at(0, 1)];
        grid.set_path(id, loop_cells, true).unwrap();
        assert_eq!(
            grid.follow_state(id),
            Some(FollowState::FollowingWrappedPath)
        );

        for tick in 1..=2 * loop_cells.len() {
            grid.update(0.1);
            if tick % loop_cells.len() == 0 {
                assert_eq!(cell_of(&grid, id), DiscretePoint::new(0, 0), "tick {}", tick);
            }
        }
        assert_eq!(
            grid.follow_state(id),
            Some(FollowState::FollowingWrappedPath)
        );
    }

    #[test]
    fn test_blocked_step_is_retried() {
        let mut grid = Grid::new(4, 1).unwrap();
        let id = grid.add(walker(0, 0)).unwrap();
        let wall = grid
            .add(Entity::new(EntityKind::Wall, at(1, 0)))
            .unwrap();
        grid.set_path(id, [at(0, 0), at(1, 0), at(2, 0)], false).unwrap();

        assert!(grid.follow_path(id));
        assert_eq!(cell_of(&grid, id), DiscretePoint::new(0, 0));
        grid.remove(wall);
        assert!(grid.follow_path(id));
        assert_eq!(cell_of(&grid, id), DiscretePoint::new(1, 0));
        assert!(!grid.follow_path(id));
        assert_eq!(cell_of(&grid, id), DiscretePoint::new(2, 0));
    }

    #[test]
    fn test_path_find_routes_around_walls() {
        let mut grid = Grid::new(5, 5).unwrap();
        for y in 0..4 {
            grid.add(Entity::new(EntityKind::Wall, at(2, y))).unwrap();
        }
        let id = grid.add(walker(0, 0)).unwrap();
        grid.path_find(id, &at(4, 0)).unwrap();

        let mut steps = 0;
        while grid.follow_path(id) {
            steps += 1;
            assert!(steps < 25, "path never finished");
        }
        assert_eq!(cell_of(&grid, id), DiscretePoint::new(4, 0));
        grid.check_invariants().unwrap();
    }

    #[test]
    fn test_path_find_failure_keeps_state() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.add(Entity::new(EntityKind::Wall, at(4, 4))).unwrap();
        let id = grid.add(walker(0, 0)).unwrap();
        grid.set_path(id, [at(0, 0), at(0, 1), at(0, 2)], false).unwrap();

        let err = grid.path_find(id, &at(4, 4)).unwrap_err();
        match err {
            GridError::PathFinding(e) => {
                assert_eq!(e.reason, FailureReason::TargetImpassable);
                assert_eq!(e.start, DiscretePoint::new(0, 0));
                assert!(!e.passability.is_passable(&DiscretePoint::new(4, 4)));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(grid.follow_state(id), Some(FollowState::FollowingFixedPath));
        assert_eq!(grid.entity(id).unwrap().path_follower().unwrap().path().len(), 2);
    }

    #[test]
    fn test_unknown_entity() {
        let mut grid = Grid::new(3, 3).unwrap();
        let id = grid.add(walker(0, 0)).unwrap();
        grid.remove(id);
        assert!(matches!(
            grid.set_path(id, [at(0, 0)], false),
            Err(GridError::UnknownEntity(_))
        ));
        assert!(!grid.follow_path(id));
        assert_eq!(grid.follow_state(id), None);
    }

    #[test]
    fn test_tracking_chases_moving_target() {
        let mut grid = Grid::new(8, 8).unwrap();
        let prey = grid
            .add(Entity::new(EntityKind::Player, at(7, 7)).with_tile_size(2))
            .unwrap();
        let hunter = grid.add(walker(0, 0)).unwrap();
        grid.actively_path_find(hunter, prey).unwrap();
        assert_eq!(
            grid.follow_state(hunter),
            Some(FollowState::ActivelyTracking(prey))
        );

        for _ in 0..3 {
            grid.update(0.1);
        }
        assert!(grid.move_to_position(prey, at(7, 0)));

        // the route is re-planned towards the new cell on the next tick
        for _ in 0..20 {
            grid.update(0.1);
        }
        assert_eq!(cell_of(&grid, hunter), DiscretePoint::new(7, 0));
        assert_eq!(
            grid.follow_state(hunter),
            Some(FollowState::ActivelyTracking(prey))
        );
    }

    #[test]
    fn test_tracking_ends_when_target_leaves() {
        let mut grid = Grid::new(6, 1).unwrap();
        let prey = grid
            .add(Entity::new(EntityKind::Player, at(5, 0)).with_tile_size(2))
            .unwrap();
        let hunter = grid.add(walker(0, 0)).unwrap();
        grid.actively_path_find(hunter, prey).unwrap();
        grid.update(0.1);
        assert_eq!(cell_of(&grid, hunter), DiscretePoint::new(1, 0));

        grid.remove(prey);
        grid.update(0.1);
        // the rest of the last route is still walked, as a fixed path
        assert_eq!(
            grid.follow_state(hunter),
            Some(FollowState::FollowingFixedPath)
        );
        assert_eq!(cell_of(&grid, hunter), DiscretePoint::new(2, 0));
        for _ in 0..5 {
            grid.update(0.1);
        }
        assert_eq!(cell_of(&grid, hunter), DiscretePoint::new(5, 0));
        assert_eq!(grid.follow_state(hunter), Some(FollowState::Idle));
    }

    #[test]
    fn test_failed_replan_keeps_previous_route() {
        let mut grid = Grid::new(6, 1).unwrap();
        let prey = grid
            .add(Entity::new(EntityKind::Player, at(5, 0)).with_tile_size(2))
            .unwrap();
        let hunter = grid.add(walker(0, 0)).unwrap();
        grid.actively_path_find(hunter, prey).unwrap();

        // a full-size blocker lands on the target's cell: the target is now
        // impassable for the hunter
        grid.add(Entity::new(EntityKind::Wall, at(5, 0)).with_tile_size(3))
            .unwrap();
        grid.update(0.1);
        assert_eq!(cell_of(&grid, hunter), DiscretePoint::new(1, 0));
        assert_eq!(
            grid.follow_state(hunter),
            Some(FollowState::ActivelyTracking(prey))
        );
    }

    #[test]
    fn test_set_path_cancels_tracking() {
        let mut grid = Grid::new(4, 4).unwrap();
        let prey = grid
            .add(Entity::new(EntityKind::Player, at(3, 3)).with_tile_size(2))
            .unwrap();
        let hunter = grid.add(walker(0, 0)).unwrap();
        grid.actively_path_find(hunter, prey).unwrap();
        grid.set_path(hunter, [at(0, 0), at(0, 1)], false).unwrap();
        assert_eq!(
            grid.follow_state(hunter),
            Some(FollowState::FollowingFixedPath)
        );
        assert!(!grid.stop_tracking(hunter));
    }

    #[test]
    fn test_stop_tracking() {
        let mut grid = Grid::new(4, 4).unwrap();
        let prey = grid
            .add(Entity::new(EntityKind::Player, at(3, 3)).with_tile_size(2))
            .unwrap();
        let hunter = grid.add(walker(0, 0)).unwrap();
        grid.actively_path_find(hunter, prey).unwrap();
        assert!(grid.stop_tracking(hunter));
        assert_eq!(
            grid.follow_state(hunter),
            Some(FollowState::FollowingFixedPath)
        );
    }

    #[test]
    fn test_tracking_reached_target_is_not_a_failure() {
        let mut grid = Grid::new(3, 3).unwrap();
        let prey = grid
            .add(Entity::new(EntityKind::Player, at(1, 1)).with_tile_size(2))
            .unwrap();
        let hunter = grid.add(walker(1, 0)).unwrap();
        grid.actively_path_find(hunter, prey).unwrap();
        for _ in 0..3 {
            grid.update(0.1);
        }
        assert_eq!(cell_of(&grid, hunter), DiscretePoint::new(1, 1));
        assert!(!grid.follow_path(hunter));
        assert_eq!(
            grid.follow_state(hunter),
            Some(FollowState::ActivelyTracking(prey))
        );
    }
}
