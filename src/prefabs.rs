//! Ready-made entities for common scenario pieces.

use gridsim_navigation::Pose;

use crate::capability::Health;
use crate::entity::{Coexistence, Entity, EntityKind};

pub const PLAYER_HEALTH: f64 = 100.0;
pub const PLAYER_TILE_SIZE: u32 = 2;
pub const DRONE_DAMAGE: f64 = 5.0;
pub const DRONE_TILE_SIZE: u32 = 1;
pub const SPIKE_FOOTPRINT: (f64, f64) = (0.75, 0.35);

/// A full-cell static obstacle.
pub fn wall(pose: Pose) -> Entity {
    Entity::new(EntityKind::Wall, pose)
}

/// Takes damage, updated every tick.
pub fn player(pose: Pose) -> Entity {
    Entity::new(EntityKind::Player, pose)
        .with_tile_size(PLAYER_TILE_SIZE)
        .with_health(Health::new(PLAYER_HEALTH))
        .updating_every_frame()
}

/// Harmful and path following, updated every tick. Idle until given a path.
pub fn drone(pose: Pose) -> Entity {
    Entity::new(EntityKind::Drone, pose)
        .with_tile_size(DRONE_TILE_SIZE)
        .with_damage(DRONE_DAMAGE)
        .with_path_follower()
        .updating_every_frame()
}

/// A drone that starts on a patrol route. `waypoints` begins at `pose`.
pub fn patrol_drone(pose: Pose, waypoints: impl IntoIterator<Item = Pose>, wrap: bool) -> Entity {
    drone(pose).with_path(waypoints, wrap)
}

/// A floor hazard: takes no room and can be laid anywhere.
pub fn spike(pose: Pose, damage: f64) -> Entity {
    let mut spike = Entity::new(EntityKind::Spike, pose)
        .with_tile_size(0)
        .with_coexistence(Coexistence::Always)
        .with_damage(damage);
    spike.set_footprint(SPIKE_FOOTPRINT.0, SPIKE_FOOTPRINT.1);
    spike
}

/// A floor tile that heals whatever stands on it.
pub fn healing_pad(pose: Pose, healing: f64) -> Entity {
    Entity::new(EntityKind::HealingPad, pose)
        .with_tile_size(0)
        .with_coexistence(Coexistence::Always)
        .with_healing(healing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::pathing::FollowState;
    use gridsim_navigation::DiscretePoint;

    fn at(x: i32, y: i32) -> Pose {
        Pose::from_discrete_point(DiscretePoint::new(x, y))
    }

    #[test]
    fn test_player_and_drones_share_a_cell() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.add(player(at(1, 1))).unwrap();
        grid.add(drone(at(1, 1))).unwrap();
        grid.add(drone(at(1, 1))).unwrap();
        grid.add(drone(at(1, 1))).unwrap();
        // 2 + 1 + 1 + 1 fills the cell
        assert!(grid.add(drone(at(1, 1))).is_err());
        assert!(grid.add(player(at(1, 1))).is_err());
    }

    #[test]
    fn test_nothing_sized_enters_a_wall() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.add(wall(at(0, 0))).unwrap();
        assert!(grid.add(player(at(0, 0))).is_err());
        assert!(grid.add(drone(at(0, 0))).is_err());
        assert!(grid.add(wall(at(0, 0))).is_err());
        assert!(grid.add(spike(at(0, 0), 1.0)).is_ok());
        assert!(grid.add(healing_pad(at(0, 0), 1.0)).is_ok());
    }

    #[test]
    fn test_spike_footprint() {
        let spike = spike(at(2, 2), 3.0);
        assert!((spike.pose().w() - 0.75).abs() < 1e-9);
        assert!((spike.pose().h() - 0.35).abs() < 1e-9);
        assert_eq!(spike.pose().as_discrete_point(), DiscretePoint::new(2, 2));
    }

    #[test]
    fn test_player_on_spike_and_pad() {
        let mut grid = Grid::new(3, 3).unwrap();
        let hero = grid.add(player(at(0, 0))).unwrap();
        grid.add(spike(at(1, 0), 10.0)).unwrap();
        grid.add(healing_pad(at(2, 0), 4.0)).unwrap();

        assert!(grid.move_to_position(hero, at(1, 0)));
        grid.update(0.1);
        grid.update(0.1);
        let health = |grid: &Grid| grid.entity(hero).unwrap().health().unwrap().health();
        assert!((health(&grid) - 80.0).abs() < 1e-9);

        assert!(grid.move_to_position(hero, at(2, 0)));
        for _ in 0..10 {
            grid.update(0.1);
        }
        assert!((health(&grid) - PLAYER_HEALTH).abs() < 1e-9);
    }

    #[test]
    fn test_patrol_drone_starts_moving() {
        let mut grid = Grid::new(4, 4).unwrap();
        let route = [at(0, 0), at(1, 0), at(2, 0)];
        let id = grid.add(patrol_drone(at(0, 0), route, true)).unwrap();
        assert_eq!(
            grid.follow_state(id),
            Some(FollowState::FollowingWrappedPath)
        );
        grid.update(0.1);
        assert_eq!(
            grid.entity(id).unwrap().pose().as_discrete_point(),
            DiscretePoint::new(1, 0)
        );
    }
}
