//! Grid objects and the rules that decide who may share a cell.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use gridsim_navigation::Pose;

use crate::capability::{Damage, Health, Healing};
use crate::pathing::PathFollower;

/// Tile budget of a cell under the default [`Coexistence::Capacity`] rule.
pub const DEFAULT_TILE_CAPACITY: u32 = 5;

/// Tile size of an entity built without [`Entity::with_tile_size`]: a full cell.
pub const DEFAULT_TILE_SIZE: u32 = 5;

/// Handle of an entity stored on a [`crate::grid::Grid`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a grid instance, used as an entity's back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridId(u64);

static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(1);

impl GridId {
    pub(crate) fn next() -> Self {
        GridId(NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What an entity represents, for logging and for the visual layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Wall,
    Player,
    Drone,
    Spike,
    HealingPad,
    Custom(&'static str),
}

/// Custom rule: may `entity` join a cell already holding `others`?
pub type CoexistencePredicate = fn(entity: &Entity, others: &[&Entity]) -> bool;

/// The rule an entity applies when asked whether it can join a cell.
///
/// The rule belongs to the entity that wants to enter. An entity with
/// [`Coexistence::Always`] can step onto a wall even though the wall could
/// not step onto it.
#[derive(Clone, Copy)]
pub enum Coexistence {
    /// Own tile size plus the tile sizes of the occupants must not exceed `limit`.
    Capacity { limit: u32 },
    /// Fits anywhere.
    Always,
    /// Only into an empty cell.
    Exclusive,
    /// Caller-supplied rule.
    Predicate(CoexistencePredicate),
}

impl Default for Coexistence {
    fn default() -> Self {
        Coexistence::Capacity {
            limit: DEFAULT_TILE_CAPACITY,
        }
    }
}

impl fmt::Debug for Coexistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coexistence::Capacity { limit } => {
                f.debug_struct("Capacity").field("limit", limit).finish()
            }
            Coexistence::Always => write!(f, "Always"),
            Coexistence::Exclusive => write!(f, "Exclusive"),
            Coexistence::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl Coexistence {
    /// Evaluates the rule for `entity` against the current `others` of a cell.
    pub fn allows(&self, entity: &Entity, others: &[&Entity]) -> bool {
        match self {
            Coexistence::Capacity { limit } => {
                let occupied: u64 = others.iter().map(|other| u64::from(other.tile_size())).sum();
                u64::from(entity.tile_size()) + occupied <= u64::from(*limit)
            }
            Coexistence::Always => true,
            Coexistence::Exclusive => others.is_empty(),
            Coexistence::Predicate(rule) => rule(entity, others),
        }
    }
}

/// How an entity reacts to a collision notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionResponse {
    /// Count it and carry on.
    #[default]
    Ignore,
    /// Remove itself from the grid.
    Vanish,
}

/// A thing that lives in one grid cell.
///
/// Capabilities are optional components; an entity is "healthy" when it holds
/// a [`Health`], "harmful" when it holds a [`Damage`], and so on.
///
/// # Example
/// ```
/// use gridsim::entity::{Entity, EntityKind};
/// use gridsim::capability::Health;
/// use gridsim_navigation::Pose;
///
/// let player = Entity::new(EntityKind::Player, Pose::new(1.0, 1.0, 0.0))
///     .with_tile_size(2)
///     .with_health(Health::new(100.0))
///     .updating_every_frame();
/// assert_eq!(player.tile_size(), 2);
/// assert!(!player.is_on_grid());
/// ```
#[derive(Debug, Clone)]
pub struct Entity {
    kind: EntityKind,
    pose: Pose,
    tile_size: u32,
    update_every_frame: bool,
    coexistence: Coexistence,
    collision_response: CollisionResponse,
    health: Option<Health>,
    damage: Option<Damage>,
    healing: Option<Healing>,
    pub(crate) path_follower: Option<PathFollower>,
    grid: Option<GridId>,
    id: Option<EntityId>,
    collisions: u64,
}

impl Entity {
    /// A full-cell entity with the default capacity rule and no capabilities.
    pub fn new(kind: EntityKind, pose: Pose) -> Self {
        Entity {
            kind,
            pose,
            tile_size: DEFAULT_TILE_SIZE,
            update_every_frame: false,
            coexistence: Coexistence::default(),
            collision_response: CollisionResponse::default(),
            health: None,
            damage: None,
            healing: None,
            path_follower: None,
            grid: None,
            id: None,
            collisions: 0,
        }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_coexistence(mut self, coexistence: Coexistence) -> Self {
        self.coexistence = coexistence;
        self
    }

    pub fn with_collision_response(mut self, response: CollisionResponse) -> Self {
        self.collision_response = response;
        self
    }

    /// Registers the entity for [`crate::grid::Grid::update`] on every tick.
    pub fn updating_every_frame(mut self) -> Self {
        self.update_every_frame = true;
        self
    }

    pub fn with_health(mut self, health: Health) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_damage(mut self, damage: f64) -> Self {
        self.damage = Some(Damage(damage));
        self
    }

    pub fn with_healing(mut self, healing: f64) -> Self {
        self.healing = Some(Healing(healing));
        self
    }

    /// Gives the entity a path-following capability, idle until a path is set.
    pub fn with_path_follower(mut self) -> Self {
        self.path_follower.get_or_insert_with(PathFollower::new);
        self
    }

    /// Gives the entity a path-following capability that starts on `waypoints`.
    pub fn with_path(mut self, waypoints: impl IntoIterator<Item = Pose>, wrap: bool) -> Self {
        self.path_follower = Some(PathFollower::with_path(waypoints, wrap));
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Current pose. Only the grid moves an entity between cells.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub(crate) fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }

    /// Turns the entity in place; does not change its cell.
    pub fn set_theta(&mut self, theta: f64) {
        self.pose.set_theta(theta);
    }

    /// Resizes the entity's footprint; does not change its cell.
    pub fn set_footprint(&mut self, w: f64, h: f64) {
        self.pose.set_w(w);
        self.pose.set_h(h);
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn updates_every_frame(&self) -> bool {
        self.update_every_frame
    }

    pub(crate) fn set_update_every_frame(&mut self, enabled: bool) {
        self.update_every_frame = enabled;
    }

    pub fn coexistence(&self) -> Coexistence {
        self.coexistence
    }

    pub fn collision_response(&self) -> CollisionResponse {
        self.collision_response
    }

    /// Can this entity join a cell that holds `others`?
    pub fn can_coexist(&self, others: &[&Entity]) -> bool {
        self.coexistence.allows(self, others)
    }

    pub fn health(&self) -> Option<&Health> {
        self.health.as_ref()
    }

    pub fn health_mut(&mut self) -> Option<&mut Health> {
        self.health.as_mut()
    }

    pub fn damage(&self) -> Option<Damage> {
        self.damage
    }

    pub fn healing(&self) -> Option<Healing> {
        self.healing
    }

    pub fn path_follower(&self) -> Option<&PathFollower> {
        self.path_follower.as_ref()
    }

    /// The grid this entity is stored on, if any.
    pub fn grid(&self) -> Option<GridId> {
        self.grid
    }

    /// The id under which this entity is stored, if any.
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn is_on_grid(&self) -> bool {
        self.grid.is_some()
    }

    /// Collision notifications received so far.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub(crate) fn attach(&mut self, grid: GridId, id: EntityId) {
        self.grid = Some(grid);
        self.id = Some(id);
    }

    pub(crate) fn detach(&mut self) {
        self.grid = None;
        self.id = None;
    }

    /// Records a collision and reports how the entity wants to respond.
    pub(crate) fn on_collision(&mut self) -> CollisionResponse {
        self.collisions += 1;
        self.collision_response
    }

    /// Clears pose and health change flags.
    pub(crate) fn reset_updates(&mut self) {
        self.pose.reset_updates();
        if let Some(health) = self.health.as_mut() {
            health.reset_updated();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(tile_size: u32) -> Entity {
        Entity::new(EntityKind::Custom("test"), Pose::default()).with_tile_size(tile_size)
    }

    #[test]
    fn test_capacity_rule() {
        let mover = sized(2);
        let a = sized(2);
        let b = sized(1);
        let c = sized(2);
        assert!(mover.can_coexist(&[]));
        assert!(mover.can_coexist(&[&a]));
        assert!(mover.can_coexist(&[&a, &b]));
        assert!(!mover.can_coexist(&[&a, &c]));
    }

    #[test]
    fn test_full_tile_blocks_everything_sized() {
        let wall = sized(DEFAULT_TILE_SIZE);
        assert!(!sized(1).can_coexist(&[&wall]));
        assert!(sized(0).can_coexist(&[&wall]));
        assert!(!sized(DEFAULT_TILE_SIZE).can_coexist(&[&wall]));
    }

    #[test]
    fn test_rules_are_asymmetric() {
        let wall = sized(DEFAULT_TILE_SIZE);
        let spike = sized(0).with_coexistence(Coexistence::Always);
        let picky = sized(1).with_coexistence(Coexistence::Exclusive);
        assert!(spike.can_coexist(&[&wall]));
        assert!(!picky.can_coexist(&[&spike]));
        assert!(spike.can_coexist(&[&picky]));
    }

    #[test]
    fn test_predicate_rule() {
        fn only_with_walls(_: &Entity, others: &[&Entity]) -> bool {
            others.iter().all(|other| other.kind() == EntityKind::Wall)
        }
        let ghost = sized(1).with_coexistence(Coexistence::Predicate(only_with_walls));
        let wall = Entity::new(EntityKind::Wall, Pose::default());
        let player = Entity::new(EntityKind::Player, Pose::default());
        assert!(ghost.can_coexist(&[&wall]));
        assert!(!ghost.can_coexist(&[&wall, &player]));
        assert_eq!(format!("{:?}", ghost.coexistence()), "Predicate(..)");
    }

    #[test]
    fn test_builder_defaults() {
        let entity = Entity::new(EntityKind::Wall, Pose::new(2.0, 3.0, 0.0));
        assert_eq!(entity.tile_size(), DEFAULT_TILE_SIZE);
        assert!(!entity.updates_every_frame());
        assert!(entity.health().is_none());
        assert!(entity.path_follower().is_none());
        assert_eq!(entity.collision_response(), CollisionResponse::Ignore);
        assert_eq!(entity.grid(), None);
        assert_eq!(entity.id(), None);
    }

    #[test]
    fn test_on_collision_counts() {
        let mut entity = sized(1).with_collision_response(CollisionResponse::Vanish);
        assert_eq!(entity.on_collision(), CollisionResponse::Vanish);
        assert_eq!(entity.on_collision(), CollisionResponse::Vanish);
        assert_eq!(entity.collisions(), 2);
    }

    #[test]
    fn test_grid_ids_are_unique() {
        assert_ne!(GridId::next(), GridId::next());
    }
}
