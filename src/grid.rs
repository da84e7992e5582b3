//! Occupancy grid: who stands where, and whether a move is allowed.
//!
//! Every cell keeps an insertion-ordered list of occupant ids. An entity is on
//! the grid exactly when it is in [`Grid::elements`], and then it appears in
//! the occupant list of precisely the cell its pose rounds to. Every move,
//! including the initial placement done by [`Grid::add`], goes through the
//! same protocol:
//!
//! 1. The target cell must be inside the grid.
//! 2. Each current occupant of the target cell collides with the mover, and
//!    the mover collides with each occupant. This happens even when the move
//!    is later rejected.
//! 3. The mover's [`Coexistence`](crate::entity::Coexistence) rule must accept
//!    the occupants that are left.
//! 4. The mover leaves its old cell, takes the target pose, and is appended to
//!    the target cell.

use std::collections::HashMap;

use gridsim_navigation::{DiscretePoint, PassabilityMap, Pose};
use tracing::{debug, debug_span, info, trace, warn};

use crate::capability::OverlapEffect;
use crate::entity::{CollisionResponse, Entity, EntityId, GridId};
use crate::error::GridError;
use crate::pathing::PathFollower;

/// Fixed-size occupancy grid owning its entities.
#[derive(Debug)]
pub struct Grid {
    id: GridId,
    width: usize,
    height: usize,
    /// Occupant ids per cell, `x * height + y`.
    cells: Vec<Vec<EntityId>>,
    entities: HashMap<EntityId, Entity>,
    /// Every entity on the grid, in insertion order.
    elements: Vec<EntityId>,
    always_update: Vec<EntityId>,
    update_once: Vec<EntityId>,
    next_entity: u64,
}

impl Grid {
    /// Creates an empty grid.
    ///
    /// # Returns
    /// * `Result<Self, GridError>` - The grid, or `InvalidDimensions` if either size is zero
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        let total_cells = width
            .checked_mul(height)
            .filter(|&cells| cells > 0)
            .ok_or(GridError::InvalidDimensions { width, height })?;

        Ok(Grid {
            id: GridId::next(),
            width,
            height,
            cells: vec![Vec::new(); total_cells],
            entities: HashMap::new(),
            elements: Vec::new(),
            always_update: Vec::new(),
            update_once: Vec::new(),
            next_entity: 0,
        })
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of entities on the grid.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All entities on the grid, in insertion order.
    pub fn elements(&self) -> &[EntityId] {
        &self.elements
    }

    /// Entities on the grid with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.elements
            .iter()
            .filter_map(|id| self.entities.get(id).map(|entity| (*id, entity)))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.elements.contains(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access for capability state. Positions only change through
    /// [`Grid::move_to_position`].
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn in_bounds(&self, point: &DiscretePoint) -> bool {
        self.cell_index(point).is_some()
    }

    fn cell_index(&self, point: &DiscretePoint) -> Option<usize> {
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        (x < self.width && y < self.height).then(|| x * self.height + y)
    }

    fn cell_point(&self, index: usize) -> DiscretePoint {
        // Both coordinates are bounded by the grid size, which fits in a cell index.
        DiscretePoint::new((index / self.height) as i32, (index % self.height) as i32)
    }

    /// Occupant ids of a cell, in the order they entered.
    pub fn get(&self, point: &DiscretePoint) -> Result<&[EntityId], GridError> {
        self.cell_index(point)
            .map(|index| self.cells[index].as_slice())
            .ok_or(GridError::OutOfBounds {
                point: *point,
                width: self.width,
                height: self.height,
            })
    }

    /// Occupants of a cell, in the order they entered.
    pub fn occupants(&self, point: &DiscretePoint) -> Result<Vec<&Entity>, GridError> {
        Ok(self
            .get(point)?
            .iter()
            .filter_map(|id| self.entities.get(id))
            .collect())
    }

    /// Places `entity` on the grid at its own pose.
    ///
    /// The placement runs the full move protocol, so collisions are delivered
    /// even when it fails. On failure the entity is dropped and
    /// [`GridError::AddFailed`] is returned.
    pub fn add(&mut self, mut entity: Entity) -> Result<EntityId, GridError> {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;

        let target = *entity.pose();
        let kind = entity.kind();
        let update_every_frame = entity.updates_every_frame();
        entity.attach(self.id, id);
        self.entities.insert(id, entity);

        if !self.move_to_position(id, target) {
            self.detach(id);
            warn!(?kind, point = %target.as_discrete_point(), "Placement rejected");
            return Err(GridError::AddFailed {
                kind,
                point: target.as_discrete_point(),
            });
        }

        self.elements.push(id);
        if update_every_frame {
            self.always_update.push(id);
        }
        debug!(%id, ?kind, point = %target.as_discrete_point(), "Entity added");
        Ok(id)
    }

    /// Removes an entity from the grid. Returns `false` if it was not on it.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.take(id).is_some()
    }

    /// Removes an entity from the grid and hands it back, detached.
    pub fn take(&mut self, id: EntityId) -> Option<Entity> {
        if !self.contains(id) {
            return None;
        }
        let entity = self.detach(id);
        debug!(%id, "Entity removed");
        entity
    }

    /// Drops every trace of `id`. Also used on entities that were only
    /// tentatively stored during [`Grid::add`].
    fn detach(&mut self, id: EntityId) -> Option<Entity> {
        let mut entity = self.entities.remove(&id)?;
        if let Some(index) = self.cell_index(&entity.pose().as_discrete_point()) {
            self.cells[index].retain(|&occupant| occupant != id);
        }
        self.elements.retain(|&element| element != id);
        self.always_update.retain(|&element| element != id);
        self.update_once.retain(|&element| element != id);
        entity.detach();
        Some(entity)
    }

    /// Tries to move an entity to `target`. Returns whether the move happened;
    /// a rejected move leaves the entity where it was.
    pub fn move_to_position(&mut self, id: EntityId, target: Pose) -> bool {
        let point = target.as_discrete_point();
        let Some(index) = self.cell_index(&point) else {
            trace!(%id, %point, "Move rejected: out of bounds");
            return false;
        };
        if !self.entities.contains_key(&id) {
            return false;
        }

        let others: Vec<EntityId> = self.cells[index]
            .iter()
            .copied()
            .filter(|&other| other != id)
            .collect();
        for other in others {
            // An earlier response may already have removed either party.
            if !self.entities.contains_key(&other) || !self.entities.contains_key(&id) {
                continue;
            }
            self.notify_collision(other, id);
            self.notify_collision(id, other);
        }

        let Some(entity) = self.entities.get(&id) else {
            trace!(%id, %point, "Move abandoned: mover vanished");
            return false;
        };
        let occupants: Vec<&Entity> = self.cells[index]
            .iter()
            .filter(|&&other| other != id)
            .filter_map(|other| self.entities.get(other))
            .collect();
        if !entity.can_coexist(&occupants) {
            trace!(%id, %point, "Move rejected: cannot coexist");
            return false;
        }

        let previous = entity.pose().as_discrete_point();
        if let Some(previous) = self.cell_index(&previous) {
            self.cells[previous].retain(|&occupant| occupant != id);
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.pose_mut().set_to(&target);
        }
        self.cells[index].push(id);
        true
    }

    /// Tells `entity` it collided with `other` and applies its response.
    fn notify_collision(&mut self, entity: EntityId, other: EntityId) {
        let Some(receiver) = self.entities.get_mut(&entity) else {
            return;
        };
        trace!(%entity, %other, "Collision");
        if receiver.on_collision() == CollisionResponse::Vanish {
            debug!(%entity, %other, "Entity vanished on collision");
            self.detach(entity);
        }
    }

    /// Passability from the point of view of entity `id`: a cell is passable
    /// when `id` could coexist with its current occupants (ignoring itself).
    pub fn get_collision_matrix(&self, id: EntityId) -> Result<PassabilityMap, GridError> {
        let entity = self.entities.get(&id).ok_or(GridError::UnknownEntity(id))?;
        self.collision_matrix_for(entity, Some(id))
    }

    /// Passability for an arbitrary entity, which need not be on the grid.
    pub fn collision_matrix_for(
        &self,
        entity: &Entity,
        exclude: Option<EntityId>,
    ) -> Result<PassabilityMap, GridError> {
        let mut map = PassabilityMap::new(self.width, self.height)?;
        for (index, cell) in self.cells.iter().enumerate() {
            let occupants: Vec<&Entity> = cell
                .iter()
                .filter(|&&other| Some(other) != exclude)
                .filter_map(|other| self.entities.get(other))
                .collect();
            if !entity.can_coexist(&occupants) {
                map.set(&self.cell_point(index), false)?;
            }
        }
        Ok(map)
    }

    /// Adds or removes `id` from the per-tick update list.
    pub fn set_update_every_frame(&mut self, id: EntityId, enabled: bool) -> Result<(), GridError> {
        let entity = self.entities.get_mut(&id).ok_or(GridError::UnknownEntity(id))?;
        entity.set_update_every_frame(enabled);
        self.always_update.retain(|&element| element != id);
        if enabled {
            self.always_update.push(id);
        }
        Ok(())
    }

    /// Schedules `id` for the next [`Grid::update`] only.
    pub fn request_update(&mut self, id: EntityId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if !self.update_once.contains(&id) {
            self.update_once.push(id);
        }
        true
    }

    /// Advances the simulation by one tick.
    ///
    /// Entities registered for every frame and those requested since the last
    /// tick get their path following stepped, each once. Then every cell's
    /// occupants apply their overlap effects to each other.
    pub fn update(&mut self, dt: f64) {
        let _span = debug_span!("update", dt).entered();

        let mut batch = self.always_update.clone();
        for id in std::mem::take(&mut self.update_once) {
            if !batch.contains(&id) {
                batch.push(id);
            }
        }
        for id in batch {
            self.update_entity(id);
        }

        self.resolve_overlaps();
    }

    fn update_entity(&mut self, id: EntityId) {
        let Some(mut follower) = self
            .entities
            .get_mut(&id)
            .and_then(|entity| entity.path_follower.take())
        else {
            return;
        };
        follower.tick(self, id);
        self.restore_follower(id, follower);
    }

    /// Puts a follower taken out for stepping back, unless its entity left.
    pub(crate) fn restore_follower(&mut self, id: EntityId, follower: PathFollower) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.path_follower = Some(follower);
        }
    }

    /// Applies damage then healing from every occupant to every occupant of
    /// the same cell that has health, the actor included.
    fn resolve_overlaps(&mut self) {
        for index in 0..self.cells.len() {
            if self.cells[index].is_empty() {
                continue;
            }
            let occupants = self.cells[index].clone();
            for actor in &occupants {
                let Some(entity) = self.entities.get(actor) else {
                    continue;
                };
                let (damage, healing) = (entity.damage(), entity.healing());
                let effects = [
                    damage.as_ref().map(|effect| effect as &dyn OverlapEffect),
                    healing.as_ref().map(|effect| effect as &dyn OverlapEffect),
                ];
                for effect in effects.into_iter().flatten() {
                    for target in &occupants {
                        let Some(health) = self
                            .entities
                            .get_mut(target)
                            .and_then(Entity::health_mut)
                        else {
                            continue;
                        };
                        let was_alive = health.is_alive();
                        effect.apply(health);
                        if was_alive && health.is_dead() {
                            info!(entity = %target, by = %actor, "Entity health depleted");
                        }
                    }
                }
            }
        }
    }

    /// Entities whose pose changed since the last [`Grid::reset_updates`].
    pub fn updated_poses(&self) -> impl Iterator<Item = (EntityId, &Pose)> {
        self.iter()
            .map(|(id, entity)| (id, entity.pose()))
            .filter(|(_, pose)| pose.any_updated())
    }

    /// Clears every entity's pose and health change flags.
    pub fn reset_updates(&mut self) {
        for entity in self.entities.values_mut() {
            entity.reset_updates();
        }
    }

    /// Verifies that element list and cell lists describe the same placement.
    pub fn check_invariants(&self) -> Result<(), GridError> {
        let violation = |message: String| Err(GridError::InvariantViolation(message));

        for &id in &self.elements {
            let Some(entity) = self.entities.get(&id) else {
                return violation(format!("{} listed but not stored", id));
            };
            let point = entity.pose().as_discrete_point();
            let Some(index) = self.cell_index(&point) else {
                return violation(format!("{} stands outside the grid at {}", id, point));
            };
            let count = self.cells[index].iter().filter(|&&other| other == id).count();
            if count != 1 {
                return violation(format!("{} appears {} times in cell {}", id, count, point));
            }
            if entity.grid() != Some(self.id) || entity.id() != Some(id) {
                return violation(format!("{} has a stale grid handle", id));
            }
        }

        let placed: usize = self.cells.iter().map(Vec::len).sum();
        if placed != self.elements.len() || self.entities.len() != self.elements.len() {
            return violation(format!(
                "{} placements and {} stored entities for {} elements",
                placed,
                self.entities.len(),
                self.elements.len()
            ));
        }
        Ok(())
    }
}
