use std::any::TypeId;

use super::{Component, Entity, World};

/// Capability query over the entity store.
///
/// A query is an intersection of has-X / has-not-X predicates. Results are
/// collected into a snapshot, so callers may freely attach or detach
/// components on *other* entities while walking the result.
///
/// ```ignore
/// let actors = world
///     .query()
///     .with::<TurnBased>()
///     .with::<GridElement>()
///     .without::<Dead>()
///     .entities();
/// ```
pub struct Query<'w> {
    world: &'w World,
    with: Vec<TypeId>,
    without: Vec<TypeId>,
}

impl<'w> Query<'w> {
    pub(super) fn new(world: &'w World) -> Self {
        Self {
            world,
            with: Vec::new(),
            without: Vec::new(),
        }
    }

    #[must_use]
    pub fn with<C: Component>(mut self) -> Self {
        self.with.push(TypeId::of::<C>());
        self
    }

    #[must_use]
    pub fn without<C: Component>(mut self) -> Self {
        self.without.push(TypeId::of::<C>());
        self
    }

    fn matches(&self, entity: Entity) -> bool {
        self.with
            .iter()
            .all(|type_id| self.world.has_type(*type_id, entity))
            && !self
                .without
                .iter()
                .any(|type_id| self.world.has_type(*type_id, entity))
    }

    /// Matching entities in insertion order.
    pub fn entities(&self) -> Vec<Entity> {
        self.world
            .entities()
            .filter(|entity| self.matches(*entity))
            .collect()
    }

    pub fn first(&self) -> Option<Entity> {
        self.world.entities().find(|entity| self.matches(*entity))
    }

    pub fn count(&self) -> usize {
        self.world
            .entities()
            .filter(|entity| self.matches(*entity))
            .count()
    }
}
