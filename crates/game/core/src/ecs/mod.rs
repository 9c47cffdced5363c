//! Sparse entity store.
//!
//! Every component type gets its own storage object, created lazily the first
//! time a value of that type is attached. Storages are kept in a type-map keyed
//! by [`TypeId`], so capability is expressed purely by membership: an entity
//! "is" an actor because it has both `TurnBased` and `GridElement`, nothing more.
//!
//! Entities are allocated monotonically and never reused inside one [`World`],
//! which makes ascending-id order identical to insertion order. Queries return
//! snapshots in that order (see [`query`]).

mod query;

pub use query::Query;

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Opaque, stable identifier of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity(pub u32);

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Marker for types that can be attached to entities.
///
/// Implemented through [`impl_component!`](crate::impl_component) for every
/// component declared in [`crate::components`].
pub trait Component: 'static {}

/// Implements [`Component`] for a list of types.
#[macro_export]
macro_rules! impl_component {
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::ecs::Component for $ty {})+
    };
}

/// Type-erased view over a single component storage.
trait AnyStorage {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains(&self, entity: Entity) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Storage<C> {
    items: BTreeMap<Entity, C>,
}

impl<C> Default for Storage<C> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<C: Component> AnyStorage for Storage<C> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.items.remove(&entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.items.contains_key(&entity)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owner of every entity and component in the simulation.
#[derive(Default)]
pub struct World {
    next_id: u32,
    alive: BTreeSet<Entity>,
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.alive.len())
            .field("storages", &self.storages.len())
            .finish()
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new entity with no components.
    pub fn spawn(&mut self) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id += 1;
        self.alive.insert(entity);
        entity
    }

    /// Deletes an entity together with all of its components.
    ///
    /// Returns `false` when the entity was already gone.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.alive.remove(&entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Live entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().copied()
    }

    /// Attaches a component, overwriting any previous value of the same type.
    ///
    /// Returns the replaced value. Attaching to a despawned entity is ignored.
    pub fn insert<C: Component>(&mut self, entity: Entity, component: C) -> Option<C> {
        if !self.is_alive(entity) {
            tracing::warn!(%entity, component = std::any::type_name::<C>(), "insert on despawned entity ignored");
            return None;
        }
        self.storage_mut::<C>().items.insert(entity, component)
    }

    /// Detaches a component. Detaching an absent component is a no-op.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        self.storages
            .get_mut(&TypeId::of::<C>())?
            .as_any_mut()
            .downcast_mut::<Storage<C>>()?
            .items
            .remove(&entity)
    }

    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.storage::<C>()?.items.get(&entity)
    }

    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.storages
            .get_mut(&TypeId::of::<C>())?
            .as_any_mut()
            .downcast_mut::<Storage<C>>()?
            .items
            .get_mut(&entity)
    }

    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.has_type(TypeId::of::<C>(), entity)
    }

    /// Number of components currently attached to `entity`.
    pub fn component_count(&self, entity: Entity) -> usize {
        self.storages
            .values()
            .filter(|storage| storage.contains(entity))
            .count()
    }

    /// Iterates `(entity, component)` pairs for one component type in id order.
    pub fn iter<C: Component>(&self) -> impl Iterator<Item = (Entity, &C)> + '_ {
        self.storage::<C>()
            .into_iter()
            .flat_map(|storage| storage.items.iter().map(|(entity, c)| (*entity, c)))
    }

    /// Starts a capability query. See [`Query`].
    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }

    pub(crate) fn has_type(&self, type_id: TypeId, entity: Entity) -> bool {
        self.storages
            .get(&type_id)
            .is_some_and(|storage| storage.contains(entity))
    }

    fn storage<C: Component>(&self) -> Option<&Storage<C>> {
        self.storages
            .get(&TypeId::of::<C>())?
            .as_any()
            .downcast_ref::<Storage<C>>()
    }

    fn storage_mut<C: Component>(&mut self) -> &mut Storage<C> {
        self.storages
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(Storage::<C>::default()))
            .as_any_mut()
            .downcast_mut::<Storage<C>>()
            .expect("storage registered under a foreign TypeId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    struct Marker;

    impl_component!(Health, Marker);

    #[test]
    fn attach_overwrites_and_detach_absent_is_noop() {
        let mut world = World::new();
        let e = world.spawn();

        assert!(world.insert(e, Health(3)).is_none());
        assert_eq!(world.insert(e, Health(5)), Some(Health(3)));
        assert_eq!(world.get::<Health>(e), Some(&Health(5)));

        assert!(world.remove::<Marker>(e).is_none());
        assert!(world.get::<Marker>(e).is_none());
    }

    #[test]
    fn attach_then_detach_restores_component_set() {
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, Health(1));
        let before = world.component_count(e);

        world.insert(e, Marker);
        world.remove::<Marker>(e);

        assert_eq!(world.component_count(e), before);
        assert!(world.has::<Health>(e));
        assert!(!world.has::<Marker>(e));
    }

    #[test]
    fn despawn_cascades_every_component() {
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, Health(1));
        world.insert(e, Marker);

        assert!(world.despawn(e));
        assert!(!world.is_alive(e));
        assert!(world.get::<Health>(e).is_none());
        assert!(!world.has::<Marker>(e));
        assert!(!world.despawn(e));
    }

    #[test]
    fn insert_on_despawned_entity_is_ignored() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e);

        world.insert(e, Health(1));
        assert!(world.get::<Health>(e).is_none());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut world = World::new();
        let a = world.spawn();
        world.despawn(a);
        let b = world.spawn();
        assert_ne!(a, b);
    }
}
