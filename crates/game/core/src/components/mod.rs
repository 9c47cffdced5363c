//! Component definitions.
//!
//! Components are plain data. Capability is expressed by which components an
//! entity carries: an *actor* is anything with [`TurnBased`] and
//! [`GridElement`], a *character* is an actor that is the [`Player`] or has an
//! [`Ai`], a wall is an entity with [`BlockPass`] and [`BlockView`].

mod actor;
mod item;
mod object;
mod pool;

pub use actor::{
    Ai, AiBehavior, Dead, EquipmentChanged, Hunger, InventoryChanged, Name, Player, Pools,
    TurnBased,
};
pub use item::{EquipBonus, EquipSlot, Item, ItemLocation, Stackable, Wearable};
pub use object::{
    ActivationRange, ActivationWay, BlockPass, BlockView, Door, DoorOrientation, GridElement,
    Interactable, InteractionConfig, InteractionPayload, LightSource, Prop, Rgba, SpriteRender,
    TileRender, WarpTarget,
};
pub use pool::{Attribute, Attributes, Pool, PoolValue};

use crate::ecs::{Entity, World};
use crate::impl_component;

impl_component!(
    Name,
    Player,
    Ai,
    Dead,
    TurnBased,
    Attributes,
    Pools,
    Hunger,
    EquipmentChanged,
    InventoryChanged,
    Item,
    Stackable,
    ItemLocation,
    Wearable,
    GridElement,
    BlockPass,
    BlockView,
    Door,
    SpriteRender,
    TileRender,
    LightSource,
    Interactable,
    Prop,
);

/// Player or AI-driven actor.
pub fn is_character(world: &World, entity: Entity) -> bool {
    world.has::<Player>(entity) || world.has::<Ai>(entity)
}

/// Display name, falling back to the entity id.
pub fn display_name(world: &World, entity: Entity) -> String {
    world
        .get::<Name>(entity)
        .map(|name| name.0.clone())
        .unwrap_or_else(|| entity.to_string())
}

/// First live entity carrying [`Player`] and [`GridElement`].
pub fn player_entity(world: &World) -> Option<Entity> {
    world.query().with::<Player>().with::<GridElement>().first()
}
