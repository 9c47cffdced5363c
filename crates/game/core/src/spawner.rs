//! Materialises a [`MetaPlan`] into entities.
//!
//! Every tile becomes an entity with [`TileRender`] and [`GridElement`];
//! tiles that block movement or sight also carry [`BlockPass`] /
//! [`BlockView`]. NPC, item and prop specs are resolved against the raw
//! master; an unknown name is an integrity error. The plan is consumed.

use crate::components::{
    ActivationRange, ActivationWay, Ai, AiBehavior, Attributes, BlockPass, BlockView, Door, DoorOrientation,
    EquipmentChanged, GridElement, Hunger, Interactable, InteractionPayload, InventoryChanged, Item, ItemLocation,
    LightSource, Name, Player, Prop, Rgba, SpriteRender, Stackable, TileRender, TurnBased, WarpTarget, Wearable,
};
use crate::ecs::{Entity, World};
use crate::error::{ErrorSeverity, GameError};
use crate::level::{Direction, Position, TileIdx};
use crate::mapplan::{ExitKind, MetaPlan};
use crate::raw::{RawAttributes, RawLight, RawMaster, RawMember};
use crate::rng::GameRng;
use crate::sim::TileGrid;
use crate::systems::inventory;
use crate::systems::stats::{ap_max, initial_pools};

/// Raw member used for the player when present.
pub const PLAYER_MEMBER: &str = "player";
/// Light carried by a player whose raw record defines none.
pub const PLAYER_LIGHT_RADIUS: i32 = 6;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("unknown member '{0}'")]
    UnknownMember(String),

    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("unknown prop '{0}'")]
    UnknownProp(String),
}

impl GameError for SpawnError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Integrity
    }

    fn error_code(&self) -> &'static str {
        match self {
            SpawnError::UnknownMember(_) => "SPAWN_UNKNOWN_MEMBER",
            SpawnError::UnknownItem(_) => "SPAWN_UNKNOWN_ITEM",
            SpawnError::UnknownProp(_) => "SPAWN_UNKNOWN_PROP",
        }
    }
}

/// Entities created for one floor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FloorSpawn {
    pub tiles: usize,
    pub npcs: Vec<Entity>,
    pub items: Vec<Entity>,
    pub props: Vec<Entity>,
    pub exits: Vec<Entity>,
    pub player_spawn: Option<Position>,
}

/// Which way a door at `position` faces, judged by blocking neighbours.
pub fn door_orientation(grid: &TileGrid, position: Position) -> DoorOrientation {
    let blocked = |d: Direction| grid.tile_at(position.step(d)).block_pass;
    if blocked(Direction::Up) && blocked(Direction::Down) && !(blocked(Direction::Left) && blocked(Direction::Right)) {
        DoorOrientation::Vertical
    } else {
        DoorOrientation::Horizontal
    }
}

fn attributes_of(raw: &RawAttributes) -> Attributes {
    Attributes::new(
        raw.vitality,
        raw.strength,
        raw.sensation,
        raw.dexterity,
        raw.agility,
        raw.defense,
    )
}

fn light_of(raw: &RawLight) -> LightSource {
    LightSource::new(raw.radius, raw.color)
}

/// Inserts the components shared by every character.
fn insert_character(world: &mut World, entity: Entity, member: &RawMember, position: Position) {
    let attributes = attributes_of(&member.attributes);
    world.insert(entity, Name::new(member.name.clone()));
    world.insert(entity, GridElement::from(position));
    world.insert(entity, TurnBased::new(ap_max(&attributes, 0)));
    world.insert(entity, initial_pools(&attributes));
    world.insert(entity, attributes);
    world.insert(entity, EquipmentChanged);
    if let Some(sprite) = &member.sprite {
        world.insert(entity, SpriteRender::new(sprite.sheet.clone(), sprite.key.clone()));
    }
    if let Some(light) = &member.light {
        world.insert(entity, light_of(light));
    }
}

/// Creates the player at `position`.
///
/// Uses the `player` raw member when one exists, otherwise a plain
/// all-fives attribute block.
pub fn spawn_player(world: &mut World, raw: &RawMaster, position: Position) -> Entity {
    let member = raw.member(PLAYER_MEMBER).cloned().unwrap_or_else(|| RawMember {
        name: "You".to_string(),
        attributes: RawAttributes {
            vitality: 5,
            strength: 5,
            sensation: 5,
            dexterity: 5,
            agility: 5,
            defense: 0,
        },
        ai: None,
        sprite: None,
        drop_table: None,
        light: None,
    });

    let player = world.spawn();
    insert_character(world, player, &member, position);
    world.insert(player, Player);
    world.insert(player, Hunger::full());
    world.insert(player, InventoryChanged);
    if !world.has::<LightSource>(player) {
        world.insert(player, LightSource::new(PLAYER_LIGHT_RADIUS, Rgba::new(255, 220, 170, 255)));
    }
    tracing::debug!(%player, x = position.x, y = position.y, "player spawned");
    player
}

/// Creates an item entity from its raw record, on the field at `position`
/// or in `owner`'s backpack.
pub fn spawn_item(
    world: &mut World,
    raw: &RawMaster,
    name: &str,
    position: Option<Position>,
    owner: Option<Entity>,
) -> Result<Entity, SpawnError> {
    let record = raw.item(name).ok_or_else(|| SpawnError::UnknownItem(name.to_string()))?;
    let item = world.spawn();
    world.insert(item, Name::new(record.name.clone()));
    world.insert(item, Item::new(record.weight, record.value));
    if record.stackable {
        world.insert(item, Stackable);
    }
    if let Some(wearable) = record.wearable {
        world.insert(
            item,
            Wearable {
                slot: wearable.slot,
                defense: wearable.defense,
                bonus: wearable.bonus,
            },
        );
    }
    if let Some(sprite) = &record.sprite {
        world.insert(item, SpriteRender::new(sprite.sheet.clone(), sprite.key.clone()));
    }
    if let Some(light) = &record.light {
        world.insert(item, light_of(light));
    }

    match (owner, position) {
        (Some(owner), _) => {
            world.insert(item, ItemLocation::InBackpack { owner });
            world.insert(owner, InventoryChanged);
        }
        (None, Some(position)) => inventory::place_on_field(world, item, position),
        (None, None) => {
            world.insert(item, ItemLocation::OnField);
        }
    }
    Ok(item)
}

fn spawn_npc(
    world: &mut World,
    raw: &RawMaster,
    rng: &mut GameRng,
    name: &str,
    position: Position,
) -> Result<Entity, SpawnError> {
    let member = raw.member(name).ok_or_else(|| SpawnError::UnknownMember(name.to_string()))?;
    let npc = world.spawn();
    insert_character(world, npc, member, position);
    world.insert(
        npc,
        Ai {
            behavior: member.ai.unwrap_or(AiBehavior::Hostile),
        },
    );

    let drop = member
        .drop_table
        .as_deref()
        .and_then(|table| raw.drop_table(table))
        .and_then(|table| table.choose(rng))
        .map(str::to_string);
    if let Some(drop) = drop {
        spawn_item(world, raw, &drop, None, Some(npc))?;
    }
    Ok(npc)
}

fn spawn_prop(
    world: &mut World,
    raw: &RawMaster,
    grid: &TileGrid,
    name: &str,
    position: Position,
) -> Result<Entity, SpawnError> {
    let record = raw.prop(name).ok_or_else(|| SpawnError::UnknownProp(name.to_string()))?;
    let prop = world.spawn();
    world.insert(prop, Name::new(record.name.clone()));
    world.insert(prop, Prop { name: record.name.clone() });
    world.insert(prop, GridElement::from(position));
    if let Some(light) = &record.light {
        world.insert(prop, light_of(light));
    }

    if record.door {
        let door = Door {
            is_open: false,
            orientation: door_orientation(grid, position),
        };
        world.insert(prop, BlockPass);
        world.insert(prop, BlockView);
        if let Some(sprite) = &record.sprite {
            world.insert(prop, SpriteRender::new(sprite.sheet.clone(), door.sprite_key()));
        }
        world.insert(prop, door);
        world.insert(
            prop,
            Interactable::new(
                ActivationRange::Adjacent,
                ActivationWay::OnCollision,
                InteractionPayload::Door,
            ),
        );
        return Ok(prop);
    }

    if record.block_pass {
        world.insert(prop, BlockPass);
    }
    if record.block_view {
        world.insert(prop, BlockView);
    }
    if let Some(sprite) = &record.sprite {
        world.insert(prop, SpriteRender::new(sprite.sheet.clone(), sprite.key.clone()));
    }
    if let Some(interaction) = &record.interaction {
        let payload = InteractionPayload::Message(
            interaction
                .message
                .clone()
                .unwrap_or_else(|| format!("You see a {}.", record.name)),
        );
        world.insert(prop, Interactable::new(interaction.range, interaction.way, payload));
    }
    Ok(prop)
}

fn spawn_exit(world: &mut World, position: Position, kind: ExitKind) -> Entity {
    let target = match kind {
        ExitKind::Descend => WarpTarget::Next,
    };
    let exit = world.spawn();
    world.insert(exit, Name::new("stairs"));
    world.insert(exit, GridElement::from(position));
    world.insert(
        exit,
        Interactable::new(
            ActivationRange::SameTile,
            ActivationWay::Auto,
            InteractionPayload::Warp(target),
        ),
    );
    exit
}

/// Creates every entity of `plan` and returns the floor's tile grid.
pub fn spawn_floor(world: &mut World, plan: MetaPlan) -> Result<(TileGrid, FloorSpawn), SpawnError> {
    let MetaPlan {
        level,
        tiles,
        mut rng,
        npc_specs,
        item_specs,
        prop_specs,
        exits,
        spawn_points,
        raw,
        ..
    } = plan;
    let grid = TileGrid::new(level, tiles);
    let mut report = FloorSpawn {
        player_spawn: spawn_points.first().copied(),
        ..FloorSpawn::default()
    };

    for (i, tile) in grid.tiles.iter().enumerate() {
        let position = level.coord(TileIdx(i));
        let entity = world.spawn();
        world.insert(entity, GridElement::from(position));
        world.insert(
            entity,
            TileRender {
                kind: tile.kind,
                sprite_index: tile.sprite_index,
            },
        );
        if tile.block_pass {
            world.insert(entity, BlockPass);
        }
        if tile.block_view {
            world.insert(entity, BlockView);
        }
        report.tiles += 1;
    }

    for spec in &prop_specs {
        report.props.push(spawn_prop(world, &raw, &grid, &spec.name, spec.position)?);
    }
    for spec in &item_specs {
        report.items.push(spawn_item(world, &raw, &spec.name, Some(spec.position), None)?);
    }
    for spec in &npc_specs {
        report.npcs.push(spawn_npc(world, &raw, &mut rng, &spec.name, spec.position)?);
    }
    for exit in &exits {
        report.exits.push(spawn_exit(world, exit.position, exit.kind));
    }

    tracing::debug!(
        tiles = report.tiles,
        npcs = report.npcs.len(),
        items = report.items.len(),
        props = report.props.len(),
        "floor spawned"
    );
    Ok((grid, report))
}
